use std::collections::BTreeMap;

use thiserror::Error;

/// Per-field validation messages, keyed by the camelCase field name.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("invalid profile: {}", summarize(.0))] Validation(FieldErrors),
    #[error("no item text provided")] EmptyItemText,
    #[error("generation failed: {0}")] Generation(String),
    #[error("provider error: {0}")] Provider(String),
    #[error("schema error: {0}")] Schema(String),
    #[error("no plan in session")] MissingSession,
    #[error("store error: {0}")] Store(String),
    #[error("malformed request body: {0}")] MalformedBody(String),
}

fn summarize(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoachError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CoachError::Validation(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_fields() {
        let mut f = FieldErrors::new();
        f.insert("age".into(), "You must be at least 12 years old.".into());
        f.insert("name".into(), "Name must be at least 2 characters.".into());
        let e = CoachError::Validation(f);
        assert_eq!(
            e.to_string(),
            "invalid profile: age: You must be at least 12 years old.; name: Name must be at least 2 characters."
        );
        assert_eq!(e.field_errors().map(|f| f.len()), Some(2));
        assert!(CoachError::MissingSession.field_errors().is_none());
    }
}
