//! Splits loosely structured plan text into titled sections.
//!
//! Each line is classified on its own ([`classify`]), then one pass folds the
//! classified lines into sections ([`parse_content`]).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const GENERAL_TITLE: &str = "General";
pub const FALLBACK_TITLE: &str = "Plan Details";

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Day [0-9]+|Meal:|Breakfast:|Lunch:|Dinner:|Snacks:)").expect("static header pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub items: Vec<String>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), items: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Header(String),
    Bullet(&'a str),
    Plain(&'a str),
    Blank,
}

pub fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if line.len() >= 2 && line.starts_with("**") && line.ends_with("**") {
        return Line::Header(line.replace("**", ""));
    }
    if HEADER.is_match(line) {
        return Line::Header(line.strip_suffix(':').unwrap_or(line).to_string());
    }
    if let Some(rest) = line.strip_prefix('-').or_else(|| line.strip_prefix('*')) {
        return Line::Bullet(rest.trim());
    }
    Line::Plain(line)
}

pub fn parse_content(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines().map(classify) {
        match line {
            Line::Blank => {}
            Line::Header(title) => {
                sections.extend(current.replace(Section::new(title)));
            }
            Line::Bullet(text) => {
                current
                    .get_or_insert_with(|| Section::new(GENERAL_TITLE))
                    .items
                    .push(text.to_string());
            }
            // Plain text never opens a section on its own.
            Line::Plain(text) => {
                if let Some(s) = current.as_mut() {
                    s.items.push(text.to_string());
                }
            }
        }
    }
    sections.extend(current);

    if sections.is_empty() {
        let items: Vec<String> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        if !items.is_empty() {
            sections.push(Section { title: FALLBACK_TITLE.to_string(), items });
        }
    }
    sections
}

/// Name shown on the visualize button: everything before the first `:` or
/// `(`, so "Oatmeal (1 cup): slow carbs" becomes "Oatmeal".
pub fn main_item(item: &str) -> &str {
    item.split([':', '(']).next().unwrap_or(item).trim()
}

/// What the visualize flow receives: a display title and the text sent to
/// the image model, written as `title|image prompt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub title: String,
    pub image_prompt: String,
}

impl Selection {
    pub fn new(title: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        Self { title: title.into(), image_prompt: image_prompt.into() }
    }

    /// Without a `|` (or with nothing after it) the title doubles as prompt.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(2, '|');
        let title = parts.next().unwrap_or_default().trim().to_string();
        let image_prompt = match parts.next().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => title.clone(),
        };
        Self { title, image_prompt }
    }

    pub fn encode(&self) -> String {
        format!("{}|{}", self.title, self.image_prompt)
    }
}
