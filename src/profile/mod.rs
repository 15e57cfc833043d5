//! User profile schema and validation.
//!
//! A [`ProfileInput`] is whatever the user submitted: every field optional,
//! numbers possibly still strings. [`validate`] turns it into a
//! [`UserProfile`] or reports one message per failing field. Nothing reaches
//! the model without passing through here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CoachError, FieldErrors};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_AGE: f64 = 12.0;
pub const MAX_AGE: f64 = 100.0;
pub const MIN_HEIGHT_CM: f64 = 50.0;
pub const MIN_WEIGHT_KG: f64 = 20.0;

macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

choice_enum!(FitnessGoal {
    WeightLoss => "Weight Loss",
    MuscleGain => "Muscle Gain",
    ImproveEndurance => "Improve Endurance",
    GeneralFitness => "General Fitness",
});

choice_enum!(FitnessLevel {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
});

choice_enum!(WorkoutLocation {
    Home => "Home",
    Gym => "Gym",
    Outdoor => "Outdoor",
});

choice_enum!(DietaryPreference {
    Veg => "Veg",
    NonVeg => "Non-Veg",
    Vegan => "Vegan",
    Keto => "Keto",
    Balanced => "Balanced",
});

/// Raw submission. Field names follow the form (camelCase).
///
/// Deserializing never fails on a field: a value of the wrong JSON type is
/// dropped and recorded in `mistyped`, so [`validate`] can report it against
/// that field like any other bad value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct ProfileInput {
    pub name: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub fitness_goal: Option<String>,
    pub current_fitness_level: Option<String>,
    pub workout_location: Option<String>,
    pub dietary_preferences: Option<String>,
    pub medical_history: Option<String>,
    pub stress_level: Option<String>,
    /// Field name to type message, e.g. `age` -> "Expected number, received boolean".
    #[serde(skip)]
    pub mistyped: FieldErrors,
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct FieldReader {
    doc: Map<String, Value>,
    mistyped: FieldErrors,
}

impl FieldReader {
    fn text(&mut self, key: &str) -> Option<String> {
        match self.doc.remove(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.mistyped
                    .insert(key.to_string(), format!("Expected string, received {}", json_kind(&other)));
                None
            }
        }
    }

    /// Form fields arrive as strings, so a numeric string counts as a number.
    /// A non-numeric string becomes NaN and fails the range check.
    fn number(&mut self, key: &str) -> Option<f64> {
        match self.doc.remove(key) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
            Some(other) => {
                self.mistyped
                    .insert(key.to_string(), format!("Expected number, received {}", json_kind(&other)));
                None
            }
        }
    }
}

impl From<Map<String, Value>> for ProfileInput {
    fn from(doc: Map<String, Value>) -> Self {
        let mut r = FieldReader { doc, mistyped: FieldErrors::new() };
        ProfileInput {
            name: r.text("name"),
            age: r.number("age"),
            gender: r.text("gender"),
            height: r.number("height"),
            weight: r.number("weight"),
            fitness_goal: r.text("fitnessGoal"),
            current_fitness_level: r.text("currentFitnessLevel"),
            workout_location: r.text("workoutLocation"),
            dietary_preferences: r.text("dietaryPreferences"),
            medical_history: r.text("medicalHistory"),
            stress_level: r.text("stressLevel"),
            mistyped: r.mistyped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: f64,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub fitness_goal: FitnessGoal,
    pub current_fitness_level: FitnessLevel,
    pub workout_location: WorkoutLocation,
    pub dietary_preferences: DietaryPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
}

impl From<&UserProfile> for ProfileInput {
    fn from(p: &UserProfile) -> Self {
        ProfileInput {
            name: Some(p.name.clone()),
            age: Some(p.age),
            gender: Some(p.gender.to_string()),
            height: Some(p.height),
            weight: Some(p.weight),
            fitness_goal: Some(p.fitness_goal.to_string()),
            current_fitness_level: Some(p.current_fitness_level.to_string()),
            workout_location: Some(p.workout_location.to_string()),
            dietary_preferences: Some(p.dietary_preferences.to_string()),
            medical_history: p.medical_history.clone(),
            stress_level: p.stress_level.clone(),
            mistyped: FieldErrors::new(),
        }
    }
}

struct Checker {
    errors: FieldErrors,
}

impl Checker {
    fn fail(&mut self, field: &str, msg: &str) {
        self.errors.entry(field.to_string()).or_insert_with(|| msg.to_string());
    }

    fn number(&mut self, field: &str, v: Option<f64>, min: f64, max: Option<f64>, msg: &str, max_msg: &str) -> f64 {
        match v {
            Some(n) if n.is_finite() && n >= min => {
                if max.is_some_and(|m| n > m) {
                    self.fail(field, max_msg);
                }
                n
            }
            _ => {
                self.fail(field, msg);
                f64::NAN
            }
        }
    }

    fn choice<T: FromStr>(&mut self, field: &str, v: Option<&str>, msg: &str) -> Option<T> {
        let parsed = v.and_then(|s| s.parse::<T>().ok());
        if parsed.is_none() {
            self.fail(field, msg);
        }
        parsed
    }
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_ref().filter(|s| !s.trim().is_empty()).cloned()
}

/// Check every rule and collect all failures, not just the first one.
pub fn validate(input: &ProfileInput) -> Result<UserProfile, CoachError> {
    let mut c = Checker { errors: input.mistyped.clone() };

    let name = input.name.clone().unwrap_or_default();
    if name.chars().count() < MIN_NAME_CHARS {
        c.fail("name", "Name must be at least 2 characters.");
    }
    let age = c.number(
        "age",
        input.age,
        MIN_AGE,
        Some(MAX_AGE),
        "You must be at least 12 years old.",
        "Age must be at most 100.",
    );
    let gender = c.choice::<Gender>("gender", input.gender.as_deref(), "Please select a gender.");
    let height = c.number("height", input.height, MIN_HEIGHT_CM, None, "Please enter a valid height.", "");
    let weight = c.number("weight", input.weight, MIN_WEIGHT_KG, None, "Please enter a valid weight.", "");
    let goal = c.choice::<FitnessGoal>("fitnessGoal", input.fitness_goal.as_deref(), "Please select a fitness goal.");
    let level = c.choice::<FitnessLevel>(
        "currentFitnessLevel",
        input.current_fitness_level.as_deref(),
        "Please select your fitness level.",
    );
    let location = c.choice::<WorkoutLocation>(
        "workoutLocation",
        input.workout_location.as_deref(),
        "Please select a workout location.",
    );
    let diet = c.choice::<DietaryPreference>(
        "dietaryPreferences",
        input.dietary_preferences.as_deref(),
        "Please select your diet.",
    );

    match (gender, goal, level, location, diet) {
        (Some(gender), Some(fitness_goal), Some(current_fitness_level), Some(workout_location), Some(dietary_preferences))
            if c.errors.is_empty() =>
        {
            Ok(UserProfile {
                name,
                age,
                gender,
                height,
                weight,
                fitness_goal,
                current_fitness_level,
                workout_location,
                dietary_preferences,
                medical_history: non_blank(&input.medical_history),
                stress_level: non_blank(&input.stress_level),
            })
        }
        _ => Err(CoachError::Validation(c.errors)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_input() -> ProfileInput {
        ProfileInput {
            name: Some("Asha".into()),
            age: Some(29.0),
            gender: Some("female".into()),
            height: Some(165.0),
            weight: Some(60.0),
            fitness_goal: Some("Muscle Gain".into()),
            current_fitness_level: Some("Intermediate".into()),
            workout_location: Some("Gym".into()),
            dietary_preferences: Some("Veg".into()),
            medical_history: None,
            stress_level: Some("moderate".into()),
            mistyped: FieldErrors::new(),
        }
    }

    fn errors(input: &ProfileInput) -> FieldErrors {
        match validate(input) {
            Err(CoachError::Validation(f)) => f,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_profile() {
        let p = validate(&sample_input()).unwrap();
        assert_eq!(p.fitness_goal, FitnessGoal::MuscleGain);
        assert_eq!(p.dietary_preferences, DietaryPreference::Veg);
        assert_eq!(p.stress_level.as_deref(), Some("moderate"));
        assert!(p.medical_history.is_none());
    }

    #[test]
    fn age_boundary_is_inclusive() {
        let mut input = sample_input();
        input.age = Some(11.0);
        assert_eq!(errors(&input).get("age").map(String::as_str), Some("You must be at least 12 years old."));

        input.age = Some(12.0);
        assert!(validate(&input).is_ok());

        input.age = Some(100.0);
        assert!(validate(&input).is_ok());

        input.age = Some(101.0);
        assert!(errors(&input).contains_key("age"));
    }

    #[test]
    fn missing_goal_is_rejected() {
        let mut input = sample_input();
        input.fitness_goal = None;
        let f = errors(&input);
        assert_eq!(f.len(), 1);
        assert_eq!(f["fitnessGoal"], "Please select a fitness goal.");
    }

    #[test]
    fn collects_every_failing_field() {
        let f = errors(&ProfileInput::default());
        for key in [
            "name",
            "age",
            "gender",
            "height",
            "weight",
            "fitnessGoal",
            "currentFitnessLevel",
            "workoutLocation",
            "dietaryPreferences",
        ] {
            assert!(f.contains_key(key), "missing error for {key}");
        }
        assert!(!f.contains_key("medicalHistory"));
    }

    #[test]
    fn rejects_values_outside_fixed_sets() {
        let mut input = sample_input();
        input.workout_location = Some("Moon".into());
        input.gender = Some("Female".into());
        let f = errors(&input);
        assert!(f.contains_key("workoutLocation"));
        assert!(f.contains_key("gender"));
    }

    #[test]
    fn coerces_numeric_strings_from_form_json() {
        let input: ProfileInput = serde_json::from_str(
            r#"{"name":"Ravi","age":"12","gender":"male","height":"180","weight":75,
                "fitnessGoal":"Weight Loss","currentFitnessLevel":"Beginner",
                "workoutLocation":"Home","dietaryPreferences":"Keto","medicalHistory":"  "}"#,
        )
        .unwrap();
        let p = validate(&input).unwrap();
        assert_eq!(p.age, 12.0);
        assert_eq!(p.height, 180.0);
        assert!(p.medical_history.is_none());
    }

    #[test]
    fn non_numeric_string_fails_the_field_only() {
        let input: ProfileInput = serde_json::from_str(r#"{"height":"tall"}"#).unwrap();
        assert!(input.height.is_some_and(f64::is_nan));
        assert_eq!(errors(&input)["height"], "Please enter a valid height.");
    }

    #[test]
    fn wrong_json_types_are_field_errors() {
        let input: ProfileInput = serde_json::from_str(
            r#"{"name":5,"age":true,"gender":"male","height":180,"weight":75,
                "fitnessGoal":"Weight Loss","currentFitnessLevel":"Beginner",
                "workoutLocation":"Home","dietaryPreferences":["Keto"]}"#,
        )
        .unwrap();
        assert!(input.name.is_none());
        assert!(input.age.is_none());
        let f = errors(&input);
        assert_eq!(f["name"], "Expected string, received number");
        assert_eq!(f["age"], "Expected number, received boolean");
        assert_eq!(f["dietaryPreferences"], "Expected string, received array");
        assert!(!f.contains_key("height"));
    }

    #[test]
    fn mistyped_optional_field_still_rejects() {
        let mut doc = serde_json::to_value(sample_input()).unwrap();
        doc["medicalHistory"] = serde_json::json!({ "asthma": true });
        let input: ProfileInput = serde_json::from_value(doc).unwrap();
        assert_eq!(errors(&input)["medicalHistory"], "Expected string, received object");
    }

    #[test]
    fn profile_round_trips_through_input() {
        let p = validate(&sample_input()).unwrap();
        let again = validate(&ProfileInput::from(&p)).unwrap();
        assert_eq!(p, again);
    }
}
