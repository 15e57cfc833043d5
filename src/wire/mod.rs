use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// ========================================
/// Plan documents returned by the model
/// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessPlan {
    pub workout_plan: WorkoutPlan,
    pub diet_plan: DietPlan,
    pub motivation: Motivation,
    pub voice_script: VoiceScript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub summary: String,
    pub days: Vec<WorkoutDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Free-form, e.g. "60 sec".
    pub rest: String,
    pub image_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub summary: String,
    pub meals: Meals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meals {
    pub breakfast: Vec<MealItem>,
    pub lunch: Vec<MealItem>,
    pub dinner: Vec<MealItem>,
    pub snacks: Vec<MealItem>,
}

impl Meals {
    /// Meal groups in display order.
    pub fn groups(&self) -> [(&'static str, &[MealItem]); 4] {
        [
            ("Breakfast", self.breakfast.as_slice()),
            ("Lunch", self.lunch.as_slice()),
            ("Dinner", self.dinner.as_slice()),
            ("Snacks", self.snacks.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub item: String,
    pub image_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motivation {
    pub quote: String,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceScript {
    pub intro: String,
    pub workout_section: String,
    pub diet_section: String,
    pub closing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tips {
    pub fitness_tip: String,
    pub lifestyle_tip: String,
    pub motivation_quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// Either a remote URL or a `data:` URI.
    pub image_url: String,
}

impl GeneratedImage {
    pub fn is_data_uri(&self) -> bool {
        self.image_url.starts_with("data:")
    }

    /// Bytes of a base64 `data:` URI; `None` for remote URLs or bad data.
    pub fn decode_data_uri(&self) -> Option<Vec<u8>> {
        let rest = self.image_url.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        if !meta.ends_with(";base64") {
            return None;
        }
        STANDARD.decode(payload.trim()).ok()
    }
}

/// ========================================
/// Provider request/response
/// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt name, used for logs and saved artifacts.
    pub name: String,
    pub modality: Modality,
    pub instruction: Instruction,
    /// Ask the provider for a bare JSON object when it supports it.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenerationResponse {
    Text { content: String },
    Media { url: String },
}
