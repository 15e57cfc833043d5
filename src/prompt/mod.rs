//! Prompt templates.
//!
//! Tips, full plan and item image are the same shape: a typed input, a typed
//! output, and a template rendering the input into an [`Instruction`]. They
//! all go through [`generate`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CoachError;
use crate::log::ExchangeLog;
use crate::profile::UserProfile;
use crate::provider::Provider;
use crate::wire::{
    FitnessPlan, GeneratedImage, GenerationRequest, GenerationResponse, Instruction, Modality, Tips,
};

pub trait Prompt {
    type Input: Serialize + Sync;
    type Output: DeserializeOwned;

    const NAME: &'static str;
    const MODALITY: Modality;

    fn render(input: &Self::Input) -> Instruction;

    fn request(input: &Self::Input) -> GenerationRequest {
        GenerationRequest {
            name: Self::NAME.to_string(),
            modality: Self::MODALITY,
            instruction: Self::render(input),
            json: Self::MODALITY == Modality::Text,
        }
    }

    /// Text replies must hold one JSON object matching `Output` in full.
    fn parse(resp: GenerationResponse) -> Result<Self::Output, CoachError> {
        match resp {
            GenerationResponse::Text { content } => parse_json_reply(&content),
            GenerationResponse::Media { .. } => Err(CoachError::Schema(format!(
                "{}: expected a text reply, got media",
                Self::NAME
            ))),
        }
    }
}

/// Render, send, parse. Exactly one provider call, no retry.
pub async fn generate<P: Prompt>(
    provider: &dyn Provider,
    input: &P::Input,
    log: Option<&ExchangeLog>,
) -> Result<P::Output, CoachError> {
    let req = P::request(input);
    tracing::debug!(prompt = P::NAME, "sending generation request");

    let resp = provider
        .complete(&req)
        .await
        .map_err(|e| CoachError::Provider(format!("{e:#}")))?;

    if let Some(log) = log {
        if let Err(e) = log.save(P::NAME, &req, &resp) {
            tracing::warn!(prompt = P::NAME, "could not save exchange: {e:#}");
        }
    }

    P::parse(resp)
}

pub fn parse_json_reply<T: DeserializeOwned>(content: &str) -> Result<T, CoachError> {
    match serde_json::from_str::<T>(content.trim()) {
        Ok(v) => Ok(v),
        Err(strict) => {
            // Some models wrap the object in prose or code fences.
            if let Some(obj) = extract_first_json_object(content) {
                if let Ok(v) = serde_json::from_str::<T>(obj) {
                    return Ok(v);
                }
            }
            Err(CoachError::Schema(format!("model reply does not match the output schema: {strict}")))
        }
    }
}

/// First balanced top-level `{...}` in `s`. Braces inside JSON strings are
/// ignored.
pub fn extract_first_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn or_unspecified(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("Not specified")
}

// ---------------------------------------------------------------------------
// Full plan
// ---------------------------------------------------------------------------

pub struct PlanPrompt;

fn plan_output_format() -> &'static str {
r#"{
  "workout_plan": {
    "summary": "Brief description of the weekly workout approach and goals.",
    "days": [
      {
        "day": "Day 1 - Chest & Triceps",
        "exercises": [
          {
            "name": "Push-ups",
            "sets": 4,
            "reps": 15,
            "rest": "60 sec",
            "image_prompt": "Realistic image of a person doing push-ups in a gym with good lighting."
          }
        ]
      }
    ]
  },
  "diet_plan": {
    "summary": "Brief overview of the daily nutrition and meal balance.",
    "meals": {
      "breakfast": [{"item": "Oatmeal with fruits", "image_prompt": "A bowl of oatmeal with banana slices and berries."}],
      "lunch": [{"item": "Grilled chicken salad", "image_prompt": "Healthy grilled chicken salad with greens and dressing."}],
      "dinner": [{"item": "Paneer/tofu curry", "image_prompt": "Indian-style paneer curry in a bowl with garnish."}],
      "snacks": [{"item": "Mixed nuts", "image_prompt": "A handful of mixed nuts in a small bowl."}]
    }
  },
  "motivation": {
    "quote": "Push yourself because no one else will do it for you.",
    "tip": "Stay hydrated and stretch before every workout."
  },
  "voice_script": {
    "intro": "Hey <name>, welcome to your personalized fitness journey!",
    "workout_section": "Here's your workout plan for the week.",
    "diet_section": "Now let's go through your diet plan.",
    "closing": "Stay consistent and believe in yourself. You've got this!"
  }
}"#
}

fn plan_instructions() -> &'static str {
r#"INSTRUCTIONS:
- The response must be complete JSON (no markdown, no extra text).
- "sets" and "reps" are whole numbers.
- Tailor exercises and meals to user fitness level, location, and dietary type.
- Ensure nutritional balance and safety for any mentioned medical condition.
- Keep tone motivational, realistic, and encouraging.
- For images, create simple descriptive prompts (not actual image URLs).
- If any info is missing, make a smart assumption and continue."#
}

impl Prompt for PlanPrompt {
    type Input = UserProfile;
    type Output = FitnessPlan;

    const NAME: &'static str = "fitness_plan";
    const MODALITY: Modality = Modality::Text;

    fn render(p: &UserProfile) -> Instruction {
        let system = "You are a certified AI Fitness Coach and Nutritionist. \
You create personalized workout and diet plans from user data, together with \
motivational content, voice narration text and image prompts. \
Return EXACTLY ONE JSON object and nothing else."
            .to_string();

        let user = format!(
"USER DETAILS:
Name: {name}
Age: {age}
Gender: {gender}
Height: {height} cm
Weight: {weight} kg
Fitness Goal: {goal}
Current Fitness Level: {level}
Workout Location: {location}
Dietary Preference: {diet}
Medical History: {medical}
Stress Level: {stress}

OBJECTIVE:
Generate a personalized fitness plan that includes:
1. A 7-day workout plan
2. A daily meal/diet plan
3. Motivational quote and tip
4. Voice narration text for the \"Read My Plan\" feature
5. Image prompts for exercises and meals

Make it practical, easy to follow, and scientifically valid.

OUTPUT FORMAT (JSON only):
{format}

{instructions}",
            name = p.name,
            age = p.age,
            gender = p.gender,
            height = p.height,
            weight = p.weight,
            goal = p.fitness_goal,
            level = p.current_fitness_level,
            location = p.workout_location,
            diet = p.dietary_preferences,
            medical = or_unspecified(&p.medical_history),
            stress = or_unspecified(&p.stress_level),
            format = plan_output_format(),
            instructions = plan_instructions(),
        );

        Instruction { system, user }
    }
}

// ---------------------------------------------------------------------------
// Tips
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipsInput {
    pub fitness_goal: String,
    pub current_fitness_level: String,
    pub workout_location: String,
    pub dietary_preferences: String,
}

impl From<&UserProfile> for TipsInput {
    fn from(p: &UserProfile) -> Self {
        TipsInput {
            fitness_goal: p.fitness_goal.to_string(),
            current_fitness_level: p.current_fitness_level.to_string(),
            workout_location: p.workout_location.to_string(),
            dietary_preferences: p.dietary_preferences.to_string(),
        }
    }
}

pub struct TipsPrompt;

impl Prompt for TipsPrompt {
    type Input = TipsInput;
    type Output = Tips;

    const NAME: &'static str = "fitness_tips";
    const MODALITY: Modality = Modality::Text;

    fn render(t: &TipsInput) -> Instruction {
        Instruction {
            system: "You are a personal AI fitness and lifestyle coach. Return EXACTLY ONE JSON object.".into(),
            user: format!(
"Generate fitness tips, lifestyle tips and motivational quotes, tailored to the user's fitness goal, fitness level, workout location and dietary preferences.

Fitness Goal: {}
Current Fitness Level: {}
Workout Location: {}
Dietary Preferences: {}

Respond with a JSON object with these keys:
- fitnessTip: A practical fitness tip.
- lifestyleTip: A relevant lifestyle tip.
- motivationQuote: A motivational quote to encourage the user.",
                t.fitness_goal, t.current_fitness_level, t.workout_location, t.dietary_preferences
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Item image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub item_text: String,
}

pub struct ImagePrompt;

impl Prompt for ImagePrompt {
    type Input = ImageInput;
    type Output = GeneratedImage;

    const NAME: &'static str = "item_image";
    const MODALITY: Modality = Modality::Image;

    fn render(i: &ImageInput) -> Instruction {
        Instruction {
            system: String::new(),
            user: format!(
                "Generate a realistic, high-quality, photographic image of the following exercise or meal item: {}. \
The image should be clear, well-lit, and visually appealing, suitable for a fitness application.",
                i.item_text
            ),
        }
    }

    fn parse(resp: GenerationResponse) -> Result<GeneratedImage, CoachError> {
        match resp {
            GenerationResponse::Media { url } if !url.trim().is_empty() => Ok(GeneratedImage { image_url: url }),
            GenerationResponse::Media { .. } => {
                Err(CoachError::Generation("image generation failed to return a valid image".into()))
            }
            GenerationResponse::Text { .. } => {
                Err(CoachError::Schema(format!("{}: expected media, got text", Self::NAME)))
            }
        }
    }
}
