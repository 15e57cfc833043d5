#![allow(dead_code)]

use fitcoach::actions::Coach;
use fitcoach::profile::ProfileInput;
use fitcoach::provider::openai::OpenAIProvider;
use serde_json::{json, Value};
use wiremock::MockServer;

pub fn plan_json() -> Value {
    json!({
        "workout_plan": {
            "summary": "Push, pull and legs.",
            "days": [
                {"day": "Day 1 - Push", "exercises": [
                    {"name": "Bench Press", "sets": 4, "reps": 8, "rest": "90 sec",
                     "image_prompt": "Bench press in a gym."}
                ]}
            ]
        },
        "diet_plan": {
            "summary": "Vegetarian, high protein.",
            "meals": {
                "breakfast": [{"item": "Greek yogurt", "image_prompt": "Yogurt bowl."}],
                "lunch": [{"item": "Chickpea salad", "image_prompt": "Chickpea salad."}],
                "dinner": [{"item": "Tofu stir fry", "image_prompt": "Tofu stir fry."}],
                "snacks": []
            }
        },
        "motivation": {"quote": "Keep going.", "tip": "Drink water."},
        "voice_script": {
            "intro": "Hi Ravi.",
            "workout_section": "Workout time.",
            "diet_section": "Eat well.",
            "closing": "See you tomorrow."
        }
    })
}

pub fn profile() -> ProfileInput {
    serde_json::from_value(json!({
        "name": "Ravi",
        "age": "34",
        "gender": "male",
        "height": 178,
        "weight": "80",
        "fitnessGoal": "Muscle Gain",
        "currentFitnessLevel": "Beginner",
        "workoutLocation": "Gym",
        "dietaryPreferences": "Veg"
    }))
    .unwrap()
}

/// Chat completion body whose message content is `content`.
pub fn chat_reply(content: &str) -> Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

pub fn coach_for(server: &MockServer) -> Coach {
    let provider = || {
        OpenAIProvider::new("gpt-test".into(), "img-test".into(), server.uri(), 5).with_api_key("test")
    };
    Coach::new(Box::new(provider()), Box::new(provider()))
}
