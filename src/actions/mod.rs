//! The orchestrator between validated input and the generative model.
//!
//! Every operation is one request/response: validate, make a single provider
//! call, parse. No retries, no caching. Failures never escape as errors; they
//! are logged and turned into an [`ActionError`] carrying a user-facing
//! message.

use serde::Serialize;

use crate::errors::{CoachError, FieldErrors};
use crate::log::ExchangeLog;
use crate::profile::{validate, ProfileInput, UserProfile};
use crate::prompt::{generate, ImageInput, ImagePrompt, PlanPrompt, TipsInput, TipsPrompt};
use crate::provider::DynProvider;
use crate::wire::{FitnessPlan, GeneratedImage, Tips};

pub const INVALID_INPUT: &str = "Invalid form data provided.";
pub const PLAN_FAILED: &str = "Failed to generate a plan. Please try again later.";
pub const REGENERATE_FAILED: &str = "Failed to regenerate a plan. Please try again later.";
pub const NO_ITEM_TEXT: &str = "No item text provided.";
pub const IMAGE_FAILED: &str = "Failed to generate image. The AI is resting.";
pub const TIPS_FAILED: &str = "Failed to generate tips. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any model call.
    Invalid,
    /// The model call failed or returned something unusable.
    Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    #[serde(skip)]
    pub kind: FailureKind,
}

/// Serializes as either the payload or `{ "error": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionResult<T> {
    Ok(T),
    Failed(ActionError),
}

impl<T> ActionResult<T> {
    /// Rejected before any model call.
    pub fn invalid(message: &str, err: CoachError) -> Self {
        tracing::info!("rejected input: {}", err);
        ActionResult::Failed(ActionError {
            error: message.to_string(),
            field_errors: err.field_errors().cloned(),
            kind: FailureKind::Invalid,
        })
    }

    fn failed(message: &str, action: &str, err: CoachError) -> Self {
        tracing::error!(action, "generation failed: {}", err);
        ActionResult::Failed(ActionError {
            error: message.to_string(),
            field_errors: None,
            kind: FailureKind::Generation,
        })
    }

    pub fn into_result(self) -> Result<T, ActionError> {
        match self {
            ActionResult::Ok(v) => Ok(v),
            ActionResult::Failed(e) => Err(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanGenerated {
    pub plan: FitnessPlan,
    pub user_details: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRegenerated {
    pub plan: FitnessPlan,
}

pub struct Coach {
    text: DynProvider,
    images: DynProvider,
    log: Option<ExchangeLog>,
}

impl Coach {
    pub fn new(text: DynProvider, images: DynProvider) -> Self {
        Self { text, images, log: None }
    }

    pub fn with_exchange_log(mut self, log: ExchangeLog) -> Self {
        self.log = Some(log);
        self
    }

    async fn plan_for(&self, profile: &UserProfile) -> Result<FitnessPlan, CoachError> {
        tracing::info!(provider = self.text.name(), goal = %profile.fitness_goal, "generating plan");
        generate::<PlanPrompt>(self.text.as_ref(), profile, self.log.as_ref()).await
    }

    pub async fn generate_plan(&self, input: &ProfileInput) -> ActionResult<PlanGenerated> {
        let profile = match validate(input) {
            Ok(p) => p,
            Err(e) => return ActionResult::invalid(INVALID_INPUT, e),
        };
        match self.plan_for(&profile).await {
            Ok(plan) => ActionResult::Ok(PlanGenerated { plan, user_details: profile }),
            Err(e) => ActionResult::failed(PLAN_FAILED, "generate_plan", e),
        }
    }

    /// A full, independent generation; the previous plan plays no part.
    pub async fn regenerate_plan(&self, input: &ProfileInput) -> ActionResult<PlanRegenerated> {
        let profile = match validate(input) {
            Ok(p) => p,
            Err(e) => return ActionResult::invalid(INVALID_INPUT, e),
        };
        match self.plan_for(&profile).await {
            Ok(plan) => ActionResult::Ok(PlanRegenerated { plan }),
            Err(e) => ActionResult::failed(REGENERATE_FAILED, "regenerate_plan", e),
        }
    }

    pub async fn generate_item_image(&self, item_text: &str) -> ActionResult<GeneratedImage> {
        let item_text = item_text.trim();
        if item_text.is_empty() {
            return ActionResult::invalid(NO_ITEM_TEXT, CoachError::EmptyItemText);
        }
        tracing::info!(provider = self.images.name(), item = item_text, "generating image");
        let input = ImageInput { item_text: item_text.to_string() };
        match generate::<ImagePrompt>(self.images.as_ref(), &input, self.log.as_ref()).await {
            Ok(img) => ActionResult::Ok(img),
            Err(e) => ActionResult::failed(IMAGE_FAILED, "generate_item_image", e),
        }
    }

    pub async fn generate_tips(&self, input: &ProfileInput) -> ActionResult<Tips> {
        let profile = match validate(input) {
            Ok(p) => p,
            Err(e) => return ActionResult::invalid(INVALID_INPUT, e),
        };
        let tips_input = TipsInput::from(&profile);
        match generate::<TipsPrompt>(self.text.as_ref(), &tips_input, self.log.as_ref()).await {
            Ok(tips) => ActionResult::Ok(tips),
            Err(e) => ActionResult::failed(TIPS_FAILED, "generate_tips", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::sample_input;
    use crate::provider::Provider;
    use crate::wire::tests::SAMPLE_PLAN;
    use crate::wire::{GenerationRequest, GenerationResponse, Modality};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers every text call with `reply`, every image call with a data URI.
    struct Canned {
        reply: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Provider for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, req: &GenerationRequest) -> anyhow::Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (&self.reply, req.modality) {
                (None, _) => anyhow::bail!("provider down"),
                (Some(_), Modality::Image) => Ok(GenerationResponse::Media { url: "data:image/png;base64,AA".into() }),
                (Some(r), Modality::Text) => Ok(GenerationResponse::Text { content: r.clone() }),
            }
        }
    }

    fn coach(reply: Option<&str>) -> (Coach, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mk = || -> DynProvider { Box::new(Canned { reply: reply.map(str::to_string), calls: calls.clone() }) };
        (Coach::new(mk(), mk()), calls)
    }

    #[tokio::test]
    async fn valid_profile_yields_plan_and_details() {
        let (c, calls) = coach(Some(SAMPLE_PLAN));
        let out = c.generate_plan(&sample_input()).await.into_result().unwrap();
        assert_eq!(out.user_details.name, "Asha");
        assert_eq!(out.plan.workout_plan.days[0].exercises[0].name, "Push-ups");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_profile_never_calls_the_model() {
        let (c, calls) = coach(Some(SAMPLE_PLAN));
        let mut input = sample_input();
        input.age = Some(11.0);
        let err = c.generate_plan(&input).await.into_result().unwrap_err();
        assert_eq!(err.error, INVALID_INPUT);
        assert_eq!(err.kind, FailureKind::Invalid);
        assert!(err.field_errors.unwrap().contains_key("age"));

        let err = c.regenerate_plan(&ProfileInput::default()).await.into_result().unwrap_err();
        assert_eq!(err.kind, FailureKind::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_a_single_attempt() {
        let (c, calls) = coach(None);
        let err = c.generate_plan(&sample_input()).await.into_result().unwrap_err();
        assert_eq!(err.error, PLAN_FAILED);
        assert_eq!(err.kind, FailureKind::Generation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = c.regenerate_plan(&sample_input()).await.into_result().unwrap_err();
        assert_eq!(err.error, REGENERATE_FAILED);
    }

    #[tokio::test]
    async fn partial_plan_is_never_returned() {
        let (c, _) = coach(Some(r#"{"workout_plan": {"summary": "x", "days": []}}"#));
        let out = c.generate_plan(&sample_input()).await;
        assert!(!out.is_ok());
    }

    #[tokio::test]
    async fn regenerate_returns_a_complete_plan() {
        let (c, calls) = coach(Some(SAMPLE_PLAN));
        let first = c.generate_plan(&sample_input()).await.into_result().unwrap();
        let again = c
            .regenerate_plan(&ProfileInput::from(&first.user_details))
            .await
            .into_result()
            .unwrap();
        assert_eq!(again.plan.diet_plan.meals.breakfast.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_item_text_skips_the_network() {
        let (c, calls) = coach(Some(SAMPLE_PLAN));
        for text in ["", "   "] {
            let err = c.generate_item_image(text).await.into_result().unwrap_err();
            assert_eq!(err.error, NO_ITEM_TEXT);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let img = c.generate_item_image("Squats").await.into_result().unwrap();
        assert!(img.image_url.starts_with("data:image/png"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn image_failure_message() {
        let (c, _) = coach(None);
        let err = c.generate_item_image("Squats").await.into_result().unwrap_err();
        assert_eq!(err.error, IMAGE_FAILED);
    }

    #[tokio::test]
    async fn tips_parse_camel_case_reply() {
        let reply = r#"{"fitnessTip":"Warm up.","lifestyleTip":"Sleep.","motivationQuote":"Go."}"#;
        let (c, _) = coach(Some(reply));
        let tips = c.generate_tips(&sample_input()).await.into_result().unwrap();
        assert_eq!(tips.lifestyle_tip, "Sleep.");
    }

    #[test]
    fn failures_serialize_as_error_object() {
        let r: ActionResult<PlanRegenerated> = ActionResult::failed(PLAN_FAILED, "t", CoachError::MissingSession);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, serde_json::json!({ "error": PLAN_FAILED }));
    }
}
