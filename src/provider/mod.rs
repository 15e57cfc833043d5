use anyhow::Result;
use async_trait::async_trait;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::{GenerationRequest, GenerationResponse};

pub mod openai;
pub mod anthropic;
pub mod ollama;

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, req: &GenerationRequest) -> Result<GenerationResponse>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

/// Build the adapter for `kind`. `model` is the chat model; the OpenAI image
/// endpoint always uses `cfg.image_model`.
pub fn make_provider(kind: ProviderKind, model: String, cfg: &Config) -> DynProvider {
    match kind {
        ProviderKind::OpenAI => Box::new(openai::OpenAIProvider::new(
            model,
            cfg.image_model.clone(),
            cfg.openai_url.clone(),
            cfg.timeout_secs,
        )),
        ProviderKind::Anthropic => Box::new(anthropic::Anthropic::new(
            model,
            cfg.anthropic_url.clone(),
            cfg.timeout_secs,
        )),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(
            model,
            cfg.ollama_url.clone(),
            cfg.timeout_secs,
        )),
    }
}
