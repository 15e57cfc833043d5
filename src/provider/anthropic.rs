use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wire::{GenerationRequest, GenerationResponse, Modality};
use super::Provider;

const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    client: Client,
}

impl Anthropic {
    pub fn new(model: String, api_base: String, timeout_secs: u64) -> Self {
        Self {
            model,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        if req.modality == Modality::Image {
            bail!("anthropic cannot generate images");
        }

        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY env var is not set"))?;
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let system = req.instruction.system.as_str();
        let body = MsgRequest {
            model: &self.model,
            max_tokens: 8192,
            messages: vec![Msg { role: "user", content: &req.instruction.user }],
            system: (!system.is_empty()).then_some(system),
        };

        tracing::debug!("anthropic: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("anthropic read body failed")?;
        tracing::trace!("anthropic: raw body:\n{}", text);
        if !status.is_success() {
            bail!("Anthropic API error ({}): {}", status, text);
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("anthropic response parse error: {}", e))?;

        let content = parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .ok_or_else(|| anyhow!("anthropic: empty content"))?;

        Ok(GenerationResponse::Text { content })
    }
}
