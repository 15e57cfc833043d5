use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::wire::{GenerationRequest, GenerationResponse, Modality};

/// OpenAI chat completions for text, image generations for media.
pub struct OpenAIProvider {
    model: String,
    image_model: String,
    api_base: String,
    api_key: Option<String>,
    client: Client,
    timeout_secs: u64,
}

impl OpenAIProvider {
    pub fn new(model: String, image_model: String, api_base: String, timeout_secs: u64) -> Self {
        Self {
            model,
            image_model,
            api_base,
            api_key: None,
            client: Client::new(),
            timeout_secs,
        }
    }

    /// Use this key instead of `OPENAI_API_KEY`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn key(&self) -> Result<String> {
        match &self.api_key {
            Some(k) => Ok(k.clone()),
            None => std::env::var("OPENAI_API_KEY").map_err(|_| anyhow!("OPENAI_API_KEY env var is not set")),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let url = self.url(path);
        tracing::debug!("openai: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.key()?)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(body)
            .send()
            .await
            .context("openai request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("openai read body failed")?;
        tracing::trace!("openai: raw status {} body:\n{}", status, text);

        if !status.is_success() {
            bail!("OpenAI API error ({}): {}", status, text);
        }
        Ok(text)
    }

    async fn chat(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        let mut messages = Vec::new();
        if !req.instruction.system.is_empty() {
            messages.push(json!({ "role": "system", "content": req.instruction.system }));
        }
        messages.push(json!({ "role": "user", "content": req.instruction.user }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
        });
        if req.json {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let text = self.post("/v1/chat/completions", &body).await?;

        #[derive(Deserialize)]
        struct ChatMessage {
            #[serde(default)]
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("failed to parse OpenAI response: {e}\nRaw: {text}"))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("openai: empty completion"))?;

        Ok(GenerationResponse::Text { content })
    }

    async fn image(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        let body = json!({
            "model": self.image_model,
            "prompt": req.instruction.user,
            "n": 1,
            "size": "1024x1024",
            "response_format": "b64_json",
        });

        let text = self.post("/v1/images/generations", &body).await?;

        #[derive(Deserialize)]
        struct ImageData {
            #[serde(default)]
            b64_json: Option<String>,
            #[serde(default)]
            url: Option<String>,
        }
        #[derive(Deserialize)]
        struct ImagesResponse {
            data: Vec<ImageData>,
        }

        let parsed: ImagesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("failed to parse OpenAI images response: {e}"))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("openai: no image returned"))?;

        let url = match (first.b64_json, first.url) {
            (Some(b64), _) => format!("data:image/png;base64,{b64}"),
            (None, Some(url)) => url,
            (None, None) => bail!("openai: image entry has neither b64_json nor url"),
        };
        Ok(GenerationResponse::Media { url })
    }
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        match req.modality {
            Modality::Text => self.chat(req).await,
            Modality::Image => self.image(req).await,
        }
    }
}
