use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wire::{GenerationRequest, GenerationResponse, Instruction, Modality};
use super::Provider;

pub struct Ollama {
    pub model: String,
    pub url: String,
    pub timeout: Duration,
    client: Client,
}

impl Ollama {
    pub fn new(model: String, url: String, timeout_secs: u64) -> Self {
        Self {
            model,
            url,
            timeout: Duration::from_secs(timeout_secs),
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

fn to_messages(ins: &Instruction) -> Vec<Msg> {
    let mut out = Vec::with_capacity(2);
    if !ins.system.is_empty() {
        out.push(Msg { role: "system".into(), content: ins.system.clone() });
    }
    out.push(Msg { role: "user".into(), content: ins.user.clone() });
    out
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        if req.modality == Modality::Image {
            bail!("ollama cannot generate images");
        }

        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(&req.instruction),
            stream: false,
            format: req.json.then_some("json"),
            options: OllamaOptions { temperature: 0.7 },
        };

        tracing::debug!("ollama: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;
        tracing::trace!("ollama: raw body:\n{}", text);
        if !status.is_success() {
            bail!("ollama error ({}): {}", status, text);
        }

        // Older servers answer with the bare content.
        let content = match serde_json::from_str::<ChatResponse>(&text) {
            Ok(c) => c.message.content,
            Err(_) => text,
        };

        Ok(GenerationResponse::Text { content })
    }
}
