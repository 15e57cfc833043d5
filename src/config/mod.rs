use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ProviderKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    /// Images go through their own provider; only OpenAI can produce them.
    pub image_provider: ProviderKind,
    pub image_model: String,
    pub timeout_secs: u64,
    pub openai_url: String,
    pub anthropic_url: String,
    pub ollama_url: String,
    /// Holds the plan session and saved exchanges.
    pub state_dir: PathBuf,
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: "gpt-4.1-mini".into(),
            image_provider: ProviderKind::OpenAI,
            image_model: "dall-e-3".into(),
            timeout_secs: 120,
            openai_url: "https://api.openai.com".into(),
            anthropic_url: "https://api.anthropic.com".into(),
            ollama_url: "http://localhost:11434".into(),
            state_dir: PathBuf::from(".fitcoach"),
            bind: "127.0.0.1:3000".into(),
        }
    }
}

impl Config {
    /// Read a TOML file; keys it leaves out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
