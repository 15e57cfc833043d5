use anyhow::Result;
use chrono::Utc;
use fs_err as fs;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::wire::{GenerationRequest, GenerationResponse};

/// stderr logging; `RUST_LOG` wins over the default level.
pub fn init_tracing(debug: bool) {
    let default = if debug { "fitcoach=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Saves provider exchanges for one run under `<root>/tx/<id>/`.
#[derive(Debug, Clone)]
pub struct ExchangeLog {
    dir: PathBuf,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join("tx").join(tx.to_string())
}

impl ExchangeLog {
    pub fn new(root: &Path) -> Self {
        Self { dir: tx_dir(root, Uuid::new_v4()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `<stage>.request.json` and `<stage>.response.json`. Media
    /// payloads are replaced by their length; data URIs get large.
    pub fn save(&self, stage: &str, req: &GenerationRequest, resp: &GenerationResponse) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.dir)?;

        let req_path = self.dir.join(format!("{stage}.request.json"));
        let req_doc = json!({ "saved_at": Utc::now(), "request": req });
        fs::write(&req_path, to_string_pretty(&req_doc)?)?;

        let resp_doc = match resp {
            GenerationResponse::Media { url } if url.starts_with("data:") => {
                json!({ "saved_at": Utc::now(), "response": { "kind": "media", "data_uri_bytes": url.len() } })
            }
            other => json!({ "saved_at": Utc::now(), "response": other }),
        };
        let resp_path = self.dir.join(format!("{stage}.response.json"));
        fs::write(&resp_path, to_string_pretty(&resp_doc)?)?;

        tracing::debug!("saved {} exchange in {}", stage, self.dir.display());
        Ok((req_path, resp_path))
    }
}
