use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::NotesConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("clinical notes API rejected the document with status {status}")]
    Rejected { status: u16 },

    #[error("clinical notes API timed out")]
    Timeout,

    #[error("clinical notes API unreachable: {0}")]
    Transport(String),
}

/// Outbound relay of a forms document to the clinical-notes service.
#[async_trait]
pub trait NotesClient: Send + Sync {
    async fn post_note(&self, document: &serde_json::Value) -> Result<(), UpstreamError>;
}

#[derive(Clone)]
pub struct IcaNotesClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl IcaNotesClient {
    pub fn new(cfg: &NotesConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build notes http client")?;
        Ok(Self {
            http,
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl NotesClient for IcaNotesClient {
    async fn post_note(&self, document: &serde_json::Value) -> Result<(), UpstreamError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(document)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(%status, url = %self.url, "notes api responded");
        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
