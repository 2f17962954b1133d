//! Network backend of the client cache: whatever answers translate requests.
//! `HttpBackend` talks to the translate endpoint over HTTP; `LocalBackend`
//! calls a `ServerCache` in-process (same contract, no socket).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::warn;

use crate::translate::{
    ErrorBody, ServerCache, TranslateError, TranslateRequest, TranslateResponse, Translation,
};

#[async_trait]
pub trait TranslateBackend: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError>;
}

fn into_translation(response: TranslateResponse, original: &str) -> Translation {
    match response.error {
        Some(reason) => Translation::Degraded {
            original: original.to_string(),
            reason,
        },
        None => Translation::Translated(response.translated_text),
    }
}

/// Client of `POST {base}/api/translate`.
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/translate", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl TranslateBackend for HttpBackend {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError> {
        let unavailable = |reason: String| TranslateError::ProviderUnavailable {
            original: text.to_string(),
            reason,
        };

        let request = TranslateRequest {
            text: text.to_string(),
            target_language: target.to_string(),
            source_language: Some(source.to_string()),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: ErrorBody = response.json().await.unwrap_or_else(|_| ErrorBody {
                error: format!("rejected with HTTP {}", status.as_u16()),
            });
            return Err(TranslateError::InvalidInput(body.error));
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "translate endpoint failed");
            return Err(unavailable(format!("endpoint returned HTTP {}", status.as_u16())));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(into_translation(body, text))
    }
}

/// In-process backend over a shared `ServerCache`.
pub struct LocalBackend {
    cache: Arc<ServerCache>,
}

impl LocalBackend {
    pub fn new(cache: Arc<ServerCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl TranslateBackend for LocalBackend {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError> {
        let response = self
            .cache
            .handle_translate(TranslateRequest {
                text: text.to_string(),
                target_language: target.to_string(),
                source_language: Some(source.to_string()),
            })
            .await?;
        Ok(into_translation(response, text))
    }
}
