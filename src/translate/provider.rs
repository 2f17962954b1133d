//! Translation provider adapter.
//! One HTTP GET per call against a MyMemory-compatible endpoint
//! (`/get?q=<text>&langpair=<src>|<tgt>`), entity-decoded on the way out.
//! No retries here; the caller owns any retry policy.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{entities, TranslateError};
use crate::languages::Language;

/// Raw translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target` (site language codes).
    /// Unknown codes fail with `InvalidLanguage` before any I/O.
    async fn translate_raw(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError>;
}

/// Check text and language codes, returning the parsed languages.
pub fn validate(
    text: &str,
    source: &str,
    target: &str,
) -> Result<(Language, Language), TranslateError> {
    if text.trim().is_empty() {
        return Err(TranslateError::InvalidInput("text must not be empty".into()));
    }
    let source_lang =
        Language::from_code(source).ok_or_else(|| TranslateError::InvalidLanguage(source.into()))?;
    let target_lang =
        Language::from_code(target).ok_or_else(|| TranslateError::InvalidLanguage(target.into()))?;
    Ok((source_lang, target_lang))
}

pub const DEFAULT_PROVIDER_URL: &str = "https://api.mymemory.translated.net";

/// HTTP client for the public translation provider.
pub struct HttpTranslator {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTranslator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, text: &str, langpair: &str) -> Result<String, String> {
        let response = self
            .http
            .get(format!("{}/get", self.base_url))
            .query(&[("q", text), ("langpair", langpair)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("provider returned HTTP {}", status.as_u16()));
        }

        let body: ProviderBody = response.json().await.map_err(|e| e.to_string())?;
        match body.status_code() {
            Some(200) => {}
            Some(code) => return Err(format!("provider responseStatus {code}")),
            None => return Err("provider response missing responseStatus".into()),
        }

        body.response_data
            .and_then(|data| data.translated_text)
            .ok_or_else(|| "provider response missing translatedText".to_string())
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate_raw(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let (source_lang, target_lang) = validate(text, source, target)?;
        let langpair = format!(
            "{}|{}",
            source_lang.provider_code(),
            target_lang.provider_code()
        );

        match self.fetch(text, &langpair).await {
            Ok(translated) => {
                debug!(%langpair, chars = text.len(), "provider translation ok");
                Ok(entities::decode(&translated).into_owned())
            }
            Err(reason) => {
                warn!(%langpair, error = %reason, "provider translation failed");
                Err(TranslateError::ProviderUnavailable {
                    original: text.to_string(),
                    reason,
                })
            }
        }
    }
}

// --- Provider response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderBody {
    response_data: Option<ProviderData>,
    /// Number on success, sometimes a string on errors.
    response_status: Option<Value>,
}

impl ProviderBody {
    fn status_code(&self) -> Option<u64> {
        match self.response_status.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderData {
    translated_text: Option<String>,
}
