//! Translation core: wire types, outcome type, error taxonomy.
//! The provider adapter and the server-side TTL cache live in submodules.

pub mod entities;
pub mod key;
pub mod provider;
pub mod server_cache;

use serde::{Deserialize, Serialize};

pub use key::CacheKey;
pub use provider::{HttpTranslator, Translator};
pub use server_cache::{ServerCache, ServerCacheConfig};

/// Body of `POST /api/translate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
}

/// Successful or degraded reply of the translate endpoint.
/// `error` is only present when the provider failed and `translated_text`
/// carries the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub cache_size: usize,
    pub supported_languages: Vec<String>,
}

/// `{ "error": "..." }` body of a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Outcome of a translation attempt. A degraded result carries the original
/// text so callers can always render something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Translated(String),
    Degraded { original: String, reason: String },
}

impl Translation {
    /// Text to display: the translation, or the original on degradation.
    pub fn text(&self) -> &str {
        match self {
            Translation::Translated(text) => text,
            Translation::Degraded { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Translation::Translated(text) => text,
            Translation::Degraded { original, .. } => original,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Translation::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),
    /// Network failure or non-success provider status. `original` is the
    /// untranslated text, safe to show instead.
    #[error("translation provider unavailable: {reason}")]
    ProviderUnavailable { original: String, reason: String },
}

impl TranslateError {
    /// True for malformed caller usage, the only errors that reach the UI.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TranslateError::InvalidInput(_) | TranslateError::InvalidLanguage(_)
        )
    }
}
