//! Process-wide translation cache in front of the provider.
//! Key: `source:target:text`. TTL: 24 hours. Expired entries are read as
//! misses and only swept when a write pushes the store past its high-water
//! mark; there is no background cleanup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::provider::{validate, Translator};
use super::{CacheKey, HealthResponse, TranslateError, TranslateRequest, TranslateResponse};
use crate::clock::{Clock, SystemClock};
use crate::languages::{self, DEFAULT_SOURCE};
use crate::metrics::{metric_names, MetricsRegistry};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);
pub const DEFAULT_HIGH_WATER: usize = 1000;

#[derive(Debug, Clone)]
pub struct ServerCacheConfig {
    pub ttl: Duration,
    /// Store size above which a write triggers an expiry sweep.
    pub high_water: usize,
}

impl Default for ServerCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            high_water: DEFAULT_HIGH_WATER,
        }
    }
}

struct CacheEntry {
    translated_text: String,
    written_at: i64,
}

pub struct ServerCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    translator: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRegistry>,
    config: ServerCacheConfig,
}

impl ServerCache {
    pub fn new(translator: Arc<dyn Translator>, config: ServerCacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            translator,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(MetricsRegistry::new()),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Serve one translate request.
    ///
    /// Only caller mistakes (empty text, unsupported language) come back as
    /// `Err`. A provider failure yields `Ok` with the original text and the
    /// `error` field set.
    pub async fn handle_translate(
        &self,
        request: TranslateRequest,
    ) -> Result<TranslateResponse, TranslateError> {
        let TranslateRequest {
            text,
            target_language,
            source_language,
        } = request;
        let source_language = source_language.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let (source_lang, target_lang) = validate(&text, &source_language, &target_language)?;

        let respond = |translated_text: String, cached: Option<bool>, error: Option<String>| {
            TranslateResponse {
                translated_text,
                source_language: source_lang.code().to_string(),
                target_language: target_lang.code().to_string(),
                cached,
                error,
            }
        };

        if source_lang == target_lang {
            self.metrics.incr(metric_names::SAME_LANGUAGE);
            return Ok(respond(text, Some(true), None));
        }

        let key = CacheKey::new(source_lang.code(), target_lang.code(), &text);
        if let Some(hit) = self.lookup(&key) {
            self.metrics.incr(metric_names::CACHE_HIT);
            debug!(%key, "server cache hit");
            return Ok(respond(hit, Some(true), None));
        }
        self.metrics.incr(metric_names::CACHE_MISS);

        let span = self.metrics.span(metric_names::PROVIDER_LATENCY);
        let result = self
            .translator
            .translate_raw(&text, source_lang.code(), target_lang.code())
            .await;
        span.finish();

        match result {
            Ok(translated) => {
                self.metrics.incr(metric_names::PROVIDER_OK);
                self.store(key, translated.clone());
                Ok(respond(translated, Some(false), None))
            }
            Err(TranslateError::ProviderUnavailable { original, reason }) => {
                self.metrics.incr(metric_names::PROVIDER_ERROR);
                warn!(target_language = %target_lang, error = %reason, "serving original text");
                Ok(respond(original, None, Some(reason)))
            }
            Err(e) => Err(e),
        }
    }

    /// Fresh cached value for `key`, if any. Stale entries read as misses.
    fn lookup(&self, key: &CacheKey) -> Option<String> {
        let now = self.clock.now_millis();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.translated_text.clone())
    }

    fn store(&self, key: CacheKey, translated_text: String) {
        let now = self.clock.now_millis();
        self.insert_entry(key, translated_text, now);
    }

    /// Insert with an explicit write timestamp, then sweep if the store has
    /// grown past the high-water mark.
    pub fn insert_entry(&self, key: CacheKey, translated_text: String, written_at: i64) {
        let size = {
            let mut entries = self.entries.lock();
            entries.insert(
                key,
                CacheEntry {
                    translated_text,
                    written_at,
                },
            );
            entries.len()
        };
        if size > self.config.high_water {
            self.sweep_expired();
        }
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - entries.len();
        if removed > 0 {
            self.metrics.add(metric_names::EVICTED, removed as u64);
            info!(removed, remaining = entries.len(), "server cache sweep");
        }
        removed
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now - entry.written_at > self.config.ttl.as_millis() as i64
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            cache_size: self.len(),
            supported_languages: languages::supported_codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
