//! Client-side translation cache.
//!
//! One `ClientCacheManager` per session. It keeps every translation it has
//! seen in memory (keyed by language, so switching language is free),
//! hydrates from a persisted snapshot at startup, and coalesces concurrent
//! requests for the same text into one network call: while a request for a
//! key is in flight, every caller for that key gets the same shared future.
//!
//! Failures never surface as errors here. A failed request resolves to
//! `Translation::Degraded` carrying the original text, and is not cached.

pub mod backend;
pub mod batch;
pub mod snapshot;
pub mod storage;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::languages::{Language, DEFAULT_SOURCE};
use crate::scheduler::{Debouncer, Scheduler};
use crate::translate::{CacheKey, TranslateError, Translation};
use backend::TranslateBackend;
use storage::Storage;

pub const DEFAULT_STORAGE_KEY: &str = "medtour-translation-cache";
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_secs(2);
pub const DEFAULT_SNAPSHOT_CAP: usize = 500;
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub source_language: String,
    /// Target language active right after `init`.
    pub initial_language: String,
    pub persist_debounce: Duration,
    pub snapshot_cap: usize,
    pub batch_size: usize,
    pub storage_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            source_language: DEFAULT_SOURCE.to_string(),
            initial_language: DEFAULT_SOURCE.to_string(),
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
            snapshot_cap: DEFAULT_SNAPSHOT_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

type PendingTranslation = Shared<BoxFuture<'static, Translation>>;

struct PendingRequest {
    id: u64,
    future: PendingTranslation,
}

struct State {
    language: String,
    /// Insertion-ordered; `peek` for reads so order stays "last written".
    cache: LruCache<CacheKey, String>,
    pending: HashMap<CacheKey, PendingRequest>,
    /// Bumped by `clear_cache`; requests started before a clear don't write back.
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub language: String,
    pub cached: usize,
    pub pending: usize,
    pub network_requests: u64,
}

pub struct ClientCacheManager {
    me: Weak<ClientCacheManager>,
    config: ClientConfig,
    state: Mutex<State>,
    backend: Arc<dyn TranslateBackend>,
    storage: Arc<dyn Storage>,
    persist: Debouncer,
    /// Held across snapshot encode+write and across clear+delete, so a flush
    /// that already read the cache can't write it back after a clear.
    persist_io: Mutex<()>,
    /// Runtime that drives requests in the background. Captured at `init`.
    runtime: Option<tokio::runtime::Handle>,
    next_request_id: AtomicU64,
    network_requests: AtomicU64,
}

impl ClientCacheManager {
    /// Build a manager and hydrate it from the persisted snapshot, if any.
    /// A missing or corrupt snapshot just means an empty cache. An unknown
    /// `initial_language` falls back to the source language.
    ///
    /// When called inside a tokio runtime, that runtime drives cache misses
    /// in the background.
    pub fn init(
        config: ClientConfig,
        backend: Arc<dyn TranslateBackend>,
        storage: Arc<dyn Storage>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        let language = match Language::from_code(&config.initial_language) {
            Some(lang) => lang.code().to_string(),
            None => {
                warn!(
                    language = %config.initial_language,
                    fallback = %config.source_language,
                    "unsupported initial language"
                );
                config.source_language.clone()
            }
        };
        let manager = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            persist: Debouncer::new(scheduler, config.persist_debounce),
            persist_io: Mutex::new(()),
            runtime: tokio::runtime::Handle::try_current().ok(),
            state: Mutex::new(State {
                language,
                cache: LruCache::unbounded(),
                pending: HashMap::new(),
                epoch: 0,
            }),
            config,
            backend,
            storage,
            next_request_id: AtomicU64::new(0),
            network_requests: AtomicU64::new(0),
        });
        manager.hydrate();
        manager
    }

    fn hydrate(&self) {
        let raw = match self.storage.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "snapshot read failed, starting with empty cache");
                return;
            }
        };
        match snapshot::decode(&raw) {
            Ok(entries) => {
                let mut state = self.state.lock();
                let count = entries.len();
                for (key, text) in entries {
                    state.cache.put(key, text);
                }
                info!(entries = count, "client cache hydrated from snapshot");
            }
            Err(e) => warn!(error = %e, "ignoring corrupt snapshot"),
        }
    }

    /// Cancel the pending persist and write the snapshot one last time.
    pub fn dispose(&self) {
        self.persist.cancel();
        self.flush();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn language(&self) -> String {
        self.state.lock().language.clone()
    }

    /// Switch the active target language. The cache is keyed by language and
    /// is left untouched.
    pub fn set_language(&self, code: &str) -> Result<(), TranslateError> {
        let lang =
            Language::from_code(code).ok_or_else(|| TranslateError::InvalidLanguage(code.into()))?;
        let mut state = self.state.lock();
        if state.language != lang.code() {
            debug!(from = %state.language, to = lang.code(), "target language changed");
            state.language = lang.code().to_string();
        }
        Ok(())
    }

    fn passthrough(&self, language: &str, text: &str) -> bool {
        language == self.config.source_language || text.trim().is_empty()
    }

    /// Cached translation for `text` in the active language, or `text`
    /// itself. Never does I/O.
    pub fn translate_sync(&self, text: &str) -> String {
        self.lookup(text).unwrap_or_else(|| text.to_string())
    }

    /// Synchronous answer if one exists: the text itself when no translation
    /// is needed, or the cached translation.
    pub(crate) fn lookup(&self, text: &str) -> Option<String> {
        let state = self.state.lock();
        if self.passthrough(&state.language, text) {
            return Some(text.to_string());
        }
        let key = CacheKey::new(&self.config.source_language, &state.language, text);
        state.cache.peek(&key).cloned()
    }

    /// Translate `text` into the active language.
    ///
    /// The returned future is ready immediately for passthrough text and
    /// cache hits. Otherwise it joins the in-flight request for the same key,
    /// or starts one. The request is registered before this function
    /// returns. With a runtime available (captured at `init`, or the caller's)
    /// it runs to completion even if the future is dropped; otherwise it runs
    /// when the returned future is polled.
    pub fn translate(&self, text: &str) -> BoxFuture<'static, Translation> {
        let mut state = self.state.lock();
        if self.passthrough(&state.language, text) {
            return future::ready(Translation::Translated(text.to_string())).boxed();
        }

        let key = CacheKey::new(&self.config.source_language, &state.language, text);
        if let Some(hit) = state.cache.peek(&key) {
            return future::ready(Translation::Translated(hit.clone())).boxed();
        }
        if let Some(pending) = state.pending.get(&key) {
            debug!(%key, "joining in-flight translation");
            return pending.future.clone().boxed();
        }

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let epoch = state.epoch;
        let shared = self.request(key.clone(), id, epoch);
        state.pending.insert(
            key,
            PendingRequest {
                id,
                future: shared.clone(),
            },
        );
        drop(state);

        match self
            .runtime
            .clone()
            .or_else(|| tokio::runtime::Handle::try_current().ok())
        {
            Some(runtime) => {
                runtime.spawn(shared.clone());
            }
            None => debug!("no runtime, request runs when awaited"),
        }
        shared.boxed()
    }

    /// Convenience: the text to display, translated or original.
    pub async fn translate_text(&self, text: &str) -> String {
        self.translate(text).await.into_text()
    }

    fn request(&self, key: CacheKey, id: u64, epoch: u64) -> PendingTranslation {
        let backend = Arc::clone(&self.backend);
        let me = self.me.clone();
        self.network_requests.fetch_add(1, Ordering::Relaxed);

        async move {
            let outcome = match backend
                .translate(key.text(), key.source(), key.target())
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => Translation::Degraded {
                    original: key.text().to_string(),
                    reason: e.to_string(),
                },
            };
            if let Some(manager) = me.upgrade() {
                manager.settle(&key, id, epoch, &outcome);
            }
            outcome
        }
        .boxed()
        .shared()
    }

    /// Runs once per network request, success or failure.
    fn settle(&self, key: &CacheKey, id: u64, epoch: u64, outcome: &Translation) {
        let wrote = {
            let mut state = self.state.lock();
            if state.pending.get(key).is_some_and(|p| p.id == id) {
                state.pending.remove(key);
            }
            match outcome {
                Translation::Translated(text) if state.epoch == epoch => {
                    state.cache.put(key.clone(), text.clone());
                    true
                }
                _ => false,
            }
        };

        match outcome {
            Translation::Degraded { reason, .. } => {
                warn!(%key, error = %reason, "translation degraded to original text");
            }
            Translation::Translated(_) if wrote => self.schedule_persist(),
            Translation::Translated(_) => {}
        }
    }

    /// Translate many texts, keeping order. See [`batch::translate_all`].
    pub async fn batch_translate(&self, texts: &[String]) -> Vec<String> {
        batch::translate_all(self, texts, self.config.batch_size).await
    }

    /// Forget everything: memory, in-flight registry, and the snapshot.
    pub fn clear_cache(&self) {
        let _io = self.persist_io.lock();
        {
            let mut state = self.state.lock();
            state.cache.clear();
            state.pending.clear();
            state.epoch += 1;
        }
        self.persist.cancel();
        if let Err(e) = self.storage.remove(&self.config.storage_key) {
            warn!(error = %e, "failed to delete persisted snapshot");
        }
        info!("client translation cache cleared");
    }

    fn schedule_persist(&self) {
        let me = self.me.clone();
        self.persist.trigger(Box::new(move || {
            if let Some(manager) = me.upgrade() {
                manager.flush();
            }
        }));
    }

    /// Write the snapshot now. Failures are logged and swallowed.
    pub fn flush(&self) {
        let _io = self.persist_io.lock();
        let encoded = {
            let state = self.state.lock();
            snapshot::encode(state.cache.iter().rev(), self.config.snapshot_cap)
        };
        let raw = match encoded {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "snapshot encode failed");
                return;
            }
        };
        match self.storage.set(&self.config.storage_key, &raw) {
            Ok(()) => debug!(bytes = raw.len(), "snapshot persisted"),
            Err(e) => warn!(error = %e, "snapshot persist failed, continuing in memory"),
        }
    }

    pub fn stats(&self) -> ClientStats {
        let state = self.state.lock();
        ClientStats {
            language: state.language.clone(),
            cached: state.cache.len(),
            pending: state.pending.len(),
            network_requests: self.network_requests.load(Ordering::Relaxed),
        }
    }
}
