//! Batch translation with bounded concurrency.
//! Cache hits are answered synchronously; misses go out in groups of
//! `group_size`, one group at a time. Output order always matches input.

use futures_util::future::join_all;
use tracing::debug;

use super::ClientCacheManager;

pub async fn translate_all(
    manager: &ClientCacheManager,
    texts: &[String],
    group_size: usize,
) -> Vec<String> {
    let mut results = Vec::with_capacity(texts.len());
    let mut misses: Vec<(usize, &str)> = Vec::new();

    for (idx, text) in texts.iter().enumerate() {
        match manager.lookup(text) {
            Some(hit) => results.push(hit),
            None => {
                results.push(text.clone());
                misses.push((idx, text.as_str()));
            }
        }
    }

    if misses.is_empty() {
        return results;
    }
    debug!(
        total = texts.len(),
        misses = misses.len(),
        group_size,
        "batch translate"
    );

    for group in misses.chunks(group_size.max(1)) {
        let outcomes = join_all(group.iter().map(|(_, text)| manager.translate(text))).await;
        for ((idx, _), outcome) in group.iter().zip(outcomes) {
            results[*idx] = outcome.into_text();
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::backend::TranslateBackend;
    use crate::client::storage::MemoryStorage;
    use crate::client::ClientConfig;
    use crate::scheduler::ManualScheduler;
    use crate::translate::{TranslateError, Translation};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Tracks how many requests are in flight at once and per-text call counts.
    #[derive(Default)]
    struct ConcurrencyProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<HashMap<String, usize>>,
    }

    #[async_trait]
    impl TranslateBackend for ConcurrencyProbe {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            target: &str,
        ) -> Result<Translation, TranslateError> {
            *self.calls.lock().entry(text.to_string()).or_insert(0) += 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // later texts finish first to scramble completion order
            let delay = 50 - (text.len() as u64 % 50);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Translation::Translated(format!("{target}:{text}")))
        }
    }

    /// Holds the first group open until released. For every call, records how
    /// many earlier calls had finished when it started.
    #[derive(Default)]
    struct GroupRecorder {
        started: AtomicUsize,
        finished: AtomicUsize,
        finished_at_start: Mutex<Vec<usize>>,
        release_first_group: Notify,
    }

    #[async_trait]
    impl TranslateBackend for GroupRecorder {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            target: &str,
        ) -> Result<Translation, TranslateError> {
            let idx = self.started.fetch_add(1, Ordering::SeqCst);
            self.finished_at_start
                .lock()
                .push(self.finished.load(Ordering::SeqCst));
            if idx < 5 {
                self.release_first_group.notified().await;
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Translation::Translated(format!("{target}:{text}")))
        }
    }

    fn manager(backend: Arc<dyn TranslateBackend>) -> Arc<ClientCacheManager> {
        ClientCacheManager::init(
            ClientConfig {
                initial_language: "es".into(),
                ..ClientConfig::default()
            },
            backend,
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualScheduler::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn preserves_order_and_bounds_concurrency() {
        let probe = Arc::new(ConcurrencyProbe::default());
        let manager = manager(probe.clone());
        let texts: Vec<String> = (0..12).map(|i| "x".repeat(i + 1)).collect();

        let out = manager.batch_translate(&texts).await;

        let expected: Vec<String> = texts.iter().map(|t| format!("es:{t}")).collect();
        assert_eq!(out, expected);
        assert!(probe.peak.load(Ordering::SeqCst) <= 5);
        assert!(probe.calls.lock().values().all(|&n| n == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn cached_entries_skip_the_network() {
        let probe = Arc::new(ConcurrencyProbe::default());
        let manager = manager(probe.clone());
        manager.translate("Hospital").await;
        manager.translate("Visa").await;

        let texts: Vec<String> = ["Hospital", "Doctor", "Visa", "Doctor", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = manager.batch_translate(&texts).await;

        assert_eq!(out, ["es:Hospital", "es:Doctor", "es:Visa", "es:Doctor", ""]);
        let calls = probe.calls.lock();
        assert_eq!(calls["Hospital"], 1);
        assert_eq!(calls["Visa"], 1);
        assert_eq!(calls["Doctor"], 1, "duplicate misses share one request");
        assert!(!calls.contains_key(""));
    }

    #[tokio::test]
    async fn all_hits_return_without_awaiting() {
        let probe = Arc::new(ConcurrencyProbe::default());
        let manager = manager(probe.clone());
        manager.set_language("en").unwrap();
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(manager.batch_translate(&texts).await, texts);
        assert!(probe.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn next_group_waits_for_the_whole_previous_group() {
        let recorder = Arc::new(GroupRecorder::default());
        let manager = manager(recorder.clone());
        let texts: Vec<String> = (0..12).map(|i| format!("term {i}")).collect();

        let batch = tokio::spawn({
            let manager = manager.clone();
            let texts = texts.clone();
            async move { manager.batch_translate(&texts).await }
        });
        while recorder.started.load(Ordering::SeqCst) < 5 {
            tokio::task::yield_now().await;
        }

        // one slot frees up; a sliding window would start the 6th request now
        recorder.release_first_group.notify_one();
        while recorder.finished.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(recorder.started.load(Ordering::SeqCst), 5);

        recorder.release_first_group.notify_waiters();
        let out = batch.await.unwrap();

        let expected: Vec<String> = texts.iter().map(|t| format!("es:{t}")).collect();
        assert_eq!(out, expected);
        let seen = recorder.finished_at_start.lock().clone();
        assert_eq!(seen.len(), 12);
        assert!(seen[..5].iter().all(|&n| n == 0));
        assert!(seen[5..10].iter().all(|&n| n >= 5));
        assert!(seen[10..].iter().all(|&n| n >= 10));
    }
}
