use std::collections::HashSet;
use std::sync::Arc;

use medtour_i18n::client::snapshot;
use medtour_i18n::client::storage::MemoryStorage;
use medtour_i18n::client::{ClientCacheManager, ClientConfig};
use medtour_i18n::scheduler::ManualScheduler;
use medtour_i18n::translate::{entities, CacheKey};
use proptest::prelude::*;

proptest! {
    #[test]
    fn text_without_ampersand_is_untouched(text in "[^&]{0,64}") {
        prop_assert_eq!(entities::decode(&text), text.as_str());
    }

    #[test]
    fn escaped_markup_decodes_back(text in "[a-z<>\"' ]{0,40}") {
        let escaped = text
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;");
        prop_assert_eq!(entities::decode(&escaped), text.as_str());
    }

    #[test]
    fn snapshot_never_exceeds_cap(n in 0usize..120, cap in 1usize..60) {
        let entries: Vec<(CacheKey, String)> = (0..n)
            .map(|i| (CacheKey::new("en", "de", &format!("text {i}")), format!("Text {i}")))
            .collect();
        let raw = snapshot::encode(entries.iter().map(|(k, v)| (k, v)), cap).unwrap();
        let decoded = snapshot::decode(&raw).unwrap();

        prop_assert_eq!(decoded.len(), n.min(cap));
        let expected = &entries[n.saturating_sub(cap)..];
        prop_assert_eq!(decoded.as_slice(), expected);
    }

    #[test]
    fn same_language_translation_is_identity(text in "\\PC{1,40}") {
        let manager = ClientCacheManager::init(
            ClientConfig::default(),
            Arc::new(NeverBackend),
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualScheduler::new()),
        );
        prop_assert_eq!(manager.translate_sync(&text), text.clone());
        let out = futures_util::FutureExt::now_or_never(manager.translate(&text));
        prop_assert_eq!(out.map(|t| t.into_text()), Some(text));
    }

    #[test]
    fn distinct_keys_stay_distinct(texts in prop::collection::vec("[a-z:]{1,12}", 1..20)) {
        let keys: HashSet<String> = texts
            .iter()
            .map(|t| CacheKey::new("en", "fr", t).to_string())
            .collect();
        let unique: HashSet<&String> = texts.iter().collect();
        prop_assert_eq!(keys.len(), unique.len());
    }
}

/// Backend that must never be reached.
struct NeverBackend;

#[async_trait::async_trait]
impl medtour_i18n::client::backend::TranslateBackend for NeverBackend {
    async fn translate(
        &self,
        _text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<medtour_i18n::translate::Translation, medtour_i18n::translate::TranslateError> {
        panic!("same-language translation must not touch the network")
    }
}
