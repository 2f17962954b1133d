//! Persisted snapshot of the client cache: a flat JSON object
//! `{"en:fr:Hello": "Bonjour", ...}` written oldest first, capped to the most
//! recent entries.

use serde_json::{Map, Value};
use tracing::debug;

use crate::translate::CacheKey;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

/// Serialize the newest `cap` entries. `entries` must be ordered oldest
/// first; the output keeps that order.
pub fn encode<'a, I>(entries: I, cap: usize) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = (&'a CacheKey, &'a String)>,
    I::IntoIter: ExactSizeIterator,
{
    let entries = entries.into_iter();
    let skip = entries.len().saturating_sub(cap);
    let map: Map<String, Value> = entries
        .skip(skip)
        .map(|(key, text)| (key.to_string(), Value::String(text.clone())))
        .collect();
    serde_json::to_string(&map)
}

/// Parse a snapshot back into `(key, translation)` pairs, oldest first.
/// Entries with malformed keys or non-string values are dropped.
pub fn decode(raw: &str) -> Result<Vec<(CacheKey, String)>, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(SnapshotError::NotAnObject);
    };
    let total = map.len();
    let entries: Vec<_> = map
        .into_iter()
        .filter_map(|(raw_key, value)| match value {
            Value::String(text) => CacheKey::parse(&raw_key).map(|key| (key, text)),
            _ => None,
        })
        .collect();
    if entries.len() < total {
        debug!(dropped = total - entries.len(), "ignored malformed snapshot entries");
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<(CacheKey, String)> {
        (0..n)
            .map(|i| (CacheKey::new("en", "fr", &format!("t{i}")), format!("f{i}")))
            .collect()
    }

    #[test]
    fn keeps_most_recent_entries_in_order() {
        let all = entries(7);
        let raw = encode(all.iter().map(|(k, v)| (k, v)), 3).unwrap();
        let decoded = decode(&raw).unwrap();
        let texts: Vec<_> = decoded.iter().map(|(k, _)| k.text().to_string()).collect();
        assert_eq!(texts, ["t4", "t5", "t6"]);
        assert_eq!(decoded[2].1, "f6");
    }

    #[test]
    fn rejects_corrupt_snapshots() {
        assert!(matches!(decode("{not json"), Err(SnapshotError::Parse(_))));
        assert!(matches!(decode("[1,2]"), Err(SnapshotError::NotAnObject)));
    }

    #[test]
    fn skips_malformed_entries() {
        let decoded = decode(r#"{"en:fr:ok":"bien","nokey":"x","en:de:n":5}"#).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, CacheKey::new("en", "fr", "ok"));
    }
}
