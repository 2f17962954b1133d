//! Cache key for one translation unit.
//! Serialized as `source:target:text`; language codes never contain `:`, so
//! the first two separators are unambiguous even when the text has colons.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: String,
    target: String,
    text: String,
}

impl CacheKey {
    pub fn new(source: &str, target: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            text: text.to_string(),
        }
    }

    /// Parse the delimited form written by `Display`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let source = parts.next().filter(|s| !s.is_empty())?;
        let target = parts.next().filter(|s| !s.is_empty())?;
        let text = parts.next()?;
        Some(Self::new(source, target, text))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.target, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_with_colons_survives_parse() {
        let key = CacheKey::new("en", "fr", "Timing: 9:00 - 17:00");
        let parsed = CacheKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.text(), "Timing: 9:00 - 17:00");
    }

    #[test]
    fn rejects_keys_without_languages() {
        assert_eq!(CacheKey::parse("hello"), None);
        assert_eq!(CacheKey::parse(":fr:hello"), None);
        assert_eq!(CacheKey::parse("en::hello"), None);
    }

    #[test]
    fn keys_differ_by_target_language() {
        assert_ne!(
            CacheKey::new("en", "fr", "Hospital"),
            CacheKey::new("en", "de", "Hospital")
        );
    }
}
