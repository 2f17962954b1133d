//! Supported language vocabulary.
//! Site language codes are the short ISO 639-1 forms; the provider expects its
//! own codes, which only differ for Chinese (region-qualified).

/// Source language assumed when a request does not name one.
pub const DEFAULT_SOURCE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
    Tamil,
    Malayalam,
    Telugu,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
    Japanese,
    Chinese,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Malayalam,
        Language::Telugu,
        Language::French,
        Language::German,
        Language::Spanish,
        Language::Italian,
        Language::Portuguese,
        Language::Japanese,
        Language::Chinese,
    ];

    /// Parse a site language code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }

    /// Code used by the site and in cache keys.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Malayalam => "ml",
            Language::Telugu => "te",
            Language::French => "fr",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
        }
    }

    /// Code understood by the translation provider.
    pub fn provider_code(self) -> &'static str {
        match self {
            Language::Chinese => "zh-CN",
            other => other.code(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// All supported site codes, in display order.
pub fn supported_codes() -> Vec<&'static str> {
    Language::ALL.iter().map(|lang| lang.code()).collect()
}
