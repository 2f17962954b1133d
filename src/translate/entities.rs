//! HTML entity decoding for provider output.
//! The provider returns HTML-escaped text; we decode the common named
//! entities plus numeric references in one pass. Anything unrecognised is
//! left exactly as written.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("entity pattern")
});

/// Decode entities in `text`. Single pass: `&amp;lt;` becomes `&lt;`, not `<`.
pub fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures| {
        let whole = &caps[0];
        match resolve(&caps[1]) {
            Some(c) => c.to_string(),
            None => whole.to_string(),
        }
    })
}

fn resolve(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        // rendered inline with ordinary text, so a plain space
        "nbsp" => ' ',
        _ => return None,
    };
    Some(c)
}
