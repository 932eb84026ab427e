//! Small shared helpers: email syntax check and opaque token generation.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Loose RFC-style email syntax check: one `@`, a dotted domain, no
/// whitespace. Deliverability is not this crate's problem.
pub fn valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// 256-bit random token, base64url without padding. Used for session
/// identifiers and OAuth state values.
pub fn random_token() -> String {
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(valid_email("a@x.com"));
        assert!(valid_email("first.last@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!valid_email(""));
        assert!(!valid_email("no-at-sign"));
        assert!(!valid_email("two@@x.com"));
        assert!(!valid_email("spaces in@x.com"));
        assert!(!valid_email("nodomain@"));
        assert!(!valid_email("nodot@host"));
    }

    #[test]
    fn tokens_are_unique_and_urlsafe() {
        let a = random_token();
        let b = random_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, b64url, no padding
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
