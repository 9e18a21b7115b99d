//! Domain name normalisation and validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ToolboxError, ToolboxResult};

/// Maximum length of a domain name in presentation format.
const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

#[allow(clippy::unwrap_used)]
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$").unwrap());

/// Strip decorations users paste along with a domain.
///
/// Trims whitespace, removes an `http://` or `https://` prefix, cuts any path
/// or trailing slash, drops trailing dots and lowercases the rest.
pub fn clean_domain(input: &str) -> String {
    let mut domain = input.trim();

    for scheme in ["http://", "https://"] {
        if let Some(rest) = domain
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .and_then(|_| domain.get(scheme.len()..))
        {
            domain = rest;
            break;
        }
    }

    if let Some(idx) = domain.find('/') {
        domain = &domain[..idx];
    }

    domain.trim_end_matches('.').to_ascii_lowercase()
}

/// Check an already cleaned domain against the label grammar and length limits.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    domain
        .split('.')
        .all(|label| label.len() <= MAX_LABEL_LEN && LABEL_RE.is_match(label))
}

/// A validated, normalised host name.
///
/// The only way to obtain one is [`Domain::parse`], so every analyzer can rely
/// on its input having passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Clean and validate user input.
    pub fn parse(input: &str) -> ToolboxResult<Self> {
        let cleaned = clean_domain(input);
        if cleaned.is_empty() {
            return Err(ToolboxError::ValidationError(
                "Domain name is required".to_string(),
            ));
        }
        if cleaned.len() > MAX_DOMAIN_LEN {
            return Err(ToolboxError::ValidationError(format!(
                "Domain name exceeds maximum length of {MAX_DOMAIN_LEN} characters (got {})",
                cleaned.len()
            )));
        }
        if !is_valid_domain(&cleaned) {
            return Err(ToolboxError::ValidationError(format!(
                "Invalid domain name: {}",
                input.trim()
            )));
        }
        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<prefix>.<domain>`, e.g. `_dmarc.example.com`.
    pub fn prefixed(&self, prefix: &str) -> String {
        format!("{prefix}.{}", self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Domain {
    type Error = ToolboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_domain_lowercases_and_strips_dot() {
        assert_eq!(clean_domain("EXAMPLE.com."), "example.com");
    }

    #[test]
    fn test_clean_domain_strips_scheme_and_path() {
        assert_eq!(clean_domain("https://Example.com/path/"), "example.com");
        assert_eq!(clean_domain("HTTP://mail.example.org/"), "mail.example.org");
        assert_eq!(clean_domain("  example.net  "), "example.net");
    }

    #[test]
    fn test_is_valid_domain_rejects_space() {
        assert!(!is_valid_domain("exa mple.com"));
    }

    #[test]
    fn test_is_valid_domain_rejects_empty_label() {
        assert!(!is_valid_domain("example..com"));
        assert!(!is_valid_domain(".example.com"));
    }

    #[test]
    fn test_is_valid_domain_rejects_edge_hyphens() {
        assert!(!is_valid_domain("-example.com"));
        assert!(!is_valid_domain("example-.com"));
        assert!(is_valid_domain("ex-ample.com"));
    }

    #[test]
    fn test_is_valid_domain_length_limits() {
        let long_label = "a".repeat(64);
        assert!(!is_valid_domain(&format!("{long_label}.com")));
        assert!(is_valid_domain(&format!("{}.com", "a".repeat(63))));

        let too_long = format!("{}.com", vec!["a".repeat(60); 5].join("."));
        assert!(too_long.len() > 253);
        assert!(!is_valid_domain(&too_long));
    }

    #[test]
    fn test_domain_parse_normalises() {
        let domain = Domain::parse(" https://Mail.Example.COM./ ").unwrap();
        assert_eq!(domain.as_str(), "mail.example.com");
        assert_eq!(domain.prefixed("_dmarc"), "_dmarc.mail.example.com");
    }

    #[test]
    fn test_domain_parse_empty() {
        assert!(matches!(
            Domain::parse("   "),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn test_domain_parse_invalid() {
        assert!(matches!(
            Domain::parse("not a valid domain!!!"),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn test_domain_deserialize_validates() {
        let ok: Domain = serde_json::from_str("\"Example.com\"").unwrap();
        assert_eq!(ok.as_str(), "example.com");
        assert!(serde_json::from_str::<Domain>("\"bad domain\"").is_err());
    }
}
