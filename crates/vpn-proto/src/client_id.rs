use serde::{Deserialize, Serialize};
use std::fmt;

/// A short identifier for a client node, normalized on construction.
///
/// Accepted characters are `[A-Za-z0-9._-]`, length 1-100. Inputs that fail
/// to normalize to a non-empty string collapse to the sentinel `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

const MAX_LEN: usize = 100;

impl ClientId {
    /// Normalize an arbitrary input string into a valid client id.
    ///
    /// Non-matching characters collapse to `-`, the result is lowercased and
    /// trimmed of leading/trailing `-`, truncated to [`MAX_LEN`]. An empty
    /// result after normalization becomes `unknown`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self("unknown".to_string());
        }
        let collapsed: String = trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        let normalized = collapsed.trim_matches('-');
        if normalized.is_empty() {
            Self("unknown".to_string())
        } else {
            Self(normalized.chars().take(MAX_LEN).collect())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == "unknown"
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        assert_eq!(ClientId::parse("office-vpn").as_str(), "office-vpn");
        assert_eq!(ClientId::parse("node_01.eu").as_str(), "node_01.eu");
    }

    #[test]
    fn collapses_invalid_characters() {
        assert_eq!(ClientId::parse("my office!!").as_str(), "my-office");
    }

    #[test]
    fn empty_or_all_invalid_becomes_unknown() {
        assert!(ClientId::parse("").is_unknown());
        assert!(ClientId::parse("   ").is_unknown());
        assert!(ClientId::parse("!!!").is_unknown());
    }

    #[test]
    fn truncates_to_max_length() {
        let long = "a".repeat(150);
        assert_eq!(ClientId::parse(&long).as_str().len(), MAX_LEN);
    }

    #[test]
    fn lowercases_input() {
        assert_eq!(ClientId::parse("Office-VPN").as_str(), "office-vpn");
    }
}
