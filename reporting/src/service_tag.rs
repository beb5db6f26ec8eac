use crate::errors::{ParseError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub const MAX_SERVICE_TAG_LEN: usize = 32;

static SERVICE_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z0-9_-]+$").expect("service tag pattern is a valid regex")
});

/// Identifies the application or site a report was submitted for.
///
/// Non-empty, at most 32 characters, and made only of ASCII letters, digits,
/// `_` and `-`. The only way to obtain one is [`ServiceTag::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceTag(String);

impl ServiceTag {
    pub fn parse(tag: &str) -> Result<Self> {
        let invalid = |reason| ParseError::InvalidServiceTag {
            tag: tag.to_string(),
            reason,
        };

        if tag.is_empty() {
            return Err(invalid("must not be empty"));
        }

        if tag.len() > MAX_SERVICE_TAG_LEN {
            return Err(invalid("must be at most 32 characters"));
        }

        if !SERVICE_TAG_PATTERN.is_match(tag) {
            return Err(invalid("must only contain letters, digits, '_' and '-'"));
        }

        Ok(ServiceTag(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ServiceTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ServiceTag::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tags() {
        for tag in ["reportd", "reportd23", "my_site", "A-b_9", &"x".repeat(32)] {
            assert!(ServiceTag::parse(tag).is_ok(), "{tag:?} should be valid");
        }
    }

    #[test]
    fn test_invalid_tags() {
        for tag in ["", "reportd\n", "report d", "rep/ortd", "répd", &"x".repeat(33)] {
            assert!(
                matches!(
                    ServiceTag::parse(tag),
                    Err(ParseError::InvalidServiceTag { .. })
                ),
                "{tag:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_trailing_hyphen_is_accepted() {
        // The character class allows '-' anywhere, including at the end.
        assert!(ServiceTag::parse("reportd-").is_ok());
    }

    #[test]
    fn test_error_names_the_tag() {
        let err = ServiceTag::parse("reportd\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid service tag \"reportd\\n\": must only contain letters, digits, '_' and '-'"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<ServiceTag>("\"reportd\"").is_ok());
        assert!(serde_json::from_str::<ServiceTag>("\"bad tag\"").is_err());
    }
}
