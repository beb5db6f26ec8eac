//! Selection of the decoder for a request.
//!
//! Report formats are identified by the request's media type. The security
//! report channel is the exception: it is recognized by the shape of the
//! payload, see [`is_security_batch`].

use crate::errors::{ParseError, Result};
use serde_json::Value;

pub const CSP_REPORT: &str = "application/csp-report";
pub const EXPECT_CT_REPORT: &str = "application/expect-ct-report+json";
pub const REPORTS_JSON: &str = "application/reports+json";

/// The closed set of report formats accepted by content-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Legacy single-object CSP report sent to `report-uri`.
    CspReport,
    ExpectCt,
    /// Array of Reporting API envelopes.
    ReportingApi,
}

impl ReportFormat {
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let media = media_type(content_type)?;
        match media.as_str() {
            CSP_REPORT => Ok(ReportFormat::CspReport),
            EXPECT_CT_REPORT => Ok(ReportFormat::ExpectCt),
            REPORTS_JSON => Ok(ReportFormat::ReportingApi),
            _ => Err(ParseError::UnsupportedContentType(media)),
        }
    }

    pub const fn media_type(&self) -> &'static str {
        match self {
            ReportFormat::CspReport => CSP_REPORT,
            ReportFormat::ExpectCt => EXPECT_CT_REPORT,
            ReportFormat::ReportingApi => REPORTS_JSON,
        }
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Extracts the lowercased `type/subtype` of a Content-Type header value,
/// dropping parameters.
pub fn media_type(content_type: &str) -> Result<String> {
    let malformed = |reason| ParseError::MalformedContentType {
        content_type: content_type.to_string(),
        reason,
    };

    let mut parts = content_type.split(';');
    let essence = parts.next().unwrap_or_default().trim();
    if essence.is_empty() {
        return Err(malformed("no media type"));
    }

    let (kind, subtype) = essence
        .split_once('/')
        .ok_or_else(|| malformed("expected slash after first token"))?;
    if !is_token(kind) {
        return Err(malformed("invalid media type"));
    }
    if !is_token(subtype) {
        return Err(malformed("expected token after slash"));
    }

    for param in parts {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        match param.split_once('=') {
            Some((name, _value)) if is_token(name.trim()) => {}
            _ => return Err(malformed("invalid media parameter")),
        }
    }

    Ok(essence.to_ascii_lowercase())
}

/// True if `value` is a non-empty array of objects whose `type` is one of the
/// security report families. Used where no content-type is available.
pub fn is_security_batch(value: &Value) -> bool {
    match value.as_array() {
        Some(items) if !items.is_empty() => items.iter().all(|item| {
            matches!(
                item.get("type").and_then(Value::as_str),
                Some("csp-violation" | "deprecation")
            )
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recognized_content_types() {
        assert_eq!(
            ReportFormat::from_content_type("application/csp-report"),
            Ok(ReportFormat::CspReport)
        );
        assert_eq!(
            ReportFormat::from_content_type("application/expect-ct-report+json; charset=utf-8"),
            Ok(ReportFormat::ExpectCt)
        );
        assert_eq!(
            ReportFormat::from_content_type("Application/Reports+JSON"),
            Ok(ReportFormat::ReportingApi)
        );
    }

    #[test]
    fn test_unsupported_content_types() {
        for ct in [
            "application/json",
            "text/plain",
            "application/csp-report+json",
            "application/reports",
            "multipart/form-data; boundary=x",
        ] {
            assert!(
                matches!(
                    ReportFormat::from_content_type(ct),
                    Err(ParseError::UnsupportedContentType(_))
                ),
                "{ct} must not be accepted"
            );
        }
    }

    #[test]
    fn test_malformed_content_types() {
        for ct in ["", "   ", "application", "application/", "/json", "a b/c", "application/json; charset"] {
            assert!(
                matches!(
                    ReportFormat::from_content_type(ct),
                    Err(ParseError::MalformedContentType { .. })
                ),
                "{ct:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(
            media_type("application/reports+json ; charset=UTF-8").unwrap(),
            "application/reports+json"
        );
    }

    #[test]
    fn test_media_type_roundtrip() {
        for format in [
            ReportFormat::CspReport,
            ReportFormat::ExpectCt,
            ReportFormat::ReportingApi,
        ] {
            assert_eq!(
                ReportFormat::from_content_type(format.media_type()),
                Ok(format)
            );
        }
    }

    #[test]
    fn test_security_batch_detection() {
        assert!(is_security_batch(&json!([
            {"type": "csp-violation", "body": {}},
            {"type": "deprecation", "body": {}}
        ])));
        assert!(!is_security_batch(&json!([])));
        assert!(!is_security_batch(&json!([{"type": "network-error"}])));
        assert!(!is_security_batch(&json!({"type": "csp-violation"})));
    }
}
