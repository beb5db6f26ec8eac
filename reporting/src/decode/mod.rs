//! One decoder per report family.
//!
//! Decoders only fail on the outer shape of the JSON (object expected, array
//! expected). Leaf fields go through [`FieldExtractor`](crate::extract::FieldExtractor)
//! and degrade to zero values with a warning.

mod csp;
mod deprecation;
mod expect_ct;
mod reporting_api;
mod security;
mod web_vital;

pub use csp::decode_csp_report;
pub use deprecation::decode_deprecation;
pub use expect_ct::decode_expect_ct_report;
pub use reporting_api::decode_reporting_api;
pub use security::{decode_security_report, decode_security_reports};
pub use web_vital::decode_web_vital;

use crate::errors::{ParseError, Result};
use serde_json::{Map, Value};

fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ParseError::MalformedJson(format!("{what} must be a JSON object")))
}

/// Checks that `value` is an array of objects and returns the elements.
fn expect_object_array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value]> {
    let items = value
        .as_array()
        .ok_or_else(|| ParseError::MalformedJson(format!("{what} must be a JSON array")))?;

    if let Some(index) = items.iter().position(|item| !item.is_object()) {
        return Err(ParseError::MalformedJson(format!(
            "{what}: element {index} must be a JSON object"
        )));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_object_array() {
        assert_eq!(
            expect_object_array(&json!([{}, {"a": 1}]), "reports")
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            expect_object_array(&json!({}), "reports").unwrap_err(),
            ParseError::MalformedJson("reports must be a JSON array".into())
        );
        assert_eq!(
            expect_object_array(&json!([{}, 3]), "reports").unwrap_err(),
            ParseError::MalformedJson("reports: element 1 must be a JSON object".into())
        );
    }
}
