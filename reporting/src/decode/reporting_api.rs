use super::csp::{REPORTING_CSP_KEYS, read_csp};
use super::deprecation::read_deprecation;
use super::expect_object_array;
use crate::errors::Result;
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::{EnvelopeBody, ReportingEnvelope};
use serde_json::Value;

/// Decodes an `application/reports+json` body: an array of report envelopes.
///
/// Only a non-array body or a non-object element fails the batch. Bad fields
/// inside an envelope are defaulted and warned about per element, with warning
/// paths prefixed by the element index (`[1].body.lineNumber`).
pub fn decode_reporting_api<W: WarningSink + ?Sized>(
    value: &Value,
    warnings: &mut W,
) -> Result<Vec<ReportingEnvelope>> {
    let items = expect_object_array(value, "reporting API body")?;

    let envelopes = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.as_object().map(|obj| (i, obj)))
        .map(|(i, obj)| {
            let mut fields = FieldExtractor::with_path(obj, &format!("[{i}]"), &mut *warnings);
            read_envelope(&mut fields)
        })
        .collect();

    Ok(envelopes)
}

fn read_envelope<W: WarningSink + ?Sized>(
    fields: &mut FieldExtractor<'_, '_, W>,
) -> ReportingEnvelope {
    let r#type = fields.string("type");
    let age = fields.integer("age");
    let url = fields.string("url");
    let user_agent = fields.string("user_agent");

    let mut body = fields.nested("body");
    let body = match r#type.as_str() {
        "csp-violation" => EnvelopeBody::Csp(read_csp(&mut body, &REPORTING_CSP_KEYS)),
        "deprecation" => EnvelopeBody::Deprecation(read_deprecation(&mut body)),
        _ => EnvelopeBody::Other(body.as_map().clone()),
    };

    ReportingEnvelope {
        r#type,
        age,
        url,
        user_agent,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;
    use crate::extract::FieldWarning;
    use serde_json::json;

    fn csp_envelope() -> Value {
        json!({
            "type": "csp-violation",
            "age": 53531,
            "url": "https://example.com/vulnerable-page/",
            "user_agent": "Mozilla/5.0 (X11; Linux x86_64; rv:60.0) Gecko/20100101 Firefox/60.0",
            "body": {
                "blockedURL": "https://evil.example/x.js",
                "disposition": "enforce",
                "documentURL": "https://example.com/vulnerable-page/",
                "effectiveDirective": "script-src-elem",
                "originalPolicy": "script-src 'self'; report-to csp",
                "referrer": "https://www.google.com/",
                "sample": "",
                "sourceFile": "https://example.com/vulnerable-page/",
                "statusCode": 200,
                "lineNumber": 10,
                "columnNumber": 5,
                "violatedDirective": "script-src-elem"
            }
        })
    }

    #[test]
    fn test_decode_csp_envelope() {
        let mut warnings: Vec<FieldWarning> = Vec::new();
        let envelopes = decode_reporting_api(&json!([csp_envelope()]), &mut warnings).unwrap();

        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(envelopes.len(), 1);
        let envelope = &envelopes[0];
        assert_eq!(envelope.r#type, "csp-violation");
        assert_eq!(envelope.age, 53531);
        match &envelope.body {
            EnvelopeBody::Csp(csp) => {
                assert_eq!(csp.blocked_uri, "https://evil.example/x.js");
                assert_eq!(csp.line_number, 10);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_malformed_sub_field_does_not_fail_batch() {
        let mut bad = csp_envelope();
        bad["body"]["lineNumber"] = json!("ten");
        bad["age"] = json!("old");

        let mut warnings: Vec<FieldWarning> = Vec::new();
        let envelopes =
            decode_reporting_api(&json!([csp_envelope(), bad]), &mut warnings).unwrap();

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].age, 0);
        match &envelopes[1].body {
            EnvelopeBody::Csp(csp) => {
                assert_eq!(csp.line_number, 0);
                assert_eq!(csp.column_number, 5);
            }
            other => panic!("unexpected body {other:?}"),
        }

        let paths: Vec<&str> = warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, vec!["[1].age", "[1].body.lineNumber"]);
    }

    #[test]
    fn test_other_types_keep_raw_body() {
        let report = json!({
            "type": "network-error",
            "age": 0,
            "url": "https://example.com/",
            "user_agent": "UA/1.0",
            "body": {"phase": "dns", "type": "dns.name_not_resolved", "elapsed_time": 48}
        });

        let mut warnings: Vec<FieldWarning> = Vec::new();
        let envelopes = decode_reporting_api(&json!([report]), &mut warnings).unwrap();

        match &envelopes[0].body {
            EnvelopeBody::Other(body) => {
                assert_eq!(body["phase"], "dns");
                assert_eq!(body["elapsed_time"], 48);
            }
            other => panic!("unexpected body {other:?}"),
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_deprecation_envelope() {
        let report = json!({
            "type": "deprecation",
            "age": 27,
            "url": "https://example.com/",
            "user_agent": "UA/1.0",
            "body": {"id": "websql", "anticipatedRemoval": "2020-01-01", "message": "gone",
                     "sourceFile": "https://example.com/a.js", "lineNumber": 1, "columnNumber": 2}
        });
        let mut warnings: Vec<FieldWarning> = Vec::new();
        let envelopes = decode_reporting_api(&json!([report]), &mut warnings).unwrap();
        assert!(matches!(&envelopes[0].body, EnvelopeBody::Deprecation(d) if d.id == "websql"));
    }

    #[test]
    fn test_outer_shape_errors() {
        let mut warnings: Vec<FieldWarning> = Vec::new();
        assert!(matches!(
            decode_reporting_api(&csp_envelope(), &mut warnings),
            Err(ParseError::MalformedJson(_))
        ));
        assert!(matches!(
            decode_reporting_api(&json!([csp_envelope(), "text"]), &mut warnings),
            Err(ParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_empty_array() {
        let mut warnings: Vec<FieldWarning> = Vec::new();
        assert!(decode_reporting_api(&json!([]), &mut warnings).unwrap().is_empty());
    }
}
