use super::csp::{REPORTING_CSP_KEYS, read_csp};
use super::deprecation::read_deprecation;
use super::{expect_object, expect_object_array};
use crate::checksum::checksum;
use crate::errors::{ParseError, Result};
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::{Disposition, ReportExtension, SecurityReport};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decodes a batch of security reports.
///
/// The outer `Result` fails only if the body is not an array of objects. Each
/// element then succeeds or fails on its own.
pub fn decode_security_reports<W: WarningSink + ?Sized>(
    value: &Value,
    received_at: DateTime<Utc>,
    warnings: &mut W,
) -> Result<Vec<Result<SecurityReport>>> {
    let items = expect_object_array(value, "security report body")?;

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_item(item, &format!("[{i}]"), received_at, &mut *warnings))
        .collect())
}

/// Decodes a single Reporting API object into a [`SecurityReport`].
///
/// `type` and `body` are required; the checksum covers the whole object as
/// received. `report_time` is `received_at - age` when `age` is numeric and
/// left unset otherwise. Browser name and version are not filled in here.
pub fn decode_security_report<W: WarningSink + ?Sized>(
    item: &Value,
    received_at: DateTime<Utc>,
    warnings: &mut W,
) -> Result<SecurityReport> {
    decode_item(item, "", received_at, warnings)
}

/// `received_at - age` in milliseconds, or `None` when the age does not fit.
fn report_time_from_age(received_at: DateTime<Utc>, age: f64) -> Option<i64> {
    if !age.is_finite() || age.abs() >= i64::MAX as f64 {
        return None;
    }
    received_at.timestamp_millis().checked_sub(age as i64)
}

fn decode_item<W: WarningSink + ?Sized>(
    item: &Value,
    path: &str,
    received_at: DateTime<Utc>,
    warnings: &mut W,
) -> Result<SecurityReport> {
    let object = expect_object(item, "security report")?;
    let report_checksum = checksum(item);

    let report_type = match object.get("type") {
        Some(Value::String(t)) => t.as_str(),
        _ => return Err(ParseError::MissingRequiredField("type")),
    };
    if !matches!(object.get("body"), Some(Value::Object(_))) {
        return Err(ParseError::MissingRequiredField("body"));
    }

    let mut fields = FieldExtractor::with_path(object, path, warnings);
    // The report itself carries no timestamp, only its age at delivery.
    let report_time = fields
        .optional_number("age")
        .and_then(|age| report_time_from_age(received_at, age));
    let user_agent = fields.optional_string("user_agent").unwrap_or_default();

    let mut body = fields.nested("body");
    let (extension, disposition) = match report_type {
        "csp-violation" => {
            let disposition =
                Disposition::from_report_value(body.get("disposition").and_then(Value::as_str));
            let csp = read_csp(&mut body, &REPORTING_CSP_KEYS);
            (ReportExtension::CspReport(csp), disposition)
        }
        "deprecation" => (
            ReportExtension::DeprecationReport(read_deprecation(&mut body)),
            Disposition::Unknown,
        ),
        other => return Err(ParseError::UnknownReportType(other.to_string())),
    };

    let mut report = SecurityReport::new(report_checksum, extension);
    report.report_time = report_time;
    report.user_agent = user_agent;
    report.disposition = disposition;

    Ok(report)
}
