//! Decoding, validation and normalization of browser-submitted reports.
//!
//! Every entry point is a synchronous, stateless transformation of one request
//! body into zero or more [`NormalizedRecord`]s:
//!
//! ```text
//! content-type + body + service tag
//!   -> dispatch (content_type) -> decode (decode, extract, checksum)
//!   -> validate -> annotate -> NormalizedRecord
//! ```
//!
//! Optional fields that are missing or mistyped never fail a request. They
//! are defaulted and reported to the caller's [`WarningSink`].

pub mod annotate;
pub mod checksum;
pub mod content_type;
pub mod decode;
pub mod errors;
pub mod extract;
pub mod service_tag;
pub mod sink;
pub mod types;
pub mod user_agent;
pub mod validate;

pub use content_type::ReportFormat;
pub use errors::{ParseError, Result};
pub use extract::{FieldWarning, LogWarnings, WarningSink};
pub use service_tag::ServiceTag;
pub use sink::{ReportSink, SinkError, SummaryRow, TimeWindow};
pub use types::{NormalizedRecord, Report, SecurityReport};
pub use user_agent::{BrowserDetector, ProductTokenDetector};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Parses a report request into normalized records.
///
/// The service tag is checked before anything else. Single-object formats
/// produce one record, `application/reports+json` one record per envelope.
pub fn parse<W: WarningSink + ?Sized>(
    content_type: &str,
    body: &[u8],
    service: &str,
    warnings: &mut W,
) -> Result<Vec<NormalizedRecord>> {
    parse_at(content_type, body, service, Utc::now(), warnings)
}

pub fn parse_at<W: WarningSink + ?Sized>(
    content_type: &str,
    body: &[u8],
    service: &str,
    now: DateTime<Utc>,
    warnings: &mut W,
) -> Result<Vec<NormalizedRecord>> {
    let service = ServiceTag::parse(service)?;
    let format = ReportFormat::from_content_type(content_type)?;
    let value: Value = serde_json::from_slice(body)?;

    let reports = match format {
        ReportFormat::CspReport => vec![Report::Csp(decode::decode_csp_report(&value, warnings)?)],
        ReportFormat::ExpectCt => vec![Report::ExpectCt(decode::decode_expect_ct_report(
            &value, warnings,
        )?)],
        ReportFormat::ReportingApi => decode::decode_reporting_api(&value, warnings)?
            .into_iter()
            .map(Report::ReportingApi)
            .collect(),
    };

    reports
        .into_iter()
        .map(|report| {
            validate::validate(&report)?;
            Ok(annotate::annotate(report, &service, now))
        })
        .collect()
}

/// Parses one web-vitals sample for `service`.
pub fn parse_analytics<W: WarningSink + ?Sized>(
    body: &[u8],
    service: &str,
    warnings: &mut W,
) -> Result<NormalizedRecord> {
    let service = ServiceTag::parse(service)?;
    let value: Value = serde_json::from_slice(body)?;
    let report = Report::WebVital(decode::decode_web_vital(&value, warnings)?);

    validate::validate(&report)?;
    Ok(annotate::annotate(report, &service, Utc::now()))
}

/// An item of a security report batch that was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Position of the item in the submitted array
    pub index: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: ParseError,
}

fn serialize_error<S: serde::Serializer>(
    error: &ParseError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of [`parse_security_reports`]: items are accepted or rejected
/// independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityBatch {
    pub accepted: Vec<SecurityReport>,
    pub rejected: Vec<Rejection>,
}

/// Parses a batch of security reports, filling in browser details with
/// `detector` and validating every item.
///
/// Fails as a whole only if the body is not a JSON array of objects.
pub fn parse_security_reports<W: WarningSink + ?Sized>(
    body: &[u8],
    detector: &dyn BrowserDetector,
    warnings: &mut W,
) -> Result<SecurityBatch> {
    parse_security_reports_at(body, detector, Utc::now(), warnings)
}

pub fn parse_security_reports_at<W: WarningSink + ?Sized>(
    body: &[u8],
    detector: &dyn BrowserDetector,
    received_at: DateTime<Utc>,
    warnings: &mut W,
) -> Result<SecurityBatch> {
    let value: Value = serde_json::from_slice(body)?;
    let results = decode::decode_security_reports(&value, received_at, warnings)?;

    let mut batch = SecurityBatch::default();
    for (index, result) in results.into_iter().enumerate() {
        let outcome = result.and_then(|mut report| {
            if let Some(browser) = detector.detect(&report.user_agent) {
                report.browser_name = browser.name;
                report.browser_major_version = browser.major_version;
            }
            validate::validate_security_report(&report).map(|()| report)
        });

        match outcome {
            Ok(report) => batch.accepted.push(report),
            Err(error) => {
                tracing::debug!(index, %error, "security report rejected");
                batch.rejected.push(Rejection { index, error });
            }
        }
    }

    Ok(batch)
}
