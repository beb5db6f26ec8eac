use super::expect_object;
use crate::errors::Result;
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::ExpectCtFailure;
use serde_json::Value;

/// Decodes an `{"expect-ct-report": {...}}` body.
pub fn decode_expect_ct_report<W: WarningSink + ?Sized>(
    value: &Value,
    warnings: &mut W,
) -> Result<ExpectCtFailure> {
    let envelope = expect_object(value, "expect-ct report")?;
    let mut fields = FieldExtractor::new(envelope, warnings);
    let mut report = fields.nested("expect-ct-report");

    Ok(ExpectCtFailure {
        date_time: report.timestamp("date-time"),
        effective_expiration_date: report.timestamp("effective-expiration-date"),
        hostname: report.string("hostname"),
        port: report.integer("port"),
        scts: report.string_list("scts"),
        served_certificate_chain: report.string_list("served-certificate-chain"),
        validated_certificate_chain: report.string_list("validated-certificate-chain"),
    })
}
