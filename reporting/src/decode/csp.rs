use super::expect_object;
use crate::errors::Result;
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::CspViolation;
use serde_json::Value;

/// Key names of a CSP violation body. Browsers use two naming schemes: the
/// legacy `report-uri` format and the Reporting API format.
pub(crate) struct CspKeys {
    document_uri: &'static str,
    referrer: &'static str,
    blocked_uri: &'static str,
    violated_directive: &'static str,
    effective_directive: &'static str,
    original_policy: &'static str,
    source_file: &'static str,
    status_code: &'static str,
    line_number: &'static str,
    column_number: &'static str,
    script_sample: &'static str,
}

/// `application/csp-report`, sent to `report-uri` endpoints.
pub(crate) const LEGACY_CSP_KEYS: CspKeys = CspKeys {
    document_uri: "document-uri",
    referrer: "referrer",
    blocked_uri: "blocked-uri",
    violated_directive: "violated-directive",
    effective_directive: "effective-directive",
    original_policy: "original-policy",
    source_file: "source-file",
    status_code: "status-code",
    line_number: "line-number",
    column_number: "column-number",
    script_sample: "script-sample",
};

/// `csp-violation` bodies delivered through the Reporting API.
pub(crate) const REPORTING_CSP_KEYS: CspKeys = CspKeys {
    document_uri: "documentURL",
    referrer: "referrer",
    blocked_uri: "blockedURL",
    violated_directive: "violatedDirective",
    effective_directive: "effectiveDirective",
    original_policy: "originalPolicy",
    source_file: "sourceFile",
    status_code: "statusCode",
    line_number: "lineNumber",
    column_number: "columnNumber",
    script_sample: "sample",
};

pub(crate) fn read_csp<W: WarningSink + ?Sized>(
    fields: &mut FieldExtractor<'_, '_, W>,
    keys: &CspKeys,
) -> CspViolation {
    CspViolation {
        document_uri: fields.string(keys.document_uri),
        referrer: fields.string(keys.referrer),
        blocked_uri: fields.string(keys.blocked_uri),
        violated_directive: fields.string(keys.violated_directive),
        effective_directive: fields.string(keys.effective_directive),
        original_policy: fields.string(keys.original_policy),
        source_file: fields.string(keys.source_file),
        status_code: fields.integer(keys.status_code),
        line_number: fields.integer(keys.line_number),
        column_number: fields.integer(keys.column_number),
        script_sample: fields.string(keys.script_sample),
    }
}

/// Decodes a legacy `{"csp-report": {...}}` body.
pub fn decode_csp_report<W: WarningSink + ?Sized>(
    value: &Value,
    warnings: &mut W,
) -> Result<CspViolation> {
    let envelope = expect_object(value, "csp report")?;
    let mut fields = FieldExtractor::new(envelope, warnings);
    let mut report = fields.nested("csp-report");

    Ok(read_csp(&mut report, &LEGACY_CSP_KEYS))
}
