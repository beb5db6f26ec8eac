use super::expect_object;
use crate::errors::Result;
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::DeprecationNotice;
use chrono::DateTime;
use serde_json::Value;

pub(crate) fn read_deprecation<W: WarningSink + ?Sized>(
    fields: &mut FieldExtractor<'_, '_, W>,
) -> DeprecationNotice {
    DeprecationNotice {
        id: fields.string("id"),
        anticipated_removal: read_anticipated_removal(fields),
        message: fields.string("message"),
        source_file: fields.string("sourceFile"),
        line_number: fields.integer("lineNumber"),
        column_number: fields.integer("columnNumber"),
    }
}

/// Current browsers send a `YYYY-MM-DD` string; older Chrome versions sent
/// milliseconds since the epoch. Both end up as a date string.
fn read_anticipated_removal<W: WarningSink + ?Sized>(
    fields: &mut FieldExtractor<'_, '_, W>,
) -> String {
    let value = fields.get("anticipatedRemoval");
    let millis = match value {
        Some(Value::Number(n)) => n.as_f64(),
        _ => return fields.string("anticipatedRemoval"),
    };

    let date = millis
        .filter(|ms| ms.is_finite())
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .map(|dt| dt.format("%Y-%m-%d").to_string());

    date.unwrap_or_else(|| {
        fields.warn("anticipatedRemoval", "timestamp", value);
        String::new()
    })
}

/// Decodes a Reporting API `deprecation` body.
pub fn decode_deprecation<W: WarningSink + ?Sized>(
    value: &Value,
    warnings: &mut W,
) -> Result<DeprecationNotice> {
    let body = expect_object(value, "deprecation report body")?;
    let mut fields = FieldExtractor::new(body, warnings);

    Ok(read_deprecation(&mut fields))
}
