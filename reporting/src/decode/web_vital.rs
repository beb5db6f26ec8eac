use super::expect_object;
use crate::errors::Result;
use crate::extract::{FieldExtractor, WarningSink};
use crate::types::WebVital;
use serde_json::Value;

/// Decodes one web-vitals sample as posted by the `web-vitals` library.
pub fn decode_web_vital<W: WarningSink + ?Sized>(
    value: &Value,
    warnings: &mut W,
) -> Result<WebVital> {
    let object = expect_object(value, "web vital")?;
    let mut fields = FieldExtractor::new(object, warnings);

    Ok(WebVital {
        name: fields.string("name"),
        value: fields.number("value"),
        delta: fields.number("delta"),
        id: fields.string("id"),
        label: fields.optional_string("label"),
        entries: fields.opaque_list("entries"),
    })
}
