//! Deduplication checksums for security reports.
//!
//! A report is canonicalized before hashing so that two submissions carrying
//! the same content produce the same key regardless of how the sender (or the
//! JSON map implementation) ordered the object fields:
//!
//! - object keys are sorted by their UTF-8 bytes, at every nesting level
//! - no whitespace is emitted between tokens
//! - strings use JSON escaping, numbers use serde_json's shortest form
//!
//! The digest is SHA-256, rendered as 64 lowercase hex characters. It is a
//! dedup key only, not an integrity guarantee.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serializes `value` into its canonical byte form.
pub fn canonicalize(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_canonical(item, out);
            }
            out.push(b'}');
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    // Writing a str into a Vec cannot fail.
    let _ = serde_json::to_writer(&mut *out, s);
}

/// Hex-encoded SHA-256 of arbitrary bytes.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Checksum of a decoded report body.
pub fn checksum(value: &Value) -> String {
    digest(&canonicalize(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_is_deterministic() {
        let bytes = br#"{"age":10,"type":"csp-violation"}"#;
        let first = digest(bytes);
        for _ in 0..10 {
            assert_eq!(digest(bytes), first);
        }
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_digest() {
        // Fixed vector so a change in canonical form or hash is caught across releases.
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_order_does_not_change_checksum() {
        let a: Value =
            serde_json::from_str(r#"{"type":"deprecation","body":{"id":"websql","lineNumber":3}}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"body":{"lineNumber":3,"id":"websql"},"type":"deprecation"}"#)
                .unwrap();
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn test_content_change_changes_checksum() {
        let a = json!({"type": "csp-violation", "age": 10});
        let b = json!({"type": "csp-violation", "age": 11});
        assert_ne!(checksum(&a), checksum(&b));
    }

    #[test]
    fn test_canonical_form() {
        let value = json!({
            "b": [1, "two", null, true],
            "a": {"z": "q\"uote", "y": 1.5},
        });
        assert_eq!(
            String::from_utf8(canonicalize(&value)).unwrap(),
            r#"{"a":{"y":1.5,"z":"q\"uote"},"b":[1,"two",null,true]}"#
        );
    }
}
