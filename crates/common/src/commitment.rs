//! Salted commitment codec over canonical JSON.
//!
//! A commitment binds a party to a structured value without disclosing it:
//!
//! ```text
//! commitment = "0x" + hex(SHA-256(canonical_json(value) || "|" || salt))
//! ```
//!
//! The canonical encoding is fixed here rather than inherited from whatever
//! serializer happens to be in scope: objects are emitted with keys in
//! ascending byte order and no insignificant whitespace. Two values that are
//! structurally equal always hash identically, regardless of the key order
//! they were built with.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex prefix carried by every commitment string.
pub const COMMITMENT_PREFIX: &str = "0x";

/// Separator between the canonical value bytes and the salt.
const SALT_SEPARATOR: &str = "|";

/// Serialize a JSON value canonically: sorted object keys, no whitespace.
///
/// Strings and numbers are emitted through `serde_json`'s own formatting so
/// escaping and number rendering stay consistent with the rest of the stack.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // Serializing a bare string cannot fail.
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
    }
}

/// Compute the salted commitment over `value`.
///
/// Deterministic: identical `(value, salt)` always yields an identical
/// commitment. No side effects, no failure modes.
pub fn commit(value: &Value, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hasher.update(SALT_SEPARATOR.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{}{}", COMMITMENT_PREFIX, hex::encode(hasher.finalize()))
}

/// Recompute the commitment for `(value, salt)` and compare against
/// `expected`.
pub fn verify(value: &Value, salt: &str, expected: &str) -> bool {
    commit(value, salt) == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commit_is_deterministic() {
        let v = json!({"score": 11, "note": "hello"});
        assert_eq!(commit(&v, "s1"), commit(&v, "s1"));
        assert!(verify(&v, "s1", &commit(&v, "s1")));
    }

    #[test]
    fn commit_has_prefix_and_hex_body() {
        let c = commit(&json!({"x": 1}), "salt");
        assert!(c.starts_with(COMMITMENT_PREFIX));
        // SHA-256 -> 32 bytes -> 64 hex chars.
        assert_eq!(c.len(), COMMITMENT_PREFIX.len() + 64);
        assert!(c[2..].chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_values_do_not_collide() {
        let c1 = commit(&json!({"x": 1}), "s");
        let c2 = commit(&json!({"x": 2}), "s");
        assert_ne!(c1, c2);
    }

    #[test]
    fn distinct_salts_do_not_collide() {
        let v = json!({"x": 1});
        assert_ne!(commit(&v, "s1"), commit(&v, "s2"));
    }

    #[test]
    fn canonical_form_ignores_key_insertion_order() {
        let a: Value = serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(commit(&a, "s"), commit(&b, "s"));
    }

    #[test]
    fn canonical_form_sorts_nested_objects() {
        let v = json!({"outer": {"z": 1, "a": [{"k": true, "b": null}]}});
        assert_eq!(
            canonical_json(&v),
            r#"{"outer":{"a":[{"b":null,"k":true}],"z":1}}"#
        );
    }

    #[test]
    fn canonical_form_escapes_strings() {
        let v = json!({"note": "line\nbreak \"quoted\""});
        assert_eq!(
            canonical_json(&v),
            r#"{"note":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn verify_rejects_single_byte_mutation() {
        let v = json!({"score": 11, "note": "hello"});
        let c = commit(&v, "s1");

        // Flip one byte of the serialized form and parse it back.
        let mut serialized = canonical_json(&v).into_bytes();
        let pos = serialized
            .iter()
            .position(|b| *b == b'h')
            .expect("byte present");
        serialized[pos] = b'j';
        let mutated: Value =
            serde_json::from_slice(&serialized).expect("still valid JSON");

        assert_ne!(v, mutated);
        assert!(!verify(&mutated, "s1", &c));
    }

    #[test]
    fn verify_rejects_wrong_salt() {
        let v = json!({"score": 11});
        let c = commit(&v, "s1");
        assert!(!verify(&v, "s2", &c));
    }
}
