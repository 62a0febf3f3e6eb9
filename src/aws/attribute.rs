//! DynamoDB JSON codec.
//!
//! Parameters and results use the low-level DynamoDB wire shape, where every
//! attribute is an object with exactly one type key: `{"S": "abc"}`,
//! `{"N": "42"}`, `{"M": {...}}` and so on. Binary values are base64.

use std::collections::HashMap;

use aws_sdk_dynamodb::{primitives::Blob, types::AttributeValue};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

pub type Item = HashMap<String, AttributeValue>;

/// Decode one typed attribute
pub fn to_attribute_value(value: &Value) -> Result<AttributeValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid("attribute value must be an object with a single type key"))?;
    let mut entries = object.iter();
    let (tag, inner) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(invalid(
                "attribute value must have exactly one type key (S, N, B, BOOL, NULL, SS, NS, BS, L, M)",
            ))
        }
    };

    let attr = match tag.as_str() {
        "S" => AttributeValue::S(expect_str(tag, inner)?.to_string()),
        "N" => AttributeValue::N(number_string(tag, inner)?),
        "B" => AttributeValue::B(decode_blob(expect_str(tag, inner)?)?),
        "BOOL" => AttributeValue::Bool(
            inner
                .as_bool()
                .ok_or_else(|| invalid("BOOL attribute must be a boolean"))?,
        ),
        "NULL" => AttributeValue::Null(
            inner
                .as_bool()
                .ok_or_else(|| invalid("NULL attribute must be a boolean"))?,
        ),
        "SS" => AttributeValue::Ss(
            expect_array(tag, inner)?
                .iter()
                .map(|v| expect_str(tag, v).map(str::to_string))
                .collect::<Result<_>>()?,
        ),
        "NS" => AttributeValue::Ns(
            expect_array(tag, inner)?
                .iter()
                .map(|v| number_string(tag, v))
                .collect::<Result<_>>()?,
        ),
        "BS" => AttributeValue::Bs(
            expect_array(tag, inner)?
                .iter()
                .map(|v| expect_str(tag, v).and_then(decode_blob))
                .collect::<Result<_>>()?,
        ),
        "L" => AttributeValue::L(
            expect_array(tag, inner)?
                .iter()
                .map(to_attribute_value)
                .collect::<Result<_>>()?,
        ),
        "M" => AttributeValue::M(to_item(inner)?),
        other => return Err(invalid(&format!("unsupported attribute type {}", other))),
    };
    Ok(attr)
}

/// Decode an attribute map such as `Key` or `Item`
pub fn to_item(value: &Value) -> Result<Item> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid("attribute map must be a JSON object"))?;
    object
        .iter()
        .map(|(name, attr)| {
            to_attribute_value(attr)
                .map(|attr| (name.clone(), attr))
                .map_err(|e| invalid(&format!("attribute {}: {}", name, e)))
        })
        .collect()
}

/// Encode one attribute back into DynamoDB JSON
pub fn from_attribute_value(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => json!({ "S": s }),
        AttributeValue::N(n) => json!({ "N": n }),
        AttributeValue::B(b) => json!({ "B": STANDARD.encode(b.as_ref()) }),
        AttributeValue::Bool(b) => json!({ "BOOL": b }),
        AttributeValue::Null(b) => json!({ "NULL": b }),
        AttributeValue::Ss(values) => json!({ "SS": values }),
        AttributeValue::Ns(values) => json!({ "NS": values }),
        AttributeValue::Bs(values) => json!({
            "BS": values.iter().map(|b| STANDARD.encode(b.as_ref())).collect::<Vec<_>>()
        }),
        AttributeValue::L(values) => json!({
            "L": values.iter().map(from_attribute_value).collect::<Vec<_>>()
        }),
        AttributeValue::M(map) => json!({ "M": from_item(map) }),
        _ => Value::Null,
    }
}

/// Encode an attribute map
pub fn from_item(item: &Item) -> Value {
    let map: Map<String, Value> = item
        .iter()
        .map(|(name, attr)| (name.clone(), from_attribute_value(attr)))
        .collect();
    Value::Object(map)
}

pub fn from_items(items: &[Item]) -> Value {
    Value::Array(items.iter().map(from_item).collect())
}

fn invalid(message: &str) -> Error {
    Error::InvalidParameters(message.to_string())
}

fn expect_str<'a>(tag: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(&format!("{} attribute must hold strings", tag)))
}

fn expect_array<'a>(tag: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| invalid(&format!("{} attribute must be an array", tag)))
}

/// Numbers travel as strings; a bare JSON number is accepted and stringified.
fn number_string(tag: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(&format!("{} attribute must hold numbers", tag))),
    }
}

fn decode_blob(encoded: &str) -> Result<Blob> {
    STANDARD
        .decode(encoded)
        .map(Blob::new)
        .map_err(|e| invalid(&format!("binary attribute is not valid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_attributes() {
        assert_eq!(to_attribute_value(&json!({"S": "abc"})).unwrap(), AttributeValue::S("abc".into()));
        assert_eq!(to_attribute_value(&json!({"N": "1.5"})).unwrap(), AttributeValue::N("1.5".into()));
        assert_eq!(to_attribute_value(&json!({"N": 7})).unwrap(), AttributeValue::N("7".into()));
        assert_eq!(to_attribute_value(&json!({"BOOL": true})).unwrap(), AttributeValue::Bool(true));
        assert_eq!(to_attribute_value(&json!({"NULL": true})).unwrap(), AttributeValue::Null(true));
        assert_eq!(
            to_attribute_value(&json!({"B": "aGVsbG8="})).unwrap(),
            AttributeValue::B(Blob::new(b"hello".to_vec()))
        );
    }

    #[test]
    fn test_nested_item_encodes_back() {
        let raw = json!({
            "id": {"S": "user-1"},
            "tags": {"SS": ["a", "b"]},
            "scores": {"NS": ["1", "2"]},
            "profile": {"M": {
                "age": {"N": "30"},
                "history": {"L": [{"S": "x"}, {"NULL": true}]}
            }},
            "avatar": {"BS": ["aGVsbG8="]}
        });
        let item = to_item(&raw).unwrap();
        assert_eq!(item.len(), 5);
        assert_eq!(from_item(&item), raw);
    }

    #[test]
    fn test_rejects_ambiguous_attribute() {
        let err = to_attribute_value(&json!({"S": "a", "N": "1"})).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
        assert!(to_attribute_value(&json!({})).is_err());
        assert!(to_attribute_value(&json!("plain")).is_err());
    }

    #[test]
    fn test_rejects_unknown_type_and_names_attribute() {
        let err = to_item(&json!({"id": {"X": "1"}})).unwrap_err();
        assert_eq!(err.to_string(), "attribute id: unsupported attribute type X");
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(to_attribute_value(&json!({"B": "%%%"})).is_err());
    }
}
