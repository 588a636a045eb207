//! Conversion between BSON values and Extended-JSON values.
//!
//! The forward direction is total over every BSON kind except the
//! deprecated symbol type, which fails closed. The reverse direction
//! recognizes both the legacy constructors (already typed by the parser)
//! and the canonical `$`-wrapper documents.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bson::spec::BinarySubtype;
use bson::{
    Binary, Bson, DateTime, DbPointer, Decimal128, Document, JavaScriptCodeWithScope, Regex,
    Timestamp, oid::ObjectId,
};
use chrono::Utc;
use serde_json::json;

use super::extjson::{ExtJsonValue, MarshalD};
use crate::error::{ConversionError, Result, ToolsError};
use crate::parser::parse_ext_json;

/// Keys that mark a document as a canonical wrapper when they come first.
pub const WRAPPER_KEYS: &[&str] = &[
    "$oid",
    "$numberInt",
    "$numberLong",
    "$numberDouble",
    "$numberDecimal",
    "$date",
    "$binary",
    "$regularExpression",
    "$regex",
    "$timestamp",
    "$code",
    "$dbPointer",
    "$minKey",
    "$maxKey",
    "$undefined",
];

/// Convert one BSON value to its Extended-JSON counterpart.
///
/// # Arguments
/// * `value` - BSON value to convert
///
/// # Returns
/// * `Result<ExtJsonValue>` - Converted value, or
///   [`ConversionError::UnsupportedBsonType`] for symbols
pub fn convert_bson_to_ext_json(value: &Bson) -> Result<ExtJsonValue> {
    let converted = match value {
        Bson::Null => ExtJsonValue::Null,
        Bson::Boolean(b) => ExtJsonValue::Bool(*b),
        Bson::String(s) => ExtJsonValue::String(s.clone()),
        Bson::Document(doc) => ExtJsonValue::Document(convert_document_to_ext_json(doc)?),
        Bson::Array(items) => ExtJsonValue::Array(
            items
                .iter()
                .map(convert_bson_to_ext_json)
                .collect::<Result<_>>()?,
        ),
        Bson::ObjectId(oid) => ExtJsonValue::ObjectId(oid.to_hex()),
        Bson::Int32(n) => ExtJsonValue::NumberInt(*n),
        Bson::Int64(n) => ExtJsonValue::NumberLong(*n),
        Bson::Double(f) => ExtJsonValue::NumberFloat(*f),
        Bson::Decimal128(d) => ExtJsonValue::Decimal128(d.to_string()),
        Bson::DateTime(dt) => ExtJsonValue::Date(dt.timestamp_millis()),
        Bson::Binary(bin) => ExtJsonValue::BinData {
            subtype: u8::from(bin.subtype),
            base64: BASE64.encode(&bin.bytes),
        },
        Bson::RegularExpression(re) => ExtJsonValue::RegExp {
            pattern: re.pattern.clone(),
            options: re.options.clone(),
        },
        Bson::Timestamp(ts) => ExtJsonValue::Timestamp {
            seconds: ts.time,
            increment: ts.increment,
        },
        Bson::JavaScriptCode(code) => ExtJsonValue::JavaScript {
            code: code.clone(),
            scope: None,
        },
        Bson::JavaScriptCodeWithScope(cws) => ExtJsonValue::JavaScript {
            code: cws.code.clone(),
            scope: Some(convert_document_to_ext_json(&cws.scope)?),
        },
        Bson::DbPointer(ptr) => {
            let (namespace, id) = db_pointer_parts(ptr)?;
            ExtJsonValue::DbPointer { namespace, id }
        }
        Bson::MinKey => ExtJsonValue::MinKey,
        Bson::MaxKey => ExtJsonValue::MaxKey,
        Bson::Undefined => ExtJsonValue::Undefined,
        Bson::Symbol(_) => {
            return Err(ConversionError::UnsupportedBsonType {
                type_name: format!("{:?}", value.element_type()),
                value: value.to_string(),
            }
            .into());
        }
    };
    Ok(converted)
}

/// Convert a document, keeping its key order.
pub fn convert_document_to_ext_json(doc: &Document) -> Result<MarshalD> {
    doc.iter()
        .map(|(k, v)| Ok((k.clone(), convert_bson_to_ext_json(v)?)))
        .collect()
}

/// Date value for a `chrono` timestamp; precision below a millisecond is dropped.
pub fn convert_chrono_to_ext_json(dt: &chrono::DateTime<Utc>) -> ExtJsonValue {
    ExtJsonValue::Date(dt.timestamp_millis())
}

/// Convert an Extended-JSON value back to BSON.
///
/// Documents whose first key is one of [`WRAPPER_KEYS`] must have exactly
/// the wrapper's shape; anything else fails with
/// [`ConversionError::MalformedWrapper`]. Other `$` keys, such as query
/// operators or DBRef fields, stay plain documents.
pub fn convert_ext_json_to_bson(value: &ExtJsonValue) -> Result<Bson> {
    let converted = match value {
        ExtJsonValue::Null => Bson::Null,
        ExtJsonValue::Bool(b) => Bson::Boolean(*b),
        ExtJsonValue::String(s) => Bson::String(s.clone()),
        ExtJsonValue::Document(d) => match wrapper_key(d) {
            Some(key) => parse_wrapper(key, d)?,
            None => Bson::Document(convert_marshal_d_to_document(d)?),
        },
        ExtJsonValue::Array(items) => Bson::Array(
            items
                .iter()
                .map(convert_ext_json_to_bson)
                .collect::<Result<_>>()?,
        ),
        ExtJsonValue::ObjectId(hex) => Bson::ObjectId(parse_object_id(hex)?),
        ExtJsonValue::NumberInt(n) => Bson::Int32(*n),
        ExtJsonValue::NumberLong(n) => Bson::Int64(*n),
        ExtJsonValue::NumberFloat(f) => Bson::Double(*f),
        ExtJsonValue::Decimal128(s) => Bson::Decimal128(parse_decimal(s)?),
        ExtJsonValue::Date(ms) => Bson::DateTime(DateTime::from_millis(*ms)),
        ExtJsonValue::BinData { subtype, base64 } => binary(*subtype, base64)?,
        ExtJsonValue::RegExp { pattern, options } => Bson::RegularExpression(Regex {
            pattern: pattern.clone(),
            options: options.clone(),
        }),
        ExtJsonValue::Timestamp { seconds, increment } => Bson::Timestamp(Timestamp {
            time: *seconds,
            increment: *increment,
        }),
        ExtJsonValue::JavaScript { code, scope: None } => Bson::JavaScriptCode(code.clone()),
        ExtJsonValue::JavaScript {
            code,
            scope: Some(scope),
        } => Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: code.clone(),
            scope: convert_marshal_d_to_document(scope)?,
        }),
        ExtJsonValue::DbPointer { namespace, id } => make_db_pointer(namespace, id)?,
        ExtJsonValue::MinKey => Bson::MinKey,
        ExtJsonValue::MaxKey => Bson::MaxKey,
        ExtJsonValue::Undefined => Bson::Undefined,
    };
    Ok(converted)
}

/// Convert an ordered Extended-JSON document to a BSON document.
pub fn convert_marshal_d_to_document(d: &MarshalD) -> Result<Document> {
    let mut doc = Document::new();
    for (k, v) in d.iter() {
        doc.insert(k, convert_ext_json_to_bson(v)?);
    }
    Ok(doc)
}

/// Parse Extended-JSON text, legacy or canonical, into a BSON document.
pub fn ext_json_to_document(text: &str) -> Result<Document> {
    match convert_ext_json_to_bson(&parse_ext_json(text)?)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(ConversionError::InvalidValue(format!(
            "expected a document at top level, found {:?}",
            other.element_type()
        ))
        .into()),
    }
}

fn wrapper_key(d: &MarshalD) -> Option<&'static str> {
    let first = d.first_key()?;
    let key = WRAPPER_KEYS.iter().copied().find(|k| *k == first)?;
    // `$regex` without a sibling `$options` is the query operator.
    if key == "$regex" && !is_legacy_regex(d) {
        return None;
    }
    Some(key)
}

fn is_legacy_regex(d: &MarshalD) -> bool {
    d.len() == 2
        && matches!(d.get("$regex"), Some(ExtJsonValue::String(_)))
        && matches!(d.get("$options"), Some(ExtJsonValue::String(_)))
}

fn malformed(wrapper: &str, reason: impl Into<String>) -> ToolsError {
    ConversionError::MalformedWrapper {
        wrapper: wrapper.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// The value of a single-key wrapper.
fn sole_value<'a>(key: &str, d: &'a MarshalD) -> Result<&'a ExtJsonValue> {
    match d.0.as_slice() {
        [(_, v)] => Ok(v),
        _ => Err(malformed(key, format!("expected only {key}, found {} keys", d.len()))),
    }
}

fn string_arg<'a>(key: &str, v: &'a ExtJsonValue) -> Result<&'a str> {
    match v {
        ExtJsonValue::String(s) => Ok(s),
        other => Err(malformed(key, format!("expected a string, found {}", other.kind()))),
    }
}

fn document_arg<'a>(key: &str, v: &'a ExtJsonValue) -> Result<&'a MarshalD> {
    match v {
        ExtJsonValue::Document(d) => Ok(d),
        other => Err(malformed(key, format!("expected an object, found {}", other.kind()))),
    }
}

/// Check that `d` holds exactly `fields`, in any order.
fn expect_fields(key: &str, d: &MarshalD, fields: &[&str]) -> Result<()> {
    if d.len() != fields.len() || !fields.iter().all(|f| d.get(f).is_some()) {
        let found: Vec<&str> = d.keys().collect();
        return Err(malformed(
            key,
            format!("expected fields {fields:?}, found {found:?}"),
        ));
    }
    Ok(())
}

fn integer_arg(key: &str, v: &ExtJsonValue) -> Result<i64> {
    match v {
        ExtJsonValue::NumberInt(n) => Ok(i64::from(*n)),
        ExtJsonValue::NumberLong(n) => Ok(*n),
        ExtJsonValue::NumberFloat(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        other => Err(malformed(
            key,
            format!("expected an integer, found {}", other.kind()),
        )),
    }
}

fn u32_arg(key: &str, v: &ExtJsonValue) -> Result<u32> {
    let n = integer_arg(key, v)?;
    u32::try_from(n).map_err(|_| malformed(key, format!("{n} is out of range for uint32")))
}

fn parse_wrapper(key: &'static str, d: &MarshalD) -> Result<Bson> {
    match key {
        "$oid" => {
            let hex = string_arg(key, sole_value(key, d)?)?;
            Ok(Bson::ObjectId(parse_object_id(hex)?))
        }
        "$numberInt" => {
            let s = string_arg(key, sole_value(key, d)?)?;
            s.parse::<i32>()
                .map(Bson::Int32)
                .map_err(|_| malformed(key, format!("'{s}' is not an int32")))
        }
        "$numberLong" => {
            let s = string_arg(key, sole_value(key, d)?)?;
            s.parse::<i64>()
                .map(Bson::Int64)
                .map_err(|_| malformed(key, format!("'{s}' is not an int64")))
        }
        "$numberDouble" => {
            let s = string_arg(key, sole_value(key, d)?)?;
            parse_double(s)
                .map(Bson::Double)
                .ok_or_else(|| malformed(key, format!("'{s}' is not a double")))
        }
        "$numberDecimal" => {
            let s = string_arg(key, sole_value(key, d)?)?;
            Ok(Bson::Decimal128(parse_decimal(s)?))
        }
        "$date" => parse_date(sole_value(key, d)?),
        "$binary" => parse_binary(d),
        "$regularExpression" => {
            let body = document_arg(key, sole_value(key, d)?)?;
            expect_fields(key, body, &["pattern", "options"])?;
            let pattern = string_arg(key, body.get("pattern").unwrap_or(&ExtJsonValue::Null))?;
            let options = string_arg(key, body.get("options").unwrap_or(&ExtJsonValue::Null))?;
            Ok(Bson::RegularExpression(Regex {
                pattern: pattern.to_string(),
                options: options.to_string(),
            }))
        }
        "$regex" => {
            let pattern = string_arg(key, d.get("$regex").unwrap_or(&ExtJsonValue::Null))?;
            let options = string_arg(key, d.get("$options").unwrap_or(&ExtJsonValue::Null))?;
            Ok(Bson::RegularExpression(Regex {
                pattern: pattern.to_string(),
                options: options.to_string(),
            }))
        }
        "$timestamp" => {
            let body = document_arg(key, sole_value(key, d)?)?;
            expect_fields(key, body, &["t", "i"])?;
            Ok(Bson::Timestamp(Timestamp {
                time: u32_arg(key, body.get("t").unwrap_or(&ExtJsonValue::Null))?,
                increment: u32_arg(key, body.get("i").unwrap_or(&ExtJsonValue::Null))?,
            }))
        }
        "$code" => {
            let code = string_arg(key, d.get("$code").unwrap_or(&ExtJsonValue::Null))?;
            match d.len() {
                1 => Ok(Bson::JavaScriptCode(code.to_string())),
                2 => {
                    let scope = d
                        .get("$scope")
                        .ok_or_else(|| malformed(key, "only $scope may follow $code"))?;
                    let scope = convert_marshal_d_to_document(document_arg(key, scope)?)?;
                    Ok(Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                        code: code.to_string(),
                        scope,
                    }))
                }
                n => Err(malformed(key, format!("expected 1 or 2 keys, found {n}"))),
            }
        }
        "$dbPointer" => {
            let body = document_arg(key, sole_value(key, d)?)?;
            expect_fields(key, body, &["$ref", "$id"])?;
            let namespace = string_arg(key, body.get("$ref").unwrap_or(&ExtJsonValue::Null))?;
            let id = match body.get("$id") {
                Some(ExtJsonValue::ObjectId(hex)) => hex.as_str(),
                Some(ExtJsonValue::Document(id)) if id.first_key() == Some("$oid") => {
                    string_arg(key, sole_value("$oid", id)?)?
                }
                _ => return Err(malformed(key, "$id must be an ObjectId")),
            };
            make_db_pointer(namespace, id)
        }
        "$minKey" | "$maxKey" => match sole_value(key, d)? {
            ExtJsonValue::NumberInt(1) | ExtJsonValue::NumberLong(1) => Ok(if key == "$minKey" {
                Bson::MinKey
            } else {
                Bson::MaxKey
            }),
            _ => Err(malformed(key, "value must be 1")),
        },
        "$undefined" => match sole_value(key, d)? {
            ExtJsonValue::Bool(true) => Ok(Bson::Undefined),
            _ => Err(malformed(key, "value must be true")),
        },
        other => Err(malformed(other, "unrecognized wrapper")),
    }
}

/// `$date` accepts the canonical `{"$numberLong": "..."}`, an ISO-8601
/// string, or a bare number of milliseconds.
fn parse_date(v: &ExtJsonValue) -> Result<Bson> {
    let key = "$date";
    let millis = match v {
        ExtJsonValue::Document(inner) if inner.first_key() == Some("$numberLong") => {
            let s = string_arg(key, sole_value("$numberLong", inner)?)?;
            s.parse::<i64>()
                .map_err(|_| malformed(key, format!("'{s}' is not an int64")))?
        }
        ExtJsonValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map_err(|e| malformed(key, format!("invalid ISO-8601 date '{s}': {e}")))?
            .timestamp_millis(),
        ExtJsonValue::NumberInt(_) | ExtJsonValue::NumberLong(_) | ExtJsonValue::NumberFloat(_) => {
            integer_arg(key, v)?
        }
        other => {
            return Err(malformed(
                key,
                format!("unexpected {} value", other.kind()),
            ));
        }
    };
    Ok(Bson::DateTime(DateTime::from_millis(millis)))
}

/// Canonical `{"$binary": {"base64", "subType"}}` or the older
/// `{"$binary": "...", "$type": "hh"}`.
fn parse_binary(d: &MarshalD) -> Result<Bson> {
    let key = "$binary";
    let (payload, subtype) = match d.get(key) {
        Some(ExtJsonValue::Document(body)) => {
            if d.len() != 1 {
                return Err(malformed(key, "unexpected keys next to $binary"));
            }
            expect_fields(key, body, &["base64", "subType"])?;
            (
                string_arg(key, body.get("base64").unwrap_or(&ExtJsonValue::Null))?,
                string_arg(key, body.get("subType").unwrap_or(&ExtJsonValue::Null))?,
            )
        }
        Some(ExtJsonValue::String(payload)) => {
            expect_fields(key, d, &["$binary", "$type"])?;
            (
                payload.as_str(),
                string_arg(key, d.get("$type").unwrap_or(&ExtJsonValue::Null))?,
            )
        }
        _ => return Err(malformed(key, "expected an object or a base64 string")),
    };
    if subtype.is_empty() || subtype.len() > 2 {
        return Err(malformed(key, format!("invalid subType '{subtype}'")));
    }
    let subtype = u8::from_str_radix(subtype, 16)
        .map_err(|_| malformed(key, format!("invalid subType '{subtype}'")))?;
    binary(subtype, payload)
}

fn binary(subtype: u8, payload: &str) -> Result<Bson> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| ConversionError::InvalidValue(format!("invalid base64 payload: {e}")))?;
    Ok(Bson::Binary(Binary {
        subtype: BinarySubtype::from(subtype),
        bytes,
    }))
}

fn parse_object_id(hex: &str) -> Result<ObjectId> {
    ObjectId::parse_str(hex)
        .map_err(|_| ConversionError::InvalidValue(format!("invalid ObjectId '{hex}'")).into())
}

fn parse_decimal(s: &str) -> Result<Decimal128> {
    s.parse::<Decimal128>()
        .map_err(|_| ConversionError::InvalidValue(format!("invalid decimal '{s}'")).into())
}

/// Doubles as written by both flavors, non-finite spellings included.
pub(crate) fn parse_double(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => s.parse::<f64>().ok().filter(|f| f.is_finite()),
    }
}

/// Namespace and ObjectId hex of a DBPointer.
fn db_pointer_parts(ptr: &DbPointer) -> Result<(String, String)> {
    let ext = Bson::DbPointer(ptr.clone()).into_canonical_extjson();
    let body = &ext["$dbPointer"];
    match (body["$ref"].as_str(), body["$id"]["$oid"].as_str()) {
        (Some(ns), Some(id)) => Ok((ns.to_string(), id.to_string())),
        _ => Err(ConversionError::InvalidValue(format!("unreadable DBPointer {ext}")).into()),
    }
}

fn make_db_pointer(namespace: &str, id: &str) -> Result<Bson> {
    parse_object_id(id)?;
    let ext = json!({ "$dbPointer": { "$ref": namespace, "$id": { "$oid": id } } });
    Bson::try_from(ext)
        .map_err(|e| ConversionError::InvalidValue(format!("invalid DBPointer: {e}")).into())
}
