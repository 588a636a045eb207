//! Syntax tree to Extended-JSON value conversion.
//!
//! Applies the legacy constructor rules: `ObjectId(..)`, `NumberLong(..)`,
//! `Date(..)` and friends become typed values, bare numbers get the
//! narrowest integer type that holds them. Canonical `$` wrapper objects
//! are left as documents; the BSON converter interprets them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bson::Decimal128;
use chrono::Utc;

use super::ast::*;
use crate::bsonutil::{ExtJsonValue, MarshalD, convert_chrono_to_ext_json};
use crate::error::{ParseError, Result, ToolsError};

/// Converter from syntax tree to [`ExtJsonValue`]
pub struct ValueConverter;

impl ValueConverter {
    /// Convert an expression to an Extended-JSON value
    pub fn expr_to_ext_json(expr: &Expr) -> Result<ExtJsonValue> {
        match expr {
            Expr::Object(obj) => Self::object_to_ext_json(obj).map(ExtJsonValue::Document),
            Expr::Array(arr) => arr
                .elements
                .iter()
                .map(Self::expr_to_ext_json)
                .collect::<Result<_>>()
                .map(ExtJsonValue::Array),
            Expr::String(s) => Ok(ExtJsonValue::String(s.clone())),
            Expr::Number(n) => Self::number(n, false),
            Expr::Boolean(b) => Ok(ExtJsonValue::Bool(*b)),
            Expr::Null => Ok(ExtJsonValue::Null),
            Expr::Ident(name, span) => Self::identifier(name, span),
            Expr::Regex { pattern, flags } => Ok(ExtJsonValue::RegExp {
                pattern: pattern.clone(),
                options: flags.clone(),
            }),
            Expr::Call(call) => Self::call(call),
            Expr::Unary(unary) => Self::unary(unary),
        }
    }

    /// Convert an object, keeping property order
    pub fn object_to_ext_json(obj: &ObjectExpr) -> Result<MarshalD> {
        obj.properties
            .iter()
            .map(|p| Ok((p.key.as_str().to_string(), Self::expr_to_ext_json(&p.value)?)))
            .collect()
    }

    /// `NumberInt` if it fits, then `NumberLong`, then a double. Anything
    /// with a fraction or exponent is a double.
    fn number(text: &str, negative: bool) -> Result<ExtJsonValue> {
        let signed = if negative {
            format!("-{text}")
        } else {
            text.to_string()
        };
        let is_integer = text.bytes().all(|b| b.is_ascii_digit());
        if is_integer {
            if let Ok(n) = signed.parse::<i32>() {
                return Ok(ExtJsonValue::NumberInt(n));
            }
            if let Ok(n) = signed.parse::<i64>() {
                return Ok(ExtJsonValue::NumberLong(n));
            }
        }
        signed
            .parse::<f64>()
            .map(ExtJsonValue::NumberFloat)
            .map_err(|_| {
                ParseError::InvalidArgument {
                    constructor: "number".into(),
                    reason: format!("'{signed}' is not a number"),
                }
                .into()
            })
    }

    fn identifier(name: &str, span: &Span) -> Result<ExtJsonValue> {
        match name {
            "undefined" => Ok(ExtJsonValue::Undefined),
            "Infinity" => Ok(ExtJsonValue::NumberFloat(f64::INFINITY)),
            "NaN" => Ok(ExtJsonValue::NumberFloat(f64::NAN)),
            "MinKey" => Ok(ExtJsonValue::MinKey),
            "MaxKey" => Ok(ExtJsonValue::MaxKey),
            _ => Err(ParseError::UnexpectedToken {
                expected: "a value".into(),
                found: name.to_string(),
                position: span.start,
            }
            .into()),
        }
    }

    fn unary(unary: &UnaryExpr) -> Result<ExtJsonValue> {
        let negative = unary.operator == UnaryOperator::Minus;
        match &unary.argument {
            Expr::Number(n) => Self::number(n, negative),
            Expr::Ident(name, _) if name == "Infinity" => Ok(ExtJsonValue::NumberFloat(
                if negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                },
            )),
            Expr::Ident(name, _) if name == "NaN" => Ok(ExtJsonValue::NumberFloat(f64::NAN)),
            _ => Err(ParseError::UnexpectedToken {
                expected: "a number after sign".into(),
                found: "expression".into(),
                position: unary.span.start,
            }
            .into()),
        }
    }

    fn call(call: &CallExpr) -> Result<ExtJsonValue> {
        let args = &call.arguments;
        let name = call.callee.as_str();
        match name {
            "ObjectId" => {
                let [id] = Self::arity::<1>(call)?;
                Ok(ExtJsonValue::ObjectId(Self::object_id(name, id)?))
            }
            "NumberInt" => {
                let [n] = Self::arity::<1>(call)?;
                let n = Self::integer(name, n)?;
                i32::try_from(n)
                    .map(ExtJsonValue::NumberInt)
                    .map_err(|_| invalid(name, format!("{n} does not fit in 32 bits")))
            }
            "NumberLong" => {
                let [n] = Self::arity::<1>(call)?;
                Ok(ExtJsonValue::NumberLong(Self::integer(name, n)?))
            }
            "NumberDecimal" => {
                let [d] = Self::arity::<1>(call)?;
                let text = match d {
                    Expr::String(s) => s.clone(),
                    Expr::Number(n) => n.clone(),
                    Expr::Unary(u) => match &u.argument {
                        Expr::Number(n) if u.operator == UnaryOperator::Minus => format!("-{n}"),
                        Expr::Number(n) => n.clone(),
                        _ => return Err(invalid(name, "expected a number or string")),
                    },
                    _ => return Err(invalid(name, "expected a number or string")),
                };
                let decimal = text
                    .parse::<Decimal128>()
                    .map_err(|_| invalid(name, format!("'{text}' is not a decimal")))?;
                Ok(ExtJsonValue::Decimal128(decimal.to_string()))
            }
            "Date" | "ISODate" => Self::date(call),
            "BinData" => {
                let [subtype, payload] = Self::arity::<2>(call)?;
                let subtype = Self::integer(name, subtype)?;
                let subtype =
                    u8::try_from(subtype).map_err(|_| invalid(name, "subtype must be 0-255"))?;
                let payload = Self::string(name, payload)?;
                BASE64
                    .decode(payload)
                    .map_err(|e| invalid(name, format!("invalid base64: {e}")))?;
                Ok(ExtJsonValue::BinData {
                    subtype,
                    base64: payload.to_string(),
                })
            }
            "HexData" => {
                let [subtype, payload] = Self::arity::<2>(call)?;
                let subtype = u8::try_from(Self::integer(name, subtype)?)
                    .map_err(|_| invalid(name, "subtype must be 0-255"))?;
                let bytes = hex::decode(Self::string(name, payload)?)
                    .map_err(|e| invalid(name, format!("invalid hex: {e}")))?;
                Ok(ExtJsonValue::BinData {
                    subtype,
                    base64: BASE64.encode(bytes),
                })
            }
            "Timestamp" => {
                let [seconds, increment] = Self::arity::<2>(call)?;
                let seconds = u32::try_from(Self::integer(name, seconds)?)
                    .map_err(|_| invalid(name, "seconds out of range"))?;
                let increment = u32::try_from(Self::integer(name, increment)?)
                    .map_err(|_| invalid(name, "increment out of range"))?;
                Ok(ExtJsonValue::Timestamp { seconds, increment })
            }
            "RegExp" => {
                let (pattern, options) = match args.as_slice() {
                    [p] => (Self::string(name, p)?, ""),
                    [p, o] => (Self::string(name, p)?, Self::string(name, o)?),
                    _ => return Err(arg_count(name, "1 or 2", args.len())),
                };
                Ok(ExtJsonValue::RegExp {
                    pattern: pattern.to_string(),
                    options: options.to_string(),
                })
            }
            "DBPointer" => {
                let [namespace, id] = Self::arity::<2>(call)?;
                let namespace = Self::string(name, namespace)?.to_string();
                let id = match id {
                    Expr::Call(inner) if inner.callee == "ObjectId" => {
                        let [hex] = Self::arity::<1>(inner)?;
                        Self::object_id("ObjectId", hex)?
                    }
                    _ => return Err(invalid(name, "second argument must be an ObjectId")),
                };
                Ok(ExtJsonValue::DbPointer { namespace, id })
            }
            "DBRef" => {
                let (collection, id, db) = match args.as_slice() {
                    [c, i] => (c, i, None),
                    [c, i, d] => (c, i, Some(d)),
                    _ => return Err(arg_count(name, "2 or 3", args.len())),
                };
                let mut doc = MarshalD::new();
                doc.push("$ref", ExtJsonValue::String(Self::string(name, collection)?.into()));
                doc.push("$id", Self::expr_to_ext_json(id)?);
                if let Some(db) = db {
                    doc.push("$db", ExtJsonValue::String(Self::string(name, db)?.into()));
                }
                Ok(ExtJsonValue::Document(doc))
            }
            "MinKey" | "MaxKey" => {
                Self::arity::<0>(call)?;
                Ok(if name == "MinKey" {
                    ExtJsonValue::MinKey
                } else {
                    ExtJsonValue::MaxKey
                })
            }
            _ => Err(ParseError::UnknownConstructor(name.to_string()).into()),
        }
    }

    /// `Date()` is now; `Date(ms)` and `Date("iso")` are fixed instants.
    fn date(call: &CallExpr) -> Result<ExtJsonValue> {
        let name = call.callee.as_str();
        match call.arguments.as_slice() {
            [] if name == "Date" => Ok(convert_chrono_to_ext_json(&Utc::now())),
            [Expr::String(s)] => chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| ExtJsonValue::Date(dt.timestamp_millis()))
                .map_err(|e| invalid(name, format!("invalid date '{s}': {e}"))),
            [ms] if name == "Date" => Ok(ExtJsonValue::Date(Self::integer(name, ms)?)),
            args => Err(arg_count(name, "1", args.len())),
        }
    }

    fn arity<const N: usize>(call: &CallExpr) -> Result<&[Expr; N]> {
        call.arguments
            .as_slice()
            .try_into()
            .map_err(|_| arg_count(&call.callee, &N.to_string(), call.arguments.len()))
    }

    fn string<'a>(name: &str, expr: &'a Expr) -> Result<&'a str> {
        match expr {
            Expr::String(s) => Ok(s),
            _ => Err(invalid(name, "expected a string")),
        }
    }

    /// Integer argument, given as a number or a numeric string.
    fn integer(name: &str, expr: &Expr) -> Result<i64> {
        let text = match expr {
            Expr::Number(n) => n.clone(),
            Expr::String(s) => s.clone(),
            Expr::Unary(u) => match &u.argument {
                Expr::Number(n) if u.operator == UnaryOperator::Minus => format!("-{n}"),
                Expr::Number(n) => n.clone(),
                _ => return Err(invalid(name, "expected an integer")),
            },
            _ => return Err(invalid(name, "expected an integer")),
        };
        if let Ok(n) = text.parse::<i64>() {
            return Ok(n);
        }
        // 5.0 is accepted where an integer is expected
        match text.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Ok(f as i64),
            _ => Err(invalid(name, format!("'{text}' is not an integer"))),
        }
    }

    fn object_id(name: &str, expr: &Expr) -> Result<String> {
        let hex_id = Self::string(name, expr)?;
        match hex::decode(hex_id) {
            Ok(bytes) if bytes.len() == 12 => Ok(hex_id.to_ascii_lowercase()),
            _ => Err(invalid(name, format!("'{hex_id}' is not 24 hex digits"))),
        }
    }
}

fn invalid(constructor: &str, reason: impl Into<String>) -> ToolsError {
    ParseError::InvalidArgument {
        constructor: constructor.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn arg_count(constructor: &str, expected: &str, found: usize) -> ToolsError {
    invalid(
        constructor,
        format!("expected {expected} argument(s), found {found}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ext_json;

    fn value(text: &str) -> ExtJsonValue {
        parse_ext_json(text).unwrap()
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(value("5"), ExtJsonValue::NumberInt(5));
        assert_eq!(value("-2147483648"), ExtJsonValue::NumberInt(i32::MIN));
        assert_eq!(value("2147483648"), ExtJsonValue::NumberLong(2147483648));
        assert_eq!(value("-9223372036854775808"), ExtJsonValue::NumberLong(i64::MIN));
        assert_eq!(
            value("9223372036854775808"),
            ExtJsonValue::NumberFloat(9223372036854775808.0)
        );
        assert_eq!(value("5.0"), ExtJsonValue::NumberFloat(5.0));
        assert_eq!(value("1e3"), ExtJsonValue::NumberFloat(1000.0));
    }

    #[test]
    fn test_special_doubles() {
        assert_eq!(value("Infinity"), ExtJsonValue::NumberFloat(f64::INFINITY));
        assert_eq!(value("-Infinity"), ExtJsonValue::NumberFloat(f64::NEG_INFINITY));
        assert!(matches!(value("NaN"), ExtJsonValue::NumberFloat(f) if f.is_nan()));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            value(r#"ObjectId("552FFE9F5739878E73D116A9")"#),
            ExtJsonValue::ObjectId("552ffe9f5739878e73d116a9".into())
        );
        assert_eq!(value("NumberInt(-3)"), ExtJsonValue::NumberInt(-3));
        assert_eq!(value("NumberLong(\"123\")"), ExtJsonValue::NumberLong(123));
        assert_eq!(value("new NumberLong(123)"), ExtJsonValue::NumberLong(123));
        assert_eq!(
            value("NumberDecimal(\"1.50\")"),
            ExtJsonValue::Decimal128("1.50".into())
        );
        assert_eq!(value("Date(123)"), ExtJsonValue::Date(123));
        assert_eq!(value("new Date(-5)"), ExtJsonValue::Date(-5));
        assert_eq!(
            value(r#"ISODate("1970-01-01T00:00:00.250Z")"#),
            ExtJsonValue::Date(250)
        );
        assert_eq!(
            value(r#"BinData(4, "AQID")"#),
            ExtJsonValue::BinData {
                subtype: 4,
                base64: "AQID".into()
            }
        );
        assert_eq!(
            value(r#"HexData(0, "010203")"#),
            ExtJsonValue::BinData {
                subtype: 0,
                base64: "AQID".into()
            }
        );
        assert_eq!(
            value("Timestamp(1, 2)"),
            ExtJsonValue::Timestamp {
                seconds: 1,
                increment: 2
            }
        );
        assert_eq!(
            value(r#"RegExp("a/b", "i")"#),
            ExtJsonValue::RegExp {
                pattern: "a/b".into(),
                options: "i".into()
            }
        );
        assert_eq!(
            value("/ab+c/g"),
            ExtJsonValue::RegExp {
                pattern: "ab+c".into(),
                options: "g".into()
            }
        );
        assert_eq!(
            value(r#"DBPointer("ref", ObjectId("552ffe9f5739878e73d116a9"))"#),
            ExtJsonValue::DbPointer {
                namespace: "ref".into(),
                id: "552ffe9f5739878e73d116a9".into()
            }
        );
        assert_eq!(value("MinKey"), ExtJsonValue::MinKey);
        assert_eq!(value("MaxKey()"), ExtJsonValue::MaxKey);
        assert_eq!(value("undefined"), ExtJsonValue::Undefined);
    }

    #[test]
    fn test_dbref_builds_document() {
        let ExtJsonValue::Document(doc) = value(r#"DBRef("c", 5, "db")"#) else {
            panic!("expected document")
        };
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["$ref", "$id", "$db"]);
        assert_eq!(doc.get("$id"), Some(&ExtJsonValue::NumberInt(5)));
    }

    #[test]
    fn test_date_now() {
        let before = Utc::now().timestamp_millis();
        let ExtJsonValue::Date(ms) = value("new Date()") else {
            panic!("expected date")
        };
        assert!(ms >= before);
    }

    #[test]
    fn test_constructor_errors() {
        for bad in [
            "ObjectId(\"xyz\")",
            "ObjectId()",
            "NumberInt(3000000000)",
            "NumberLong(\"abc\")",
            "NumberDecimal(\"one\")",
            "BinData(300, \"AA==\")",
            "BinData(0, \"***\")",
            "Timestamp(-1, 0)",
            "DBPointer(\"ref\", \"552ffe9f5739878e73d116a9\")",
        ] {
            assert!(
                matches!(
                    parse_ext_json(bad).unwrap_err(),
                    ToolsError::Parse(ParseError::InvalidArgument { .. })
                ),
                "{bad}"
            );
        }
        assert!(matches!(
            parse_ext_json("Frobnicate(1)").unwrap_err(),
            ToolsError::Parse(ParseError::UnknownConstructor(name)) if name == "Frobnicate"
        ));
        assert!(matches!(
            parse_ext_json("{a: bogus}").unwrap_err(),
            ToolsError::Parse(ParseError::UnexpectedToken { position: 4, .. })
        ));
    }
}
