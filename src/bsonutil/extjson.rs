//! The Extended-JSON value model.
//!
//! [`ExtJsonValue`] has one variant per BSON kind so that nothing is lost
//! between BSON and text. It renders in two flavors: the legacy shell form
//! with bare constructors (`NumberLong(5)`) and the canonical `$`-wrapper
//! form (`{"$numberLong":"5"}`), the latter through [`serde::Serialize`].

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;

use super::legacy;
use crate::error::{Result, ToolsError};

/// Textual flavor of Extended JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtJsonMode {
    /// Bare shell constructors.
    #[default]
    Legacy,
    /// `$`-prefixed wrapper objects.
    Canonical,
}

impl fmt::Display for ExtJsonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtJsonMode::Legacy => write!(f, "legacy"),
            ExtJsonMode::Canonical => write!(f, "canonical"),
        }
    }
}

/// One Extended-JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtJsonValue {
    Null,
    Bool(bool),
    String(String),
    Document(MarshalD),
    Array(Vec<ExtJsonValue>),
    /// 24 lowercase hex characters.
    ObjectId(String),
    NumberInt(i32),
    NumberLong(i64),
    /// Any double, NaN and the infinities included.
    NumberFloat(f64),
    /// Exact decimal text as produced by the BSON library.
    Decimal128(String),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    BinData {
        subtype: u8,
        base64: String,
    },
    RegExp {
        pattern: String,
        options: String,
    },
    Timestamp {
        seconds: u32,
        increment: u32,
    },
    JavaScript {
        code: String,
        scope: Option<MarshalD>,
    },
    DbPointer {
        namespace: String,
        /// Hex of the referenced ObjectId.
        id: String,
    },
    MinKey,
    MaxKey,
    Undefined,
}

impl ExtJsonValue {
    /// Name of the BSON kind this value stands for.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Document(_) => "object",
            Self::Array(_) => "array",
            Self::ObjectId(_) => "objectId",
            Self::NumberInt(_) => "int",
            Self::NumberLong(_) => "long",
            Self::NumberFloat(_) => "double",
            Self::Decimal128(_) => "decimal",
            Self::Date(_) => "date",
            Self::BinData { .. } => "binData",
            Self::RegExp { .. } => "regex",
            Self::Timestamp { .. } => "timestamp",
            Self::JavaScript { .. } => "javascript",
            Self::DbPointer { .. } => "dbPointer",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
            Self::Undefined => "undefined",
        }
    }

    /// Compact legacy rendering, e.g. `{"a":NumberLong(5)}`.
    pub fn to_legacy_string(&self) -> String {
        legacy::render(self, None)
    }

    /// Render in `mode`, indented by `indent` spaces per level when given.
    pub fn render(&self, mode: ExtJsonMode, indent: Option<usize>) -> Result<String> {
        match (mode, indent) {
            (ExtJsonMode::Legacy, indent) => Ok(legacy::render(self, indent)),
            (ExtJsonMode::Canonical, None) => Ok(serde_json::to_string(self)?),
            (ExtJsonMode::Canonical, Some(width)) => {
                let pad = " ".repeat(width);
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(pad.as_bytes()),
                );
                self.serialize(&mut ser)?;
                String::from_utf8(buf).map_err(|e| ToolsError::Generic(e.to_string()))
            }
        }
    }

    /// Render in `mode`, two-space indented when `pretty`.
    pub fn to_ext_json_string(&self, mode: ExtJsonMode, pretty: bool) -> Result<String> {
        self.render(mode, pretty.then_some(2))
    }
}

impl fmt::Display for ExtJsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_legacy_string())
    }
}

/// An ordered document: keys keep their BSON order through rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarshalD(pub Vec<(String, ExtJsonValue)>);

impl MarshalD {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: ExtJsonValue) {
        self.0.push((key.into(), value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ExtJsonValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn first_key(&self) -> Option<&str> {
        self.0.first().map(|(k, _)| k.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtJsonValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ExtJsonValue)> for MarshalD {
    fn from_iter<I: IntoIterator<Item = (String, ExtJsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for MarshalD {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Text of a double as used by both flavors: `NaN`, `Infinity`,
/// `-Infinity`, or a form that always shows it is not an integer.
pub fn format_double(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{f:?}")
    }
}

/// `{key: value}` with a single entry.
struct Wrap<'a, T: ?Sized>(&'static str, &'a T);

impl<T: Serialize + ?Sized> Serialize for Wrap<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

#[derive(Serialize)]
struct BinaryBody<'a> {
    base64: &'a str,
    #[serde(rename = "subType")]
    sub_type: String,
}

#[derive(Serialize)]
struct RegexBody<'a> {
    pattern: &'a str,
    options: &'a str,
}

#[derive(Serialize)]
struct TimestampBody {
    t: u32,
    i: u32,
}

#[derive(Serialize)]
struct DbPointerBody<'a> {
    #[serde(rename = "$ref")]
    namespace: &'a str,
    #[serde(rename = "$id")]
    id: Wrap<'a, str>,
}

/// Canonical Extended JSON.
impl Serialize for ExtJsonValue {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => s.serialize_unit(),
            Self::Bool(b) => s.serialize_bool(*b),
            Self::String(v) => s.serialize_str(v),
            Self::Document(d) => d.serialize(s),
            Self::Array(items) => {
                let mut seq = s.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::ObjectId(hex) => Wrap("$oid", hex.as_str()).serialize(s),
            Self::NumberInt(n) => Wrap("$numberInt", n.to_string().as_str()).serialize(s),
            Self::NumberLong(n) => Wrap("$numberLong", n.to_string().as_str()).serialize(s),
            Self::NumberFloat(f) => Wrap("$numberDouble", format_double(*f).as_str()).serialize(s),
            Self::Decimal128(d) => Wrap("$numberDecimal", d.as_str()).serialize(s),
            Self::Date(ms) => {
                Wrap("$date", &Wrap("$numberLong", ms.to_string().as_str())).serialize(s)
            }
            Self::BinData { subtype, base64 } => Wrap(
                "$binary",
                &BinaryBody {
                    base64,
                    sub_type: hex::encode([*subtype]),
                },
            )
            .serialize(s),
            Self::RegExp { pattern, options } => {
                Wrap("$regularExpression", &RegexBody { pattern, options }).serialize(s)
            }
            Self::Timestamp { seconds, increment } => Wrap(
                "$timestamp",
                &TimestampBody {
                    t: *seconds,
                    i: *increment,
                },
            )
            .serialize(s),
            Self::JavaScript { code, scope } => {
                let mut map = s.serialize_map(Some(1 + usize::from(scope.is_some())))?;
                map.serialize_entry("$code", code)?;
                if let Some(scope) = scope {
                    map.serialize_entry("$scope", scope)?;
                }
                map.end()
            }
            Self::DbPointer { namespace, id } => Wrap(
                "$dbPointer",
                &DbPointerBody {
                    namespace,
                    id: Wrap("$oid", id.as_str()),
                },
            )
            .serialize(s),
            Self::MinKey => Wrap("$minKey", &1).serialize(s),
            Self::MaxKey => Wrap("$maxKey", &1).serialize(s),
            Self::Undefined => Wrap("$undefined", &true).serialize(s),
        }
    }
}
