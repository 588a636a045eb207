//! Normalization of index definitions written by old servers.
//!
//! Servers before 3.4 accepted almost anything as an index key value and
//! silently treated it as an ascending index. Newer servers reject those
//! values, along with index options they do not know, so definitions are
//! rewritten before they are replayed.

use bson::{Bson, Decimal128, Document};
use tracing::info;

use super::marshal::create_ext_json_string;

/// Index options a modern server accepts.
pub const VALID_INDEX_OPTIONS: &[&str] = &[
    "2dsphereIndexVersion",
    "background",
    "bits",
    "bucketSize",
    "coarsestIndexedLevel",
    "collation",
    "default_language",
    "expireAfterSeconds",
    "finestIndexedLevel",
    "key",
    "language_override",
    "max",
    "min",
    "name",
    "ns",
    "partialFilterExpression",
    "sparse",
    "storageEngine",
    "textIndexVersion",
    "unique",
    "v",
    "weights",
    "wildcardProjection",
];

/// String index types that survive normalization.
pub const VALID_INDEX_TYPES: &[&str] = &["2d", "2dsphere", "text", "hashed", "geoHaystack"];

/// Tolerance for treating a double as zero.
pub const EPSILON: f64 = 1e-9;

/// True when the decimal's coefficient is zero, whatever its sign or exponent.
///
/// Works on the exact string form, so `0`, `-0`, `0.00` and `0E+12` all
/// qualify without any float conversion. NaN and infinities do not.
pub fn is_decimal_zero(d: &Decimal128) -> bool {
    let text = d.to_string();
    let unsigned = text.trim_start_matches(['-', '+']);
    let coefficient = unsigned.split(['E', 'e']).next().unwrap_or("");
    let mut digits = coefficient.chars().filter(|c| *c != '.').peekable();
    digits.peek().is_some() && digits.all(|c| c == '0')
}

/// Whether a legacy key value has to become `1`.
fn needs_conversion(value: &Bson) -> bool {
    match value {
        Bson::Int32(n) => *n == 0,
        Bson::Int64(n) => *n == 0,
        Bson::Double(f) => f.abs() < EPSILON,
        Bson::Decimal128(d) => is_decimal_zero(d),
        Bson::String(s) => !VALID_INDEX_TYPES.contains(&s.as_str()),
        _ => true,
    }
}

/// Rewrite legacy index key values in place.
///
/// Zero (in any numeric type), the empty string, unrecognized strings and
/// every non-numeric non-string value become `Int32(1)`. Other numbers and
/// the index type names are left alone. Changes are logged with the
/// namespace.
///
/// # Arguments
/// * `key` - The index key specification, e.g. `{a: 1, b: "text"}`
/// * `ns` - Namespace the index belongs to, for the log line
pub fn convert_legacy_index_keys(key: &mut Document, ns: &str) {
    let original = create_ext_json_string(key);
    let mut converted = false;
    for (_, value) in key.iter_mut() {
        if needs_conversion(value) {
            *value = Bson::Int32(1);
            converted = true;
        }
    }

    if converted {
        info!(
            "convertLegacyIndexes: converted index values '{}' to '{}' on collection '{}'",
            original,
            create_ext_json_string(key),
            ns
        );
    }
}

/// Drop every option not in [`VALID_INDEX_OPTIONS`].
///
/// Used on index definitions read from a collection dump.
pub fn convert_legacy_index_options(options: &mut Document) {
    strip_options(options, &[], "convertLegacyIndexes");
}

/// Like [`convert_legacy_index_options`] for a whole `createIndexes`
/// command, whose command key is kept.
pub fn convert_legacy_index_options_from_op(command: &mut Document) {
    strip_options(command, &["createIndexes"], "ConvertLegacyIndexOptionsFromOp");
}

fn strip_options(options: &mut Document, keep: &[&str], label: &str) {
    let unknown: Vec<String> = options
        .keys()
        .filter(|k| !VALID_INDEX_OPTIONS.contains(&k.as_str()) && !keep.contains(&k.as_str()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        return;
    }

    let original = create_ext_json_string(options);
    for key in &unknown {
        options.remove(key);
    }
    info!(
        "{}: converted index options '{}' to '{}'",
        label,
        original,
        create_ext_json_string(options)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Binary, doc, spec::BinarySubtype};

    fn decimal(s: &str) -> Bson {
        Bson::Decimal128(s.parse().unwrap())
    }

    #[test]
    fn test_numeric_zero_becomes_one() {
        let mut key = doc! {
            "foo": 0,
            "int32field": 2,
            "int64field": -3_i64,
            "zero": 0.0,
            "minusOne": -1.0,
            "fraction": -1.1,
            "tiny": 1e-9,
            "negTiny": -1e-9,
            "almostZero": 1e-10,
            "long0": 0_i64,
        };
        convert_legacy_index_keys(&mut key, "test.c");
        assert_eq!(
            key,
            doc! {
                "foo": 1,
                "int32field": 2,
                "int64field": -3_i64,
                "zero": 1,
                "minusOne": -1.0,
                "fraction": -1.1,
                "tiny": 1e-9,
                "negTiny": -1e-9,
                "almostZero": 1,
                "long0": 1,
            }
        );
    }

    #[test]
    fn test_decimal_zero_becomes_one() {
        let mut key = doc! {
            "key1": decimal("-1"),
            "key2": decimal("0"),
            "key3": decimal("1"),
            "key4": decimal("0.00"),
            "key5": decimal("-0E+3"),
        };
        convert_legacy_index_keys(&mut key, "test.c");
        assert_eq!(
            key,
            doc! {
                "key1": decimal("-1"),
                "key2": 1,
                "key3": decimal("1"),
                "key4": 1,
                "key5": 1,
            }
        );
    }

    #[test]
    fn test_decimal_zero_detection() {
        for zero in ["0", "-0", "0.00", "0E+12", "-0.0"] {
            assert!(is_decimal_zero(&zero.parse().unwrap()), "{zero}");
        }
        for non_zero in ["1", "0.01", "NaN", "Infinity", "-Infinity", "1E-10"] {
            assert!(!is_decimal_zero(&non_zero.parse().unwrap()), "{non_zero}");
        }
    }

    #[test]
    fn test_strings() {
        let mut key = doc! {
            "key1": "",
            "key2": "2dsphere",
            "key3": "hashed",
            "key4": "ascending",
        };
        convert_legacy_index_keys(&mut key, "test.c");
        assert_eq!(
            key,
            doc! { "key1": 1, "key2": "2dsphere", "key3": "hashed", "key4": 1 }
        );
    }

    #[test]
    fn test_other_types_become_one() {
        let mut key = doc! {
            "key1": { "invalid": 1 },
            "key2": Binary { subtype: BinarySubtype::Generic, bytes: vec![] },
            "key3": true,
            "key4": Bson::Null,
        };
        convert_legacy_index_keys(&mut key, "test.c");
        assert_eq!(key, doc! { "key1": 1, "key2": 1, "key3": 1, "key4": 1 });
    }

    #[test]
    fn test_unchanged_key_is_untouched() {
        let original = doc! { "a": 1, "b": -1, "c": "text" };
        let mut key = original.clone();
        convert_legacy_index_keys(&mut key, "test.c");
        assert_eq!(key, original);
    }

    #[test]
    fn test_strip_unknown_options() {
        let mut options = doc! {
            "v": 1,
            "key": { "a": 1 },
            "name": "a_1",
            "safe": true,
            "dropDups": true,
            "sparse": false,
        };
        convert_legacy_index_options(&mut options);
        assert_eq!(
            options,
            doc! { "v": 1, "key": { "a": 1 }, "name": "a_1", "sparse": false }
        );
    }

    #[test]
    fn test_strip_options_from_op_keeps_command() {
        let mut command = doc! {
            "createIndexes": "people",
            "name": "a_1",
            "dropDups": true,
        };
        convert_legacy_index_options_from_op(&mut command);
        assert_eq!(command, doc! { "createIndexes": "people", "name": "a_1" });

        let mut plain = doc! { "createIndexes": "people" };
        convert_legacy_index_options(&mut plain);
        assert!(plain.is_empty());
    }
}
