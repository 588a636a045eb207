//! Equality helpers for documents and index keys.

use bson::{Bson, Document};

use super::indexes::EPSILON;
use crate::error::Result;

/// Byte-level equality: type- and order-sensitive, so `{a: 1}` and
/// `{a: 1.0}` differ, as do `{a: 1, b: 2}` and `{b: 2, a: 1}`.
pub fn is_equal(left: &Document, right: &Document) -> Result<bool> {
    Ok(bson::to_vec(left)? == bson::to_vec(right)?)
}

/// Numeric value of a BSON number, `None` for every other kind.
///
/// Decimals go through their exact string, so values outside the `f64`
/// range come back as infinities.
pub fn bson_to_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}

/// Compare two normalized index key specifications.
///
/// Field names must match in order. String values (index types) must be
/// identical; numeric values may differ in type but must agree within
/// `1e-9`. Any other value never matches.
pub fn is_index_keys_equal(left: &Document, right: &Document) -> bool {
    if left.len() != right.len() {
        return false;
    }

    left.iter().zip(right.iter()).all(|((lk, lv), (rk, rv))| {
        if lk != rk {
            return false;
        }
        match (lv, rv) {
            (Bson::String(a), Bson::String(b)) => a == b,
            (Bson::String(_), _) | (_, Bson::String(_)) => false,
            _ => match (bson_to_f64(lv), bson_to_f64(rv)) {
                (Some(a), Some(b)) => (a - b).abs() < EPSILON,
                _ => false,
            },
        }
    })
}
