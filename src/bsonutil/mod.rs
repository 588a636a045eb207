//! BSON and Extended JSON utilities.
//!
//! - [`extjson`]: the Extended-JSON value model and its two renderings
//! - [`converter`]: BSON ⇄ Extended JSON conversion
//! - [`marshal`]: rendering with a round-trip guarantee
//! - [`compare`]: document and index-key equality
//! - [`indexes`]: rewriting of legacy index definitions

pub mod compare;
pub mod converter;
pub mod extjson;
pub mod indexes;
mod legacy;
pub mod marshal;

pub use compare::{bson_to_f64, is_equal, is_index_keys_equal};
pub use converter::{
    WRAPPER_KEYS, convert_bson_to_ext_json, convert_chrono_to_ext_json,
    convert_document_to_ext_json, convert_ext_json_to_bson, convert_marshal_d_to_document,
    ext_json_to_document,
};
pub use extjson::{ExtJsonMode, ExtJsonValue, MarshalD, format_double};
pub use indexes::{
    EPSILON, VALID_INDEX_OPTIONS, VALID_INDEX_TYPES, convert_legacy_index_keys,
    convert_legacy_index_options, convert_legacy_index_options_from_op, is_decimal_zero,
};
pub use legacy::format_raw_document;
pub use marshal::{create_ext_json_string, marshal_ext_json_reversible};
