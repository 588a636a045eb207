//! Rendering documents as Extended JSON with a round-trip check.

use bson::Document;

use super::compare::is_equal;
use super::converter::{convert_document_to_ext_json, ext_json_to_document};
use super::extjson::{ExtJsonMode, ExtJsonValue};
use crate::error::{ConversionError, Result};

/// Render `doc` in `mode` and make sure the text parses back to the same
/// BSON bytes.
///
/// # Returns
/// * `Result<String>` - The compact rendering, or
///   [`ConversionError::Irreversible`] carrying it when reparsing does not
///   reproduce `doc`
pub fn marshal_ext_json_reversible(doc: &Document, mode: ExtJsonMode) -> Result<String> {
    let value = ExtJsonValue::Document(convert_document_to_ext_json(doc)?);
    let json = value.to_ext_json_string(mode, false)?;

    let Ok(reparsed) = ext_json_to_document(&json) else {
        return Err(ConversionError::Irreversible { json }.into());
    };
    if !is_equal(&reparsed, doc)? {
        return Err(ConversionError::Irreversible { json }.into());
    }
    Ok(json)
}

/// Legacy rendering for informational messages; never fails.
pub fn create_ext_json_string(doc: &Document) -> String {
    marshal_ext_json_reversible(doc, ExtJsonMode::Legacy)
        .unwrap_or_else(|_| "<unable to format document>".to_string())
}
