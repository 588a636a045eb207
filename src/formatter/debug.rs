//! The `bsondump --type debug` structure view.
//!
//! ```text
//! --- new object ---
//! 	size : 12
//! 		a
//! 			type:   16 size: 7
//! ```
//!
//! Nested documents and arrays are printed as new objects three tabs
//! further in, directly after the element that holds them.

use std::fmt::Write;

use bson::{RawBsonRef, RawDocument, RawDocumentBuf};

use crate::error::{DecodeError, Result};

/// Render the structure of `doc`.
pub fn debug_document(doc: &RawDocument) -> Result<String> {
    let mut out = String::new();
    write_object(&mut out, doc, 0)?;
    Ok(out)
}

fn write_object(out: &mut String, doc: &RawDocument, level: usize) -> Result<()> {
    let indent = "\t".repeat(level);
    let _ = writeln!(out, "{indent}--- new object ---");
    let _ = writeln!(out, "{indent}\tsize : {}", doc.as_bytes().len());

    for element in doc.iter() {
        let (key, value) = element.map_err(|e| DecodeError::InvalidBson(e.to_string()))?;
        let type_code = value.element_type() as u8 as i8;
        let _ = writeln!(out, "{indent}\t\t{key}");
        let _ = writeln!(
            out,
            "{indent}\t\t\ttype: {type_code:>4} size: {}",
            element_size(key, value)
        );

        match value {
            RawBsonRef::Document(sub) => write_object(out, sub, level + 3)?,
            RawBsonRef::Array(arr) => {
                let sub = RawDocument::from_bytes(arr.as_bytes())
                    .map_err(|e| DecodeError::InvalidBson(e.to_string()))?;
                write_object(out, sub, level + 3)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Bytes taken by one element: type byte, key, terminator and value.
fn element_size(key: &str, value: RawBsonRef<'_>) -> usize {
    let mut single = RawDocumentBuf::new();
    single.append(key, value.to_raw_bson());
    // Length prefix and trailing null of the wrapping document.
    single.as_bytes().len() - 5
}
