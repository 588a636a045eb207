//! Legacy shell-style rendering of Extended JSON.

use bson::RawDocument;

use super::converter::convert_document_to_ext_json;
use super::extjson::{ExtJsonValue, MarshalD, format_double};
use crate::parser::lexer::{ExtJsonLexer, TokenKind};

/// Render `value` in legacy form.
///
/// With `indent` set, containers are broken over lines with `indent`
/// spaces per nesting level; otherwise the output has no whitespace at all.
pub(crate) fn render(value: &ExtJsonValue, indent: Option<usize>) -> String {
    let mut out = String::new();
    write_value(&mut out, value, indent, 0);
    out
}

/// Legacy rendering of a raw document for log lines and op display.
///
/// Never fails: documents that do not decode or convert render as an
/// inline `<...>` error marker.
pub fn format_raw_document(doc: &RawDocument) -> String {
    let parsed = match bson::Document::try_from(doc) {
        Ok(d) => d,
        Err(e) => return format!("<invalid BSON: {e}>"),
    };
    match convert_document_to_ext_json(&parsed) {
        Ok(md) => render(&ExtJsonValue::Document(md), None),
        Err(e) => format!("<{e}>"),
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// `/pattern/options`, when that literal lexes back to exactly the same
/// pattern and options.
fn regex_literal(pattern: &str, options: &str) -> Option<String> {
    if pattern.is_empty() {
        return None;
    }
    let literal = format!("/{pattern}/{options}");
    match ExtJsonLexer::tokenize(&literal).as_slice() {
        [regex, eof]
            if eof.kind == TokenKind::Eof
                && regex.kind
                    == (TokenKind::Regex {
                        pattern: pattern.to_string(),
                        flags: options.to_string(),
                    }) =>
        {
            Some(literal)
        }
        _ => None,
    }
}

fn write_value(out: &mut String, value: &ExtJsonValue, indent: Option<usize>, depth: usize) {
    match value {
        ExtJsonValue::Null => out.push_str("null"),
        ExtJsonValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ExtJsonValue::String(s) => out.push_str(&quote(s)),
        ExtJsonValue::Document(d) => write_document(out, d, indent, depth),
        ExtJsonValue::Array(items) => {
            let entries: Vec<_> = items.iter().map(|v| (None, v)).collect();
            write_container(out, ('[', ']'), &entries, indent, depth);
        }
        ExtJsonValue::ObjectId(hex) => out.push_str(&format!("ObjectId({})", quote(hex))),
        ExtJsonValue::NumberInt(n) => out.push_str(&n.to_string()),
        ExtJsonValue::NumberLong(n) => out.push_str(&format!("NumberLong({n})")),
        ExtJsonValue::NumberFloat(f) => out.push_str(&format_double(*f)),
        ExtJsonValue::Decimal128(d) => out.push_str(&format!("NumberDecimal({})", quote(d))),
        ExtJsonValue::Date(ms) => out.push_str(&format!("Date({ms})")),
        ExtJsonValue::BinData { subtype, base64 } => {
            out.push_str(&format!("BinData({subtype},{})", quote(base64)))
        }
        ExtJsonValue::RegExp { pattern, options } => match regex_literal(pattern, options) {
            Some(literal) => out.push_str(&literal),
            None => out.push_str(&format!("RegExp({},{})", quote(pattern), quote(options))),
        },
        ExtJsonValue::Timestamp { seconds, increment } => {
            out.push_str(&format!("Timestamp({seconds}, {increment})"))
        }
        ExtJsonValue::JavaScript { code, scope } => {
            let code = ExtJsonValue::String(code.clone());
            let scope = scope.clone().map(ExtJsonValue::Document);
            let mut entries = vec![(Some("$code"), &code)];
            if let Some(scope) = &scope {
                entries.push((Some("$scope"), scope));
            }
            write_container(out, ('{', '}'), &entries, indent, depth);
        }
        ExtJsonValue::DbPointer { namespace, id } => out.push_str(&format!(
            "DBPointer({}, ObjectId({}))",
            quote(namespace),
            quote(id)
        )),
        ExtJsonValue::MinKey => out.push_str("MinKey"),
        ExtJsonValue::MaxKey => out.push_str("MaxKey"),
        ExtJsonValue::Undefined => out.push_str("undefined"),
    }
}

fn write_document(out: &mut String, doc: &MarshalD, indent: Option<usize>, depth: usize) {
    let entries: Vec<_> = doc.iter().map(|(k, v)| (Some(k), v)).collect();
    write_container(out, ('{', '}'), &entries, indent, depth);
}

fn write_container(
    out: &mut String,
    (open, close): (char, char),
    entries: &[(Option<&str>, &ExtJsonValue)],
    indent: Option<usize>,
    depth: usize,
) {
    out.push(open);
    if entries.is_empty() {
        out.push(close);
        return;
    }
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if let Some(width) = indent {
            out.push('\n');
            out.push_str(&" ".repeat(width * (depth + 1)));
        }
        if let Some(key) = key {
            out.push_str(&quote(key));
            out.push(':');
            if indent.is_some() {
                out.push(' ');
            }
        }
        write_value(out, value, indent, depth + 1);
    }
    if let Some(width) = indent {
        out.push('\n');
        out.push_str(&" ".repeat(width * depth));
    }
    out.push(close);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{RawDocumentBuf, doc};

    fn legacy(v: ExtJsonValue) -> String {
        v.to_legacy_string()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(legacy(ExtJsonValue::NumberInt(1)), "1");
        assert_eq!(legacy(ExtJsonValue::NumberLong(5)), "NumberLong(5)");
        assert_eq!(legacy(ExtJsonValue::NumberFloat(5.0)), "5.0");
        assert_eq!(legacy(ExtJsonValue::NumberFloat(f64::INFINITY)), "Infinity");
        assert_eq!(
            legacy(ExtJsonValue::Decimal128("1.50".into())),
            "NumberDecimal(\"1.50\")"
        );
        assert_eq!(legacy(ExtJsonValue::Date(123)), "Date(123)");
        assert_eq!(
            legacy(ExtJsonValue::Timestamp {
                seconds: 1,
                increment: 2
            }),
            "Timestamp(1, 2)"
        );
        assert_eq!(legacy(ExtJsonValue::Undefined), "undefined");
        assert_eq!(legacy(ExtJsonValue::String("a\"b".into())), "\"a\\\"b\"");
    }

    #[test]
    fn test_regex_forms() {
        assert_eq!(
            legacy(ExtJsonValue::RegExp {
                pattern: "^ab".into(),
                options: "im".into()
            }),
            "/^ab/im"
        );
        assert_eq!(
            legacy(ExtJsonValue::RegExp {
                pattern: "a/b".into(),
                options: String::new()
            }),
            "RegExp(\"a/b\",\"\")"
        );
    }

    #[test]
    fn test_regex_that_would_not_lex_uses_constructor() {
        let regex = |pattern: &str| ExtJsonValue::RegExp {
            pattern: pattern.into(),
            options: "i".into(),
        };
        assert_eq!(legacy(regex("a\\")), r#"RegExp("a\\","i")"#);
        assert_eq!(legacy(regex("[a")), r#"RegExp("[a","i")"#);
        assert_eq!(legacy(regex("a\nb")), r#"RegExp("a\nb","i")"#);
        assert_eq!(legacy(regex("[/]x")), "/[/]x/i");
        assert_eq!(legacy(regex("a\\/b")), "/a\\/b/i");
    }

    #[test]
    fn test_nested_compact() {
        let mut inner = MarshalD::new();
        inner.push("y", ExtJsonValue::NumberLong(2));
        let mut outer = MarshalD::new();
        outer.push("x", ExtJsonValue::Document(inner));
        outer.push(
            "list",
            ExtJsonValue::Array(vec![ExtJsonValue::Null, ExtJsonValue::Bool(true)]),
        );
        assert_eq!(
            legacy(ExtJsonValue::Document(outer)),
            "{\"x\":{\"y\":NumberLong(2)},\"list\":[null,true]}"
        );
    }

    #[test]
    fn test_pretty() {
        let mut d = MarshalD::new();
        d.push("a", ExtJsonValue::NumberInt(1));
        d.push("b", ExtJsonValue::Array(vec![]));
        assert_eq!(
            render(&ExtJsonValue::Document(d), Some(2)),
            "{\n  \"a\": 1,\n  \"b\": []\n}"
        );
    }

    #[test]
    fn test_format_raw_document() {
        let raw = RawDocumentBuf::from_document(&doc! { "x": 1, "n": 2_i64 }).unwrap();
        assert_eq!(format_raw_document(&raw), "{\"x\":1,\"n\":NumberLong(2)}");

        let symbol = RawDocumentBuf::from_document(&doc! { "s": bson::Bson::Symbol("sym".into()) })
            .unwrap();
        assert!(format_raw_document(&symbol).starts_with("<"));
    }
}
