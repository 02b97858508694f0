//! Minimal XML rendering of serializable values.
//!
//! Values are first serialized to a `serde_json::Value`, then written as
//! elements: object members become child elements, array items become
//! `<item>` elements, `null` becomes an empty element.

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Renders `value` as an XML document whose root element is `root`.
pub fn to_xml_string<T: Serialize + ?Sized>(
    root: &str,
    value: &T,
) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = String::from(DECLARATION);
    write_element(&mut out, &element_name(root), &value);
    Ok(out)
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => {
            let _ = write!(out, "<{name} />");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<{name}>{b}</{name}>");
        }
        Value::Number(n) => {
            let _ = write!(out, "<{name}>{n}</{name}>");
        }
        Value::String(s) => {
            let _ = write!(out, "<{name}>{}</{name}>", escape_text(s));
        }
        Value::Array(items) => {
            let _ = write!(out, "<{name}>");
            for item in items {
                write_element(out, "item", item);
            }
            let _ = write!(out, "</{name}>");
        }
        Value::Object(members) => {
            let _ = write!(out, "<{name}>");
            for (key, member) in members {
                write_element(out, &element_name(key), member);
            }
            let _ = write!(out, "</{name}>");
        }
    }
}

/// Maps an arbitrary key to a valid XML element name.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    if !starts_ok {
        name.insert(0, '_');
    }
    name
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
