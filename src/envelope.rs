// SOAP 1.1 envelope construction
//
// Messages and headers are plain `serde_json::Value` trees, written out in
// insertion order. `"@name"` keys become attributes, `"$text"` becomes the
// element's text, other keys become child elements. Arrays repeat the
// element and `null` values are left out.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};

use crate::config::Namespaces;
use crate::error::SoapError;

pub const ATTRIBUTE_PREFIX: char = '@';
pub const TEXT_KEY: &str = "$text";

const ENVELOPE: &str = "env:Envelope";
const HEADER: &str = "env:Header";
const BODY: &str = "env:Body";

type XmlWriter = Writer<Vec<u8>>;

// Build the full request envelope for one operation call.
//
// `operation` is the qualified body element (e.g. `wsdl:WakeUpCallRequest`),
// `header` is written inside `env:Header`, `message` inside the operation element.
pub fn build_envelope(
    namespaces: &Namespaces,
    header: &Value,
    operation: &str,
    message: &Value,
) -> Result<String, SoapError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(SoapError::xml)?;

    let mut envelope = BytesStart::new(ENVELOPE);
    for (prefix, uri) in namespaces.iter() {
        envelope.push_attribute((prefix, uri));
    }
    writer
        .write_event(Event::Start(envelope))
        .map_err(SoapError::xml)?;

    write_wrapper(&mut writer, HEADER, header)?;

    writer
        .write_event(Event::Start(BytesStart::new(BODY)))
        .map_err(SoapError::xml)?;
    match message {
        // Operations always get an element, even without arguments
        Value::Null => write_element(&mut writer, operation, &Value::Object(Map::new()))?,
        other => write_element(&mut writer, operation, other)?,
    }
    writer
        .write_event(Event::End(BytesEnd::new(BODY)))
        .map_err(SoapError::xml)?;

    writer
        .write_event(Event::End(BytesEnd::new(ENVELOPE)))
        .map_err(SoapError::xml)?;

    String::from_utf8(writer.into_inner()).map_err(SoapError::xml)
}

// `env:Header` holds the children of `content` directly
fn write_wrapper(writer: &mut XmlWriter, name: &str, content: &Value) -> Result<(), SoapError> {
    match content {
        Value::Object(map) if !map.is_empty() => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(SoapError::xml)?;
            write_children(writer, map)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(SoapError::xml)
        }
        _ => writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(SoapError::xml),
    }
}

fn write_children(writer: &mut XmlWriter, map: &Map<String, Value>) -> Result<(), SoapError> {
    for (key, value) in map {
        if key.starts_with(ATTRIBUTE_PREFIX) || key == TEXT_KEY {
            continue;
        }
        write_element(writer, key, value)?;
    }
    Ok(())
}

fn write_element(writer: &mut XmlWriter, name: &str, value: &Value) -> Result<(), SoapError> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            for (key, attr_value) in map {
                if let Some(attr) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    if let Some(text) = scalar_text(attr_value) {
                        start.push_attribute((attr, text.as_str()));
                    }
                }
            }

            let text = map.get(TEXT_KEY).and_then(scalar_text);
            let has_children = map
                .iter()
                .any(|(key, v)| !key.starts_with(ATTRIBUTE_PREFIX) && key != TEXT_KEY && !v.is_null());

            if text.is_none() && !has_children {
                return writer
                    .write_event(Event::Empty(start))
                    .map_err(SoapError::xml);
            }

            writer
                .write_event(Event::Start(start))
                .map_err(SoapError::xml)?;
            if let Some(text) = text {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(SoapError::xml)?;
            }
            write_children(writer, map)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(SoapError::xml)
        }
        scalar => {
            let text = scalar_text(scalar).unwrap_or_default();
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(SoapError::xml)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(SoapError::xml)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(SoapError::xml)
        }
    }
}

// Prefix every child element name with `prefix`, for schemas whose
// elementFormDefault is qualified. Names already carrying a prefix are kept.
pub fn qualify_children(message: &Value, prefix: &str) -> Value {
    match message {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    if key.starts_with(ATTRIBUTE_PREFIX) || key == TEXT_KEY {
                        (key.clone(), value.clone())
                    } else if key.contains(':') {
                        (key.clone(), qualify_children(value, prefix))
                    } else {
                        (format!("{prefix}:{key}"), qualify_children(value, prefix))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| qualify_children(item, prefix)).collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
