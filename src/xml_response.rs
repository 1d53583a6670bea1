// SOAP response parsing into structured values
//
// Element and attribute names are snake_cased with their namespace prefix
// stripped, so `<ns:FetchHouseKeepingRoomStatusResponse>` is looked up as
// `fetch_house_keeping_room_status_response` and `resultStatusFlag="SUCCESS"`
// becomes `"@result_status_flag": "SUCCESS"`.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::envelope::TEXT_KEY;
use crate::error::SoapError;

// Intermediate element tree, local names only
#[derive(Debug, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
    // xmlns declarations made on this element, "" for the default namespace
    pub namespaces: Vec<(String, String)>,
}

impl XmlNode {
    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn text_at(&self, path: &[&str]) -> Option<&str> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node.text.as_str())
    }
}

// Parse a SOAP envelope and return the content of its `Body` as an object.
//
// A `Fault` in the body is turned into `SoapError::Fault`, for both SOAP 1.1
// (`faultcode`/`faultstring`) and SOAP 1.2 (`Code/Value`/`Reason/Text`).
pub fn parse_response(xml: &str) -> Result<Value, SoapError> {
    let root = parse_document(xml)?;
    if root.name != "Envelope" {
        return Err(SoapError::UnexpectedResponse(format!(
            "expected Envelope, found {}",
            root.name
        )));
    }

    let body = root
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| SoapError::UnexpectedResponse("missing Body".to_string()))?;

    if let Some(fault) = body.child("Fault") {
        let code = fault
            .text_at(&["faultcode"])
            .or_else(|| fault.text_at(&["Code", "Value"]))
            .unwrap_or_default();
        let message = fault
            .text_at(&["faultstring"])
            .or_else(|| fault.text_at(&["Reason", "Text"]))
            .unwrap_or_default();
        return Err(SoapError::Fault {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    let mut map = Map::new();
    for child in body.children {
        insert_child(&mut map, snake_case(&child.name), node_value(child));
    }
    Ok(Value::Object(map))
}

pub(crate) fn parse_document(xml: &str) -> Result<XmlNode, SoapError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(SoapError::xml)? {
            Event::Start(e) => stack.push(open_node(&e, &reader)?),
            Event::Empty(e) => {
                let node = open_node(&e, &reader)?;
                close_node(node, &mut stack, &mut root);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| SoapError::Xml("unbalanced end tag".to_string()))?;
                close_node(node, &mut stack, &mut root);
            }
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&t.decode().map_err(SoapError::xml)?);
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(node) = stack.last_mut() {
                    match r.resolve_char_ref().map_err(SoapError::xml)? {
                        Some(ch) => node.text.push(ch),
                        None => {
                            let name = r.decode().map_err(SoapError::xml)?;
                            match resolve_predefined_entity(&name) {
                                Some(resolved) => node.text.push_str(resolved),
                                None => node.text.push_str(&format!("&{};", name)),
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    if !stack.is_empty() {
        return Err(SoapError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| SoapError::Xml("empty document".to_string()))
}

fn open_node(start: &BytesStart, reader: &Reader<&[u8]>) -> Result<XmlNode, SoapError> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..XmlNode::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(SoapError::xml)?;
        let raw = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(SoapError::xml)?
            .into_owned();
        if raw == "xmlns" {
            node.namespaces.push((String::new(), value));
        } else if let Some(prefix) = raw.strip_prefix("xmlns:") {
            node.namespaces.push((prefix.to_string(), value));
        } else {
            let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            node.attributes.push((name, value));
        }
    }

    Ok(node)
}

fn close_node(mut node: XmlNode, stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>) {
    let trimmed = node.text.trim();
    if trimmed.len() != node.text.len() {
        node.text = trimmed.to_string();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn node_value(node: XmlNode) -> Value {
    if node.attributes.is_empty() && node.children.is_empty() {
        return if node.text.is_empty() {
            Value::Null
        } else {
            Value::String(node.text)
        };
    }

    let mut map = Map::new();
    for (name, value) in node.attributes {
        map.insert(format!("@{}", snake_case(&name)), Value::String(value));
    }
    if !node.text.is_empty() {
        map.insert(TEXT_KEY.to_string(), Value::String(node.text));
    }
    for child in node.children {
        insert_child(&mut map, snake_case(&child.name), node_value(child));
    }
    Value::Object(map)
}

// Repeated tags collapse into an array, in document order
fn insert_child(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

// `FetchHouseKeepingRoomStatus` → `fetch_house_keeping_room_status`,
// `HKStatusList` → `hk_status_list`, `Key1Track` → `key1_track`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            out.push('_');
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}
