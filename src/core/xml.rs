//! SOAP 1.1 document/literal envelopes and the loose XML → JSON view of
//! responses.

use crate::domain::model::RpcRequest;
use crate::utils::error::{BrtError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::fmt::Write;

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_FAULT_PREFIX: &str = "SOAP fault: ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first search, including `self`.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn is_nil(&self) -> bool {
        matches!(self.attribute("nil"), Some("true") | Some("1"))
    }

    /// Leaves become strings (`xsi:nil` becomes null), elements with children
    /// become objects, and repeated child names become arrays in document order.
    pub fn to_value(&self) -> Value {
        if self.is_nil() {
            return Value::Null;
        }
        if self.children.is_empty() {
            return Value::String(self.text.clone());
        }

        let mut map = Map::new();
        for child in &self.children {
            let value = child.to_value();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        Value::Object(map)
    }
}

fn local_name(qualified: &[u8]) -> String {
    let name = String::from_utf8_lossy(qualified);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn open_node(start: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode {
        name: local_name(start.name().as_ref()),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| BrtError::transport(format!("XML attribute error: {}", e)))?;
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((local_name(attr.key.as_ref()), value));
    }
    Ok(node)
}

/// Parses a whole document; namespace prefixes are dropped from element and
/// attribute names.
pub fn parse_document(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_node(&start)?),
            Event::Empty(start) => {
                let node = open_node(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| BrtError::transport("unbalanced XML document"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| BrtError::transport("empty XML document"))
}

pub fn build_envelope(namespace: &str, request: &RpcRequest) -> String {
    let mut xml = String::new();
    // String 寫入不會失敗
    let _ = write!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="{}" xmlns:ns="{}"><soapenv:Body><ns:{}><arg0>"#,
        SOAP_ENV_NS,
        escape(namespace),
        request.operation
    );
    for (name, value) in &request.fields {
        let _ = write!(xml, "<{0}>{1}</{0}>", name, escape(value.as_wire().as_str()));
    }
    let _ = write!(
        xml,
        "</arg0></ns:{}></soapenv:Body></soapenv:Envelope>",
        request.operation
    );
    xml
}

/// Extracts the payload of a SOAP response: the `return` element of the
/// first body child, as a JSON value. A `Fault` becomes a transport error.
pub fn parse_response(xml: &str) -> Result<Value> {
    let document = parse_document(xml)?;
    let body = document
        .find("Body")
        .ok_or_else(|| BrtError::transport("SOAP response has no Body"))?;

    if let Some(fault) = body.child("Fault") {
        let message = fault
            .child("faultstring")
            .map(|f| f.text.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unspecified SOAP fault".to_string());
        return Err(BrtError::transport(format!("{}{}", SOAP_FAULT_PREFIX, message)));
    }

    let response = body
        .children
        .first()
        .ok_or_else(|| BrtError::transport("SOAP Body is empty"))?;

    Ok(response.child("return").unwrap_or(response).to_value())
}

pub fn is_soap_fault(error: &BrtError) -> bool {
    matches!(error, BrtError::Transport { message } if message.starts_with(SOAP_FAULT_PREFIX))
}

/// What the invoker needs from a service definition document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    pub target_namespace: String,
    pub address: Option<String>,
}

pub fn parse_definition(xml: &str) -> Result<ServiceDescription> {
    let document = parse_document(xml)?;
    let definitions = document
        .find("definitions")
        .ok_or_else(|| BrtError::transport("service definition has no <definitions> root"))?;

    let target_namespace = definitions
        .attribute("targetNamespace")
        .ok_or_else(|| BrtError::transport("service definition has no targetNamespace"))?
        .to_string();

    let address = definitions
        .find("service")
        .and_then(|service| service.find("address"))
        .and_then(|address| address.attribute("location"))
        .map(str::to_string);

    Ok(ServiceDescription {
        target_namespace,
        address,
    })
}
