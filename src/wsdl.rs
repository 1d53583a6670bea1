// WSDL inspection: target namespace, service address and, per operation,
// its SOAPAction and input element

use std::collections::{HashMap, HashSet};

use crate::error::SoapError;
use crate::xml_response::{parse_document, snake_case, XmlNode};

// One operation from the WSDL port type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsdlOperation {
    pub name: String,
    pub soap_action: Option<String>,
    pub input_element: Option<String>,
    // namespace URI the input element belongs to
    pub input_namespace: Option<String>,
    // children of the input element live in `input_namespace` too
    pub input_qualified: bool,
}

impl WsdlOperation {
    // Body element for a request, falls back to the operation name.
    pub fn request_element(&self) -> &str {
        self.input_element.as_deref().unwrap_or(&self.name)
    }
}

// WSDL document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wsdl {
    pub target_namespace: Option<String>,
    pub endpoint: Option<String>,
    pub operations: Vec<WsdlOperation>,
}

impl Wsdl {
    // Snake_cased operation names, in document order.
    pub fn operation_names(&self) -> Vec<String> {
        self.operations.iter().map(|op| snake_case(&op.name)).collect()
    }

    // Look an operation up by its snake_cased or original name.
    pub fn find_operation(&self, action: &str) -> Option<&WsdlOperation> {
        self.operations
            .iter()
            .find(|op| op.name == action || snake_case(&op.name) == action)
    }
}

fn split_qualified(qualified: &str) -> (&str, &str) {
    match qualified.find(':') {
        Some(index) => (&qualified[..index], &qualified[index + 1..]),
        None => ("", qualified),
    }
}

fn strip_prefix(qualified: &str) -> &str {
    split_qualified(qualified).1
}

// Innermost declaration wins
fn resolve_prefix<'a>(prefix: &str, scopes: &[&'a XmlNode]) -> Option<&'a str> {
    scopes.iter().rev().find_map(|node| {
        node.namespaces
            .iter()
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.as_str())
    })
}

fn attribute<'a>(node: &'a XmlNode, name: &str) -> Option<&'a str> {
    node.attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn children<'a>(node: &'a XmlNode, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
    node.children.iter().filter(move |c| c.name == name)
}

pub fn parse(bytes: &[u8]) -> Result<Wsdl, SoapError> {
    let text = std::str::from_utf8(bytes).map_err(|e| SoapError::Wsdl(e.to_string()))?;
    let definitions = parse_document(text).map_err(|e| SoapError::Wsdl(e.to_string()))?;

    if definitions.name != "definitions" {
        return Err(SoapError::Wsdl(format!(
            "expected definitions, found {}",
            definitions.name
        )));
    }

    // message name -> (element of its first part, namespace of that element)
    let messages: HashMap<&str, (&str, Option<&str>)> = children(&definitions, "message")
        .filter_map(|message| {
            let name = attribute(message, "name")?;
            let part = children(message, "part").next()?;
            let element = attribute(part, "element").or_else(|| attribute(part, "type"))?;
            let (prefix, local) = split_qualified(element);
            let namespace = resolve_prefix(prefix, &[&definitions, message, part]);
            Some((name, (local, namespace)))
        })
        .collect();

    // schemas declaring elementFormDefault="qualified", by target namespace
    let qualified_schemas: HashSet<&str> = children(&definitions, "types")
        .flat_map(|types| children(types, "schema"))
        .filter(|schema| attribute(schema, "elementFormDefault") == Some("qualified"))
        .filter_map(|schema| attribute(schema, "targetNamespace"))
        .collect();

    // first SOAPAction seen for each operation, across SOAP 1.1 and 1.2 bindings
    let mut soap_actions: HashMap<&str, &str> = HashMap::new();
    for binding in children(&definitions, "binding") {
        for operation in children(binding, "operation") {
            let Some(name) = attribute(operation, "name") else {
                continue;
            };
            let action = children(operation, "operation").find_map(|op| attribute(op, "soapAction"));
            if let Some(action) = action {
                soap_actions.entry(name).or_insert(action);
            }
        }
    }

    let port_type = children(&definitions, "portType")
        .next()
        .ok_or_else(|| SoapError::Wsdl("missing portType".to_string()))?;

    let mut operations = Vec::new();
    for operation in children(port_type, "operation") {
        let name = attribute(operation, "name")
            .ok_or_else(|| SoapError::Wsdl("operation without name".to_string()))?;
        let input = children(operation, "input")
            .next()
            .and_then(|input| attribute(input, "message"))
            .and_then(|message| messages.get(strip_prefix(message)));

        let input_namespace = input.and_then(|(_, namespace)| *namespace);

        operations.push(WsdlOperation {
            name: name.to_string(),
            soap_action: soap_actions.get(name).map(|action| action.to_string()),
            input_element: input.map(|(element, _)| element.to_string()),
            input_namespace: input_namespace.map(str::to_string),
            input_qualified: input_namespace.is_some_and(|ns| qualified_schemas.contains(ns)),
        });
    }

    let endpoint = children(&definitions, "service")
        .flat_map(|service| children(service, "port"))
        .flat_map(|port| children(port, "address"))
        .find_map(|address| attribute(address, "location"))
        .map(str::to_string);

    Ok(Wsdl {
        target_namespace: attribute(&definitions, "targetNamespace").map(str::to_string),
        endpoint,
        operations,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const GUEST_SERVICES_WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:tns="http://webservices.micros.com/ows/5.1/GuestServices.wsdl"
    xmlns:s1="http://webservices.micros.com/og/4.3/GuestServices/"
    targetNamespace="http://webservices.micros.com/ows/5.1/GuestServices.wsdl"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/">
  <wsdl:types>
    <s:schema elementFormDefault="qualified" targetNamespace="http://webservices.micros.com/og/4.3/GuestServices/" />
    <s:schema elementFormDefault="unqualified" targetNamespace="http://webservices.micros.com/og/4.3/HotelCommon/" />
  </wsdl:types>
  <wsdl:message name="UpdateRoomStatusSoapIn">
    <wsdl:part name="UpdateRoomStatusRequest" element="s1:UpdateRoomStatusRequest" />
  </wsdl:message>
  <wsdl:message name="UpdateRoomStatusSoapOut">
    <wsdl:part name="UpdateRoomStatusResponse" element="s1:UpdateRoomStatusResponse" />
  </wsdl:message>
  <wsdl:message name="WakeUpCallSoapIn">
    <wsdl:part name="WakeUpCallRequest" element="s1:WakeUpCallRequest" />
  </wsdl:message>
  <wsdl:portType name="GuestServicesSoap">
    <wsdl:operation name="UpdateRoomStatus">
      <wsdl:input message="tns:UpdateRoomStatusSoapIn" />
      <wsdl:output message="tns:UpdateRoomStatusSoapOut" />
    </wsdl:operation>
    <wsdl:operation name="WakeUpCall">
      <wsdl:input message="tns:WakeUpCallSoapIn" />
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="GuestServicesSoap" type="tns:GuestServicesSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="UpdateRoomStatus">
      <soap:operation soapAction="http://webservices.micros.com/ows/5.1/GuestServices.wsdl#UpdateRoomStatus" style="document" />
    </wsdl:operation>
    <wsdl:operation name="WakeUpCall">
      <soap:operation soapAction="http://webservices.micros.com/ows/5.1/GuestServices.wsdl#WakeUpCall" style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:binding name="GuestServicesSoap12" type="tns:GuestServicesSoap">
    <wsdl:operation name="WakeUpCall">
      <soap12:operation soapAction="urn:soap12#WakeUpCall" style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="GuestServices">
    <wsdl:port name="GuestServicesSoap" binding="tns:GuestServicesSoap">
      <soap:address location="http://ows.example.com/OWS_WS_51/GuestServices.asmx" />
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_parse_guest_services() {
        let wsdl = parse(GUEST_SERVICES_WSDL.as_bytes()).unwrap();

        assert_eq!(
            wsdl.target_namespace.as_deref(),
            Some("http://webservices.micros.com/ows/5.1/GuestServices.wsdl")
        );
        assert_eq!(
            wsdl.endpoint.as_deref(),
            Some("http://ows.example.com/OWS_WS_51/GuestServices.asmx")
        );
        assert_eq!(wsdl.operation_names(), vec!["update_room_status", "wake_up_call"]);

        let wake_up = wsdl.find_operation("wake_up_call").unwrap();
        assert_eq!(wake_up.request_element(), "WakeUpCallRequest");
        assert_eq!(
            wake_up.input_namespace.as_deref(),
            Some("http://webservices.micros.com/og/4.3/GuestServices/")
        );
        assert_eq!(
            wake_up.soap_action.as_deref(),
            Some("http://webservices.micros.com/ows/5.1/GuestServices.wsdl#WakeUpCall")
        );
        assert!(wake_up.input_qualified);
        assert!(wsdl.find_operation("UpdateRoomStatus").is_some());
        assert!(wsdl.find_operation("check_in").is_none());
    }

    #[test]
    fn test_operation_without_input_message() {
        let xml = r#"<definitions targetNamespace="urn:x"><portType><operation name="Ping"/></portType></definitions>"#;
        let wsdl = parse(xml.as_bytes()).unwrap();

        assert_eq!(wsdl.endpoint, None);
        assert_eq!(wsdl.operations[0].request_element(), "Ping");
        assert_eq!(wsdl.operations[0].soap_action, None);
        assert_eq!(wsdl.operations[0].input_namespace, None);
        assert!(!wsdl.operations[0].input_qualified);
    }

    #[test]
    fn test_unqualified_schema_leaves_children_local() {
        let xml = r#"<definitions xmlns:h="urn:hotel" xmlns:r="urn:room">
          <types>
            <schema targetNamespace="urn:hotel" />
            <schema targetNamespace="urn:room" elementFormDefault="qualified" />
          </types>
          <message name="HotelIn"><part name="p" element="h:HotelRequest"/></message>
          <message name="RoomIn"><part name="p" element="r:RoomRequest"/></message>
          <portType>
            <operation name="Hotel"><input message="HotelIn"/></operation>
            <operation name="Room"><input message="RoomIn"/></operation>
          </portType>
        </definitions>"#;
        let wsdl = parse(xml.as_bytes()).unwrap();

        let hotel = wsdl.find_operation("hotel").unwrap();
        assert_eq!(hotel.input_namespace.as_deref(), Some("urn:hotel"));
        assert!(!hotel.input_qualified);
        assert!(wsdl.find_operation("room").unwrap().input_qualified);
    }

    #[test]
    fn test_not_a_wsdl() {
        let result = parse(b"<html><body>Not found</body></html>");
        assert!(matches!(result, Err(SoapError::Wsdl(_))));

        let result = parse(b"<definitions></definitions>");
        assert!(matches!(result, Err(SoapError::Wsdl(_))));

        let result = parse(b"<definitions>");
        assert!(matches!(result, Err(SoapError::Wsdl(_))));
    }
}
