// SOAP transport capability injected into every service endpoint

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::Namespaces;
use crate::envelope::{build_envelope, qualify_children};
use crate::error::SoapError;
use crate::wsdl::{self, Wsdl, WsdlOperation};
use crate::xml_response::parse_response;

const SOAP_CONTENT_TYPE: &str = "text/xml;charset=UTF-8";
const SOAP_ACTION_HEADER: &str = "SOAPAction";
const WSDL_PREFIX: &str = "wsdl";

// Builds a client for one WSDL.
#[async_trait]
pub trait SoapInvoker: Send + Sync {
    async fn build_client(
        &self,
        wsdl_url: &str,
        namespaces: &Namespaces,
        auth_header: &Value,
    ) -> Result<Box<dyn ClientHandle>, SoapError>;
}

// A client bound to one service.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    // Invoke `action` (snake_cased operation name) and return the parsed body.
    async fn call(&self, action: &str, message: &Value) -> Result<Value, SoapError>;

    // Snake_cased names of every operation the service advertises.
    async fn list_operations(&self) -> Result<Vec<String>, SoapError>;
}

// Production transport: fetches the WSDL and posts envelopes over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpSoapInvoker {
    http: reqwest::Client,
}

impl HttpSoapInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    // Use a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch_wsdl(&self, wsdl_url: &str) -> Result<Bytes, SoapError> {
        let response = self.http.get(wsdl_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SoapError::Http {
                status: status.as_u16(),
                url: wsdl_url.to_string(),
            });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl SoapInvoker for HttpSoapInvoker {
    async fn build_client(
        &self,
        wsdl_url: &str,
        namespaces: &Namespaces,
        auth_header: &Value,
    ) -> Result<Box<dyn ClientHandle>, SoapError> {
        debug!(wsdl_url, "fetching WSDL");
        let body = self.fetch_wsdl(wsdl_url).await?;
        let wsdl = wsdl::parse(&body)?;

        let endpoint = match &wsdl.endpoint {
            Some(location) => location.clone(),
            None => wsdl_url.split('?').next().unwrap_or(wsdl_url).to_string(),
        };
        debug!(
            %endpoint,
            operations = wsdl.operations.len(),
            "WSDL loaded"
        );

        Ok(Box::new(HttpClientHandle {
            http: self.http.clone(),
            endpoint,
            wsdl,
            namespaces: namespaces.clone(),
            auth_header: auth_header.clone(),
        }))
    }
}

struct HttpClientHandle {
    http: reqwest::Client,
    endpoint: String,
    wsdl: Wsdl,
    namespaces: Namespaces,
    auth_header: Value,
}

impl HttpClientHandle {
    // Prefix for the input element's namespace: one the envelope already
    // declares, otherwise `wsdl` declared for it
    fn qualify(&self, operation: &WsdlOperation) -> (Namespaces, Option<String>) {
        let uri = operation
            .input_namespace
            .as_deref()
            .or(self.wsdl.target_namespace.as_deref());

        let Some(uri) = uri else {
            return (self.namespaces.clone(), None);
        };

        let declared = self
            .namespaces
            .iter()
            .find(|(_, declared_uri)| *declared_uri == uri)
            .and_then(|(key, _)| key.strip_prefix("xmlns:"));
        if let Some(prefix) = declared {
            return (self.namespaces.clone(), Some(prefix.to_string()));
        }

        let mut namespaces = self.namespaces.clone();
        namespaces.merge([(format!("xmlns:{WSDL_PREFIX}"), uri)]);
        (namespaces, Some(WSDL_PREFIX.to_string()))
    }
}

#[async_trait]
impl ClientHandle for HttpClientHandle {
    async fn call(&self, action: &str, message: &Value) -> Result<Value, SoapError> {
        let operation = self
            .wsdl
            .find_operation(action)
            .ok_or_else(|| SoapError::UnknownOperation(action.to_string()))?;

        let (namespaces, prefix) = self.qualify(operation);
        let envelope = match prefix {
            Some(prefix) => {
                let element = format!("{prefix}:{}", operation.request_element());
                let message = if operation.input_qualified {
                    qualify_children(message, &prefix)
                } else {
                    message.clone()
                };
                build_envelope(&namespaces, &self.auth_header, &element, &message)?
            }
            None => build_envelope(
                &namespaces,
                &self.auth_header,
                operation.request_element(),
                message,
            )?,
        };
        let soap_action = operation.soap_action.as_deref().unwrap_or(&operation.name);

        debug!(endpoint = %self.endpoint, action, soap_action, "SOAP request\n{envelope}");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header(SOAP_ACTION_HEADER, format!("\"{soap_action}\""))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), action, "SOAP response\n{text}");

        // Faults come back with HTTP 500, so the body is read before the status
        match parse_response(&text) {
            Err(fault @ SoapError::Fault { .. }) => Err(fault),
            _ if !status.is_success() => Err(SoapError::Http {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            }),
            parsed => parsed,
        }
    }

    async fn list_operations(&self) -> Result<Vec<String>, SoapError> {
        Ok(self.wsdl.operation_names())
    }
}
