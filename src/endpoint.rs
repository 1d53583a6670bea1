// Generic OWS service endpoint shared by every façade
//
// Blank or incomplete options short-circuit, transport errors are logged and
// swallowed, and the payload is read from `body[<response_key>]["result"]`.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, Namespaces};
use crate::error::SoapError;
use crate::invoker::{ClientHandle, SoapInvoker};

const RESULT_KEY: &str = "result";

// WSDL service name plus the namespaces its messages rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub namespaces: &'static [(&'static str, &'static str)],
}

// Options accepted by an operation.
pub trait OperationOptions {
    // True when the caller supplied nothing at all.
    fn is_blank(&self) -> bool;

    // Name of a field the request cannot go out without, if one is missing.
    fn missing_field(&self) -> Option<&'static str> {
        None
    }
}

// Room numbers and codes arrive either as strings or as bare numbers
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Text(text) => text,
        Loose::Number(number) => number.to_string(),
    }))
}

// One remote operation: its action, where its payload lives in the
// response and how its message is built from the options.
pub struct Operation<O> {
    pub action: &'static str,
    pub response_key: &'static str,
    pub build: fn(&O) -> Value,
}

impl<O> Operation<O> {
    pub fn message(&self, options: &O) -> Value {
        (self.build)(options)
    }
}

// Result of one `ServiceEndpoint::execute`.
#[derive(Debug)]
pub enum CallOutcome {
    Data(Map<String, Value>),
    // The call went through but nothing sat at the result path.
    Empty,
    // Blank or incomplete options, no request was made.
    Skipped,
    Failed(SoapError),
}

impl CallOutcome {
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            CallOutcome::Data(map) => map,
            _ => Map::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CallOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&SoapError> {
        match self {
            CallOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub struct ServiceEndpoint {
    descriptor: &'static ServiceDescriptor,
    config: Arc<ConnectionConfig>,
    invoker: Arc<dyn SoapInvoker>,
    namespaces: Namespaces,
    operations: Vec<String>,
}

impl ServiceEndpoint {
    pub fn new(
        descriptor: &'static ServiceDescriptor,
        config: Arc<ConnectionConfig>,
        invoker: Arc<dyn SoapInvoker>,
    ) -> Self {
        let mut namespaces = config.namespaces().clone();
        namespaces.merge(descriptor.namespaces.iter().copied());

        Self {
            descriptor,
            config,
            invoker,
            namespaces,
            operations: Vec::new(),
        }
    }

    pub fn service(&self) -> &'static str {
        self.descriptor.service
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    // Add namespaces to this endpoint only.
    pub fn merge_namespaces<I, K, V>(&mut self, extra: I) -> &Namespaces
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.namespaces.merge(extra);
        &self.namespaces
    }

    pub async fn execute<O: OperationOptions>(
        &self,
        operation: &Operation<O>,
        options: &O,
    ) -> CallOutcome {
        if options.is_blank() {
            debug!(
                service = self.service(),
                action = operation.action,
                "blank options, skipping call"
            );
            return CallOutcome::Skipped;
        }
        if let Some(field) = options.missing_field() {
            debug!(
                service = self.service(),
                action = operation.action,
                field,
                "incomplete options, skipping call"
            );
            return CallOutcome::Skipped;
        }

        let message = operation.message(options);
        match self.invoke(operation.action, &message).await {
            Ok(body) => match body.get(operation.response_key).and_then(|r| r.get(RESULT_KEY)) {
                Some(Value::Object(result)) => CallOutcome::Data(result.clone()),
                _ => CallOutcome::Empty,
            },
            Err(err) => {
                warn!(
                    service = self.service(),
                    action = operation.action,
                    error = %err,
                    "OWS call failed"
                );
                CallOutcome::Failed(err)
            }
        }
    }

    async fn client(&self) -> Result<Box<dyn ClientHandle>, SoapError> {
        self.invoker
            .build_client(
                &self.config.wsdl_url(self.service()),
                &self.namespaces,
                &self.config.auth_header(),
            )
            .await
    }

    async fn invoke(&self, action: &str, message: &Value) -> Result<Value, SoapError> {
        let client = self.client().await?;
        debug!(service = self.service(), action, "calling OWS");
        client.call(action, message).await
    }

    // Operation names advertised by the service WSDL.
    //
    // A non-empty list is cached for the lifetime of the endpoint. Anything
    // going wrong yields an empty list and clears the cache.
    pub async fn operations(&mut self) -> Vec<String> {
        if !self.operations.is_empty() {
            return self.operations.clone();
        }
        if !self.config.has_http_url() {
            debug!(
                service = self.service(),
                base_url = self.config.base_url(),
                "no http base URL, skipping discovery"
            );
            return Vec::new();
        }

        match self.discover().await {
            Ok(operations) => {
                self.operations = operations;
                self.operations.clone()
            }
            Err(err) => {
                warn!(service = self.service(), error = %err, "operation discovery failed");
                self.operations.clear();
                Vec::new()
            }
        }
    }

    async fn discover(&self) -> Result<Vec<String>, SoapError> {
        self.client().await?.list_operations().await
    }
}
