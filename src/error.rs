// Error types shared by the transport, the XML layer and the configuration

use thiserror::Error;

// Fatal configuration problems, surfaced when the client is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration key: {0}")]
    MissingKey(&'static str),
}

// Everything that can go wrong while talking to an OWS endpoint.
// None of these escape a service endpoint: they end up in `CallOutcome::Failed`.
#[derive(Error, Debug)]
pub enum SoapError {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("WSDL error: {0}")]
    Wsdl(String),

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl SoapError {
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapError::Fault { .. })
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        SoapError::Xml(err.to_string())
    }
}
