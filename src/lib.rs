// Client library for the Oracle Hospitality OPERA Web Self-Service (OWS) SOAP API

use std::sync::Arc;

pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod guest_services;
pub mod housekeeping;
pub mod information;
pub mod invoker;
pub mod reservation;
pub mod resv_advanced;
pub mod wsdl;
pub mod xml_response;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use config::{ConnectionConfig, Namespaces};
pub use endpoint::{CallOutcome, Operation, OperationOptions, ServiceDescriptor, ServiceEndpoint};
pub use error::{ConfigError, SoapError};
pub use guest_services::{GuestServices, RoomOptions};
pub use housekeeping::{Housekeeping, RoomRange, RoomStatusOptions};
pub use information::{HotelOptions, Information};
pub use invoker::{ClientHandle, HttpSoapInvoker, SoapInvoker};
pub use reservation::{PreCheckinOptions, Reservation};
pub use resv_advanced::{KeyTrackOptions, ReservationAdvanced};

// Entry point sharing one connection and one transport across every service.
#[derive(Clone)]
pub struct OracleOws {
    config: Arc<ConnectionConfig>,
    invoker: Arc<dyn SoapInvoker>,
}

impl OracleOws {
    // Talk to OWS over HTTP.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_invoker(config, Arc::new(HttpSoapInvoker::new()))
    }

    pub fn with_invoker(config: ConnectionConfig, invoker: Arc<dyn SoapInvoker>) -> Self {
        Self {
            config: Arc::new(config),
            invoker,
        }
    }

    // Build from the `URL`, `USERNAME` and `PASSWORD` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ConnectionConfig::from_env()?))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(ConnectionConfig::from_lookup(lookup)?))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn guest_services(&self) -> GuestServices {
        GuestServices::new(self.config.clone(), self.invoker.clone())
    }

    pub fn housekeeping(&self) -> Housekeeping {
        Housekeeping::new(self.config.clone(), self.invoker.clone())
    }

    pub fn information(&self) -> Information {
        Information::new(self.config.clone(), self.invoker.clone())
    }

    pub fn reservation(&self) -> Reservation {
        Reservation::new(self.config.clone(), self.invoker.clone())
    }

    pub fn reservation_advanced(&self) -> ReservationAdvanced {
        ReservationAdvanced::new(self.config.clone(), self.invoker.clone())
    }
}
