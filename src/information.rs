// Information web service

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ConnectionConfig;
use crate::endpoint::{Operation, OperationOptions, ServiceDescriptor, ServiceEndpoint};
use crate::invoker::SoapInvoker;

pub static DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    service: "Information",
    namespaces: &[("xmlns:inf", "http://webservices.micros.com/ows/5.1/Information.wsdl")],
};

// Options naming a single hotel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HotelOptions {
    pub hotel_code: Option<String>,
}

impl HotelOptions {
    pub fn new(hotel_code: impl Into<String>) -> Self {
        Self {
            hotel_code: Some(hotel_code.into()),
        }
    }
}

impl OperationOptions for HotelOptions {
    fn is_blank(&self) -> bool {
        self.hotel_code.is_none()
    }
}

pub const HOTEL_INFORMATION: Operation<HotelOptions> = Operation {
    action: "query_hotel_information",
    response_key: "hotel_information_response",
    build: hotel_information_message,
};

fn hotel_information_message(options: &HotelOptions) -> Value {
    json!({"HotelInformationQuery": {"@hotelCode": options.hotel_code}})
}

pub struct Information {
    endpoint: ServiceEndpoint,
}

impl Information {
    pub fn new(config: Arc<ConnectionConfig>, invoker: Arc<dyn SoapInvoker>) -> Self {
        Self {
            endpoint: ServiceEndpoint::new(&DESCRIPTOR, config, invoker),
        }
    }

    pub async fn hotel_information(&self, options: &HotelOptions) -> Map<String, Value> {
        self.endpoint
            .execute(&HOTEL_INFORMATION, options)
            .await
            .into_map()
    }

    pub async fn operations(&mut self) -> Vec<String> {
        self.endpoint.operations().await
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut ServiceEndpoint {
        &mut self.endpoint
    }
}
