// Reservation web service

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ConnectionConfig;
use crate::endpoint::{
    string_or_number, Operation, OperationOptions, ServiceDescriptor, ServiceEndpoint,
};
use crate::information::HotelOptions;
use crate::invoker::SoapInvoker;

pub static DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    service: "Reservation",
    namespaces: &[
        ("xmlns:res", "http://webservices.micros.com/ows/5.1/Reservation.wsdl"),
        ("xmlns:res1", "http://webservices.micros.com/og/4.3/Reservation/"),
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreCheckinOptions {
    pub hotel_code: Option<String>,
    pub chain_code: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub confirmation: Option<String>,
}

impl OperationOptions for PreCheckinOptions {
    fn is_blank(&self) -> bool {
        self.hotel_code.is_none() && self.chain_code.is_none() && self.confirmation.is_none()
    }
}

pub const PRE_CHECKIN: Operation<PreCheckinOptions> = Operation {
    action: "pre_checkin",
    response_key: "pre_checkin_response",
    build: pre_checkin_message,
};

pub const FETCH_BOOKED_INVENTORY_ITEMS: Operation<HotelOptions> = Operation {
    action: "fetch_booked_inventory_items",
    response_key: "fetch_booked_inventory_items_response",
    build: booked_inventory_message,
};

fn pre_checkin_message(options: &PreCheckinOptions) -> Value {
    json!({
        "HotelReference": {
            "@hotelCode": options.hotel_code,
            "@chainCode": options.chain_code,
        },
        "ConfirmationNumber": options.confirmation,
    })
}

fn booked_inventory_message(options: &HotelOptions) -> Value {
    json!({"HotelReference": {"@hotelCode": options.hotel_code}})
}

pub struct Reservation {
    endpoint: ServiceEndpoint,
}

impl Reservation {
    pub fn new(config: Arc<ConnectionConfig>, invoker: Arc<dyn SoapInvoker>) -> Self {
        Self {
            endpoint: ServiceEndpoint::new(&DESCRIPTOR, config, invoker),
        }
    }

    pub async fn pre_checkin(&self, options: &PreCheckinOptions) -> Map<String, Value> {
        self.endpoint.execute(&PRE_CHECKIN, options).await.into_map()
    }

    pub async fn fetch_booked_inventory_items(&self, options: &HotelOptions) -> Map<String, Value> {
        self.endpoint
            .execute(&FETCH_BOOKED_INVENTORY_ITEMS, options)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailOn, StubInvoker};

    fn reservation(stub: &Arc<StubInvoker>) -> Reservation {
        let config = ConnectionConfig::new("http://ows.example.com/OWS_WS_51", "u", "p");
        Reservation::new(Arc::new(config), stub.clone())
    }

    #[tokio::test]
    async fn test_pre_checkin() {
        let stub = Arc::new(StubInvoker::responding(json!({
            "pre_checkin_response": {"result": {"@result_status_flag": "SUCCESS"}}
        })));
        let options: PreCheckinOptions = serde_json::from_value(json!({
            "hotel_code": "POSHIE",
            "chain_code": "CHA",
            "confirmation": 123456
        }))
        .unwrap();

        let result = reservation(&stub).pre_checkin(&options).await;

        assert_eq!(result["@result_status_flag"], "SUCCESS");
        let call = stub.last_call().unwrap();
        assert_eq!(call.action, "pre_checkin");
        assert_eq!(
            call.wsdl_url,
            "http://ows.example.com/OWS_WS_51/Reservation.asmx?WSDL"
        );
        assert_eq!(
            call.message,
            json!({
                "HotelReference": {"@hotelCode": "POSHIE", "@chainCode": "CHA"},
                "ConfirmationNumber": "123456"
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_booked_inventory_items() {
        let stub = Arc::new(StubInvoker::responding(json!({
            "fetch_booked_inventory_items_response": {"result": {"items": ["a", "b"]}}
        })));

        let result = reservation(&stub)
            .fetch_booked_inventory_items(&HotelOptions::new("POSHIE"))
            .await;

        assert_eq!(Value::Object(result), json!({"items": ["a", "b"]}));
        let call = stub.last_call().unwrap();
        assert_eq!(call.action, "fetch_booked_inventory_items");
        assert_eq!(call.message, json!({"HotelReference": {"@hotelCode": "POSHIE"}}));
    }

    #[tokio::test]
    async fn test_blank_and_failure() {
        let stub = Arc::new(StubInvoker::failing(FailOn::BuildClient));
        let reservation = reservation(&stub);

        assert!(reservation.pre_checkin(&PreCheckinOptions::default()).await.is_empty());
        assert_eq!(stub.build_count(), 0);

        let options = PreCheckinOptions {
            confirmation: Some("1".to_string()),
            ..Default::default()
        };
        assert!(reservation.pre_checkin(&options).await.is_empty());
        assert!(reservation
            .fetch_booked_inventory_items(&HotelOptions::new("POSHIE"))
            .await
            .is_empty());
        assert_eq!(stub.build_count(), 2);
    }

    #[test]
    fn test_service_namespaces() {
        let stub = Arc::new(StubInvoker::responding(Value::Null));
        let namespaces = reservation(&stub).endpoint().namespaces().clone();

        assert_eq!(
            namespaces.get("xmlns:res1"),
            Some("http://webservices.micros.com/og/4.3/Reservation/")
        );
        assert_eq!(
            namespaces.get("xmlns:res"),
            Some("http://webservices.micros.com/ows/5.1/Reservation.wsdl")
        );
    }
}
