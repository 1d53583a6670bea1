// Housekeeping web service

use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ConnectionConfig;
use crate::endpoint::{
    string_or_number, Operation, OperationOptions, ServiceDescriptor, ServiceEndpoint,
};
use crate::invoker::SoapInvoker;

pub static DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    service: "HouseKeeping",
    namespaces: &[
        ("xmlns:hkeep", "http://webservices.micros.com/ows/5.1/HouseKeeping.wsdl"),
        ("xmlns:room", "http://webservices.micros.com/og/4.3/HouseKeeping/"),
    ],
};

// Inclusive range of room numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoomRange {
    #[serde(deserialize_with = "string_or_number")]
    pub from: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub to: Option<String>,
}

impl<T: ToString> From<RangeInclusive<T>> for RoomRange {
    fn from(range: RangeInclusive<T>) -> Self {
        let (from, to) = range.into_inner();
        Self {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoomStatusOptions {
    pub hotel_code: Option<String>,
    pub room: Option<RoomRange>,
}

impl RoomStatusOptions {
    pub fn new(hotel_code: impl Into<String>, room: impl Into<RoomRange>) -> Self {
        Self {
            hotel_code: Some(hotel_code.into()),
            room: Some(room.into()),
        }
    }
}

impl OperationOptions for RoomStatusOptions {
    fn is_blank(&self) -> bool {
        self.hotel_code.is_none() && self.room.is_none()
    }

    fn missing_field(&self) -> Option<&'static str> {
        match &self.room {
            None => Some("room"),
            Some(RoomRange { from: None, .. }) => Some("room.from"),
            Some(RoomRange { to: None, .. }) => Some("room.to"),
            Some(_) => None,
        }
    }
}

// Clean, vacant rooms of stay-over reservations within the range.
pub const ROOM_STATUS: Operation<RoomStatusOptions> = Operation {
    action: "fetch_house_keeping_room_status",
    response_key: "fetch_house_keeping_room_status_response",
    build: room_status_message,
};

fn room_status_message(options: &RoomStatusOptions) -> Value {
    let range = options.room.clone().unwrap_or_default();
    json!({
        "HotelReference": {"@hotelCode": options.hotel_code},
        "Criteria": {
            "FromRoom": range.from,
            "ToRoom": range.to,
            "RoomStatusList": {"Code": "CLEAN"},
            "HKStatusList": {"Code": "VACANT"},
            "FOStatusList": {"Code": "VACANT"},
            "ReservationStatusList": {"Code": "STAYOVER"},
        }
    })
}

pub struct Housekeeping {
    endpoint: ServiceEndpoint,
}

impl Housekeeping {
    pub fn new(config: Arc<ConnectionConfig>, invoker: Arc<dyn SoapInvoker>) -> Self {
        Self {
            endpoint: ServiceEndpoint::new(&DESCRIPTOR, config, invoker),
        }
    }

    pub async fn room_status(&self, options: &RoomStatusOptions) -> Map<String, Value> {
        self.endpoint.execute(&ROOM_STATUS, options).await.into_map()
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
    use test_case::test_case;

    fn housekeeping(stub: &Arc<StubInvoker>) -> Housekeeping {
        let config = ConnectionConfig::new("http://ows.example.com/OWS_WS_51", "u", "p");
        Housekeeping::new(Arc::new(config), stub.clone())
    }

    #[tokio::test]
    async fn test_room_status_returns_result() {
        let stub = Arc::new(StubInvoker::responding(json!({
            "fetch_house_keeping_room_status_response": {"result": {"status": "ok"}}
        })));

        let result = housekeeping(&stub)
            .room_status(&RoomStatusOptions::new("POSHIE", 1..=1))
            .await;

        assert_eq!(Value::Object(result), json!({"status": "ok"}));
        let call = stub.last_call().unwrap();
        assert_eq!(call.action, "fetch_house_keeping_room_status");
        assert_eq!(
            call.wsdl_url,
            "http://ows.example.com/OWS_WS_51/HouseKeeping.asmx?WSDL"
        );
        assert_eq!(
            call.message,
            json!({
                "HotelReference": {"@hotelCode": "POSHIE"},
                "Criteria": {
                    "FromRoom": "1",
                    "ToRoom": "1",
                    "RoomStatusList": {"Code": "CLEAN"},
                    "HKStatusList": {"Code": "VACANT"},
                    "FOStatusList": {"Code": "VACANT"},
                    "ReservationStatusList": {"Code": "STAYOVER"}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_options_from_json() {
        let stub = Arc::new(StubInvoker::responding(json!({})));
        let options: RoomStatusOptions = serde_json::from_value(json!({
            "hotel_code": "POSHIE",
            "room": {"from": 100, "to": "120A"}
        }))
        .unwrap();

        housekeeping(&stub).room_status(&options).await;

        let call = stub.last_call().unwrap();
        assert_eq!(call.message["Criteria"]["FromRoom"], "100");
        assert_eq!(call.message["Criteria"]["ToRoom"], "120A");
    }

    #[test_case(None; "no range")]
    #[test_case(Some(RoomRange { from: None, to: Some("10".to_string()) }); "no lower bound")]
    #[test_case(Some(RoomRange { from: Some("1".to_string()), to: None }); "no upper bound")]
    #[tokio::test]
    async fn test_incomplete_range_makes_no_request(room: Option<RoomRange>) {
        let stub = Arc::new(StubInvoker::responding(json!({
            "fetch_house_keeping_room_status_response": {"result": {"status": "ok"}}
        })));
        let options = RoomStatusOptions {
            hotel_code: Some("POSHIE".to_string()),
            room,
        };

        let result = housekeeping(&stub).room_status(&options).await;

        assert!(result.is_empty());
        assert_eq!(stub.build_count(), 0);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_and_failing_calls_are_empty() {
        let stub = Arc::new(StubInvoker::responding(json!({})));
        assert!(housekeeping(&stub)
            .room_status(&RoomStatusOptions::default())
            .await
            .is_empty());
        assert_eq!(stub.build_count(), 0);

        let stub = Arc::new(StubInvoker::failing(FailOn::BuildClient));
        assert!(housekeeping(&stub)
            .room_status(&RoomStatusOptions::new("POSHIE", 1..=10))
            .await
            .is_empty());
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_operations_listing() {
        let stub = Arc::new(
            StubInvoker::responding(Value::Null)
                .with_operations(&["fetch_house_keeping_room_status"]),
        );
        let mut housekeeping = housekeeping(&stub);

        assert_eq!(
            housekeeping.operations().await,
            vec!["fetch_house_keeping_room_status"]
        );
        assert_eq!(
            housekeeping.endpoint().namespaces().get("xmlns:room"),
            Some("http://webservices.micros.com/og/4.3/HouseKeeping/")
        );
    }
}
