// Guest Services web service: room status updates and wake up calls

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ConnectionConfig;
use crate::endpoint::{
    string_or_number, Operation, OperationOptions, ServiceDescriptor, ServiceEndpoint,
};
use crate::invoker::SoapInvoker;

pub static DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    service: "GuestServices",
    namespaces: &[
        ("xmlns:gue", "http://webservices.micros.com/og/4.3/GuestServices/"),
        ("xmlns:hot", "http://webservices.micros.com/og/4.3/HotelCommon/"),
    ],
};

// Hotel and room a guest service request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoomOptions {
    pub hotel_code: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub room: Option<String>,
}

impl RoomOptions {
    pub fn new(hotel_code: impl Into<String>, room: impl ToString) -> Self {
        Self {
            hotel_code: Some(hotel_code.into()),
            room: Some(room.to_string()),
        }
    }
}

impl OperationOptions for RoomOptions {
    fn is_blank(&self) -> bool {
        self.hotel_code.is_none() && self.room.is_none()
    }
}

// Room is flagged clean, turned down and do-not-disturb in one go
pub const UPDATE_ROOM_STATUS: Operation<RoomOptions> = Operation {
    action: "update_room_status",
    response_key: "update_room_status_response",
    build: update_room_status_message,
};

pub const WAKE_UP_CALL: Operation<RoomOptions> = Operation {
    action: "wake_up_call",
    response_key: "wake_up_call_response",
    build: wake_up_call_message,
};

fn update_room_status_message(options: &RoomOptions) -> Value {
    json!({
        "HotelReference": {"@hotelCode": options.hotel_code},
        "RoomNumber": options.room,
        "RoomStatus": "Clean",
        "TurnDownStatus": "Completed",
        "GuestServiceStatus": "DoNotDisturb",
    })
}

fn wake_up_call_message(options: &RoomOptions) -> Value {
    json!({
        "HotelReference": {"@hotelCode": options.hotel_code},
        "RoomNumber": options.room,
    })
}

pub struct GuestServices {
    endpoint: ServiceEndpoint,
}

impl GuestServices {
    pub fn new(config: Arc<ConnectionConfig>, invoker: Arc<dyn SoapInvoker>) -> Self {
        Self {
            endpoint: ServiceEndpoint::new(&DESCRIPTOR, config, invoker),
        }
    }

    pub async fn update_room_status(&self, options: &RoomOptions) -> Map<String, Value> {
        self.endpoint
            .execute(&UPDATE_ROOM_STATUS, options)
            .await
            .into_map()
    }

    pub async fn wake_up_call(&self, options: &RoomOptions) -> Map<String, Value> {
        self.endpoint.execute(&WAKE_UP_CALL, options).await.into_map()
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
