//! Realtime event protocol carried over the `/ws` socket.
//!
//! Frames are JSON objects tagged by a `type` field. Only `wire_update` has a
//! defined meaning; every other tag parses as [`RealtimeEvent::Other`] so new
//! server events never break older clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::WireStatus;

pub const WS_PATH: &str = "/ws";
pub const WIRE_UPDATE: &str = "wire_update";
pub const ACK: &str = "ack";

/// Payload of a `wire_update` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireUpdateEvent {
    pub wire_id: i64,
    pub status: WireStatus,
    pub user_id: i64,
    /// Server clock reading when the event was emitted.
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    WireUpdate(WireUpdateEvent),
    Other { kind: String, payload: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("event is not a JSON object")]
    NotAnObject,
    #[error("event has no string `type` field")]
    MissingType,
    #[error("malformed `{kind}` event: {reason}")]
    Malformed { kind: String, reason: String },
}

impl RealtimeEvent {
    pub fn parse(text: &str) -> Result<Self, EventParseError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| EventParseError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, EventParseError> {
        let Some(object) = value.as_object() else {
            return Err(EventParseError::NotAnObject);
        };
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EventParseError::MissingType)?
            .to_string();

        if kind == WIRE_UPDATE {
            let event = serde_json::from_value::<WireUpdateEvent>(value).map_err(|e| {
                EventParseError::Malformed {
                    kind,
                    reason: e.to_string(),
                }
            })?;
            return Ok(RealtimeEvent::WireUpdate(event));
        }

        Ok(RealtimeEvent::Other {
            kind,
            payload: value,
        })
    }

    /// The `type` tag this event was sent with.
    pub fn kind(&self) -> &str {
        match self {
            RealtimeEvent::WireUpdate(_) => WIRE_UPDATE,
            RealtimeEvent::Other { kind, .. } => kind,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RealtimeEvent::WireUpdate(event) => {
                let mut value = serde_json::to_value(event).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut value {
                    map.insert("type".to_string(), Value::String(WIRE_UPDATE.to_string()));
                }
                value
            }
            RealtimeEvent::Other { payload, .. } => payload.clone(),
        }
    }
}

impl Serialize for RealtimeEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_update() {
        let text = r#"{"type":"wire_update","wire_id":1,"status":"completed","user_id":3,"timestamp":12.5}"#;
        let event = RealtimeEvent::parse(text).unwrap();
        assert_eq!(
            event,
            RealtimeEvent::WireUpdate(WireUpdateEvent {
                wire_id: 1,
                status: WireStatus::Completed,
                user_id: 3,
                timestamp: 12.5,
            })
        );
        assert_eq!(event.kind(), "wire_update");
    }

    #[test]
    fn unknown_tags_are_accepted() {
        let event = RealtimeEvent::parse(r#"{"type":"ack","message":"Message received"}"#).unwrap();
        assert_eq!(event.kind(), "ack");
        assert!(matches!(event, RealtimeEvent::Other { .. }));
    }

    #[test]
    fn rejects_bad_frames() {
        assert!(matches!(
            RealtimeEvent::parse("{not json"),
            Err(EventParseError::Json(_))
        ));
        assert_eq!(
            RealtimeEvent::parse("[1,2]"),
            Err(EventParseError::NotAnObject)
        );
        assert_eq!(
            RealtimeEvent::parse(r#"{"wire_id":1}"#),
            Err(EventParseError::MissingType)
        );
        assert!(matches!(
            RealtimeEvent::parse(r#"{"type":"wire_update","wire_id":"x"}"#),
            Err(EventParseError::Malformed { .. })
        ));
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = RealtimeEvent::WireUpdate(WireUpdateEvent {
            wire_id: 9,
            status: WireStatus::Processing,
            user_id: 1,
            timestamp: 0.0,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("wire_update"));
        assert_eq!(value["status"], json!("processing"));
    }
}
