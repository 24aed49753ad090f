//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is one JSON object with an `event` field. Server-to-client
//! traffic is always `{"event":"trigger","trigger":<name>,"data":<payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::game::geometry::Vec2;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Named application-level event
    Trigger {
        trigger: String,
        #[serde(default)]
        data: Value,
    },

    /// Key went down
    KeyPressed { key: u32 },

    /// Key went up
    KeyReleased { key: u32 },

    /// Mouse button went down
    MousePressed { button: u32 },

    /// Mouse button went up
    MouseReleased { button: u32 },

    /// Absolute cursor position in world coordinates
    MouseMoved { position: Vec2 },
}

impl ClientMsg {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sent once to a new connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configure {
    /// Id of the receiving client's own player
    pub id: Uuid,
    /// Top-left corners of every barrier
    pub barriers: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConnect {
    pub id: Uuid,
    pub posn: Vec2,
    pub velocity: Vec2,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerHit {
    pub id: Uuid,
    pub damage: i32,
}

/// Per-tick authoritative player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosn {
    pub id: Uuid,
    pub posn: Vec2,
    pub velocity: Vec2,
    /// Degrees
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnBullet {
    pub id: Uuid,
    pub posn: Vec2,
    pub velocity: Vec2,
}

/// Payload naming a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: Uuid,
}

/// Latency probe payload, used by both `ping` and `pong`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    /// Client timestamp, echoed back untouched
    pub t: u64,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "trigger", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Configure(Configure),
    PlayerConnect(PlayerConnect),
    PlayerDisconnect(EntityRef),
    PlayerHit(PlayerHit),
    PlayerPosn(PlayerPosn),
    PlayerDied(EntityRef),
    SpawnBullet(SpawnBullet),
    KillBullet(EntityRef),
    Pong(Ping),
}

impl ServerEvent {
    /// Trigger name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Configure(_) => "configure",
            ServerEvent::PlayerConnect(_) => "player_connect",
            ServerEvent::PlayerDisconnect(_) => "player_disconnect",
            ServerEvent::PlayerHit(_) => "player_hit",
            ServerEvent::PlayerPosn(_) => "player_posn",
            ServerEvent::PlayerDied(_) => "player_died",
            ServerEvent::SpawnBullet(_) => "spawn_bullet",
            ServerEvent::KillBullet(_) => "kill_bullet",
            ServerEvent::Pong(_) => "pong",
        }
    }

    /// Build an event from a trigger name and its payload.
    /// Unknown names are `Ok(None)`; a bad payload for a known name is an error.
    pub fn from_trigger(name: &str, data: Value) -> Result<Option<Self>, ProtocolError> {
        let event = match name {
            "configure" => ServerEvent::Configure(serde_json::from_value(data)?),
            "player_connect" => ServerEvent::PlayerConnect(serde_json::from_value(data)?),
            "player_disconnect" => ServerEvent::PlayerDisconnect(serde_json::from_value(data)?),
            "player_hit" => ServerEvent::PlayerHit(serde_json::from_value(data)?),
            "player_posn" => ServerEvent::PlayerPosn(serde_json::from_value(data)?),
            "player_died" => ServerEvent::PlayerDied(serde_json::from_value(data)?),
            "spawn_bullet" => ServerEvent::SpawnBullet(serde_json::from_value(data)?),
            "kill_bullet" => ServerEvent::KillBullet(serde_json::from_value(data)?),
            "pong" => ServerEvent::Pong(serde_json::from_value(data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Serialize into a trigger envelope
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("event".to_string(), Value::from(TRIGGER_EVENT));
        }
        Ok(serde_json::to_string(&value)?)
    }

    /// Parse a server frame. Frames that are not triggers, and triggers with
    /// names this client does not know, decode to `None`.
    pub fn decode(text: &str) -> Result<Option<Self>, ProtocolError> {
        let envelope: IncomingEnvelope = serde_json::from_str(text)?;
        if envelope.event != TRIGGER_EVENT {
            return Ok(None);
        }
        let name = envelope.trigger.ok_or(ProtocolError::MissingTrigger)?;
        Self::from_trigger(&name, envelope.data)
    }
}

const TRIGGER_EVENT: &str = "trigger";

#[derive(Debug, Deserialize)]
struct IncomingEnvelope {
    event: String,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Trigger envelope without a trigger name")]
    MissingTrigger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_client_input_events() {
        assert_eq!(
            ClientMsg::decode(r#"{"event":"keyPressed","key":87}"#).unwrap(),
            ClientMsg::KeyPressed { key: 87 }
        );
        assert_eq!(
            ClientMsg::decode(r#"{"event":"mouseReleased","button":0}"#).unwrap(),
            ClientMsg::MouseReleased { button: 0 }
        );
        assert_eq!(
            ClientMsg::decode(r#"{"event":"mouseMoved","position":{"x":1.5,"y":-2}}"#).unwrap(),
            ClientMsg::MouseMoved {
                position: Vec2::new(1.5, -2.0)
            }
        );
    }

    #[test]
    fn decodes_client_trigger_with_and_without_data() {
        assert_eq!(
            ClientMsg::decode(r#"{"event":"trigger","trigger":"ping","data":{"t":5}}"#).unwrap(),
            ClientMsg::Trigger {
                trigger: "ping".to_string(),
                data: json!({"t": 5}),
            }
        );
        assert_eq!(
            ClientMsg::decode(r#"{"event":"trigger","trigger":"noop"}"#).unwrap(),
            ClientMsg::Trigger {
                trigger: "noop".to_string(),
                data: Value::Null,
            }
        );
    }

    #[test]
    fn rejects_malformed_client_messages() {
        assert!(ClientMsg::decode("not json").is_err());
        assert!(ClientMsg::decode(r#"{"event":"teleport","x":1}"#).is_err());
        assert!(ClientMsg::decode(r#"{"event":"keyPressed"}"#).is_err());
        assert!(ClientMsg::decode(r#"{"key":87}"#).is_err());
    }

    #[test]
    fn server_event_envelope_shape() {
        let id = Uuid::new_v4();
        let frame = ServerEvent::PlayerHit(PlayerHit { id, damage: 10 })
            .encode()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "trigger");
        assert_eq!(value["trigger"], "player_hit");
        assert_eq!(value["data"]["id"], id.to_string());
        assert_eq!(value["data"]["damage"], 10);
    }

    #[test]
    fn player_posn_field_names() {
        let frame = ServerEvent::PlayerPosn(PlayerPosn {
            id: Uuid::new_v4(),
            posn: Vec2::new(1.0, 2.0),
            velocity: Vec2::new(5.0, 0.0),
            angle: 90.0,
        })
        .encode()
        .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["data"]["posn"], json!({"x": 1.0, "y": 2.0}));
        assert_eq!(value["data"]["velocity"], json!({"x": 5.0, "y": 0.0}));
        assert_eq!(value["data"]["angle"], 90.0);
    }

    #[test]
    fn decode_reads_back_what_encode_writes() {
        let event = ServerEvent::Configure(Configure {
            id: Uuid::new_v4(),
            barriers: vec![Vec2::new(150.0, 300.0)],
        });
        let decoded = ServerEvent::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded, Some(event));
    }

    #[test]
    fn unknown_trigger_names_are_ignored() {
        let decoded =
            ServerEvent::decode(r#"{"event":"trigger","trigger":"confetti","data":{}}"#).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn known_trigger_with_bad_payload_is_an_error() {
        let result = ServerEvent::decode(r#"{"event":"trigger","trigger":"kill_bullet","data":{"id":7}}"#);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn trigger_without_name_is_an_error() {
        let result = ServerEvent::decode(r#"{"event":"trigger","data":{}}"#);
        assert!(matches!(result, Err(ProtocolError::MissingTrigger)));
    }

    #[test]
    fn names_match_serialized_tags() {
        let event = ServerEvent::KillBullet(EntityRef { id: Uuid::new_v4() });
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value["trigger"], event.name());
    }
}
