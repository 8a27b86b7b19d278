use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Directive;

/// Largest payload accepted on a stream; anything bigger is a framing error.
pub const MAX_FRAME_SIZE: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown packet: {0}")]
    UnknownPacket(String),
    #[error("invalid {tag} packet: {reason}")]
    InvalidData { tag: &'static str, reason: String },
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A message travelling as `{"<TAG>": {<FIELDS>...}}`.
pub trait Packet: Serialize + DeserializeOwned {
    const TAG: &'static str;
    /// Exact key set of the inner object, as it appears on the wire.
    const FIELDS: &'static [&'static str];
}

pub fn encode<P: Packet>(packet: &P) -> Result<Vec<u8>, ProtocolError> {
    let mut envelope = serde_json::Map::with_capacity(1);
    envelope.insert(P::TAG.to_string(), serde_json::to_value(packet)?);
    Ok(serde_json::to_vec(&Value::Object(envelope))?)
}

pub fn decode<P: Packet>(data: &[u8]) -> Result<P, ProtocolError> {
    let invalid = |reason: String| ProtocolError::InvalidData {
        tag: P::TAG,
        reason,
    };

    let value: Value =
        serde_json::from_slice(data).map_err(|e| ProtocolError::UnknownPacket(e.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(ProtocolError::UnknownPacket(
            "payload is not a JSON object".to_string(),
        ));
    };

    let body = envelope
        .remove(P::TAG)
        .ok_or_else(|| invalid("tag missing".to_string()))?;
    let Value::Object(fields) = &body else {
        return Err(invalid("body is not an object".to_string()));
    };

    let received: BTreeSet<&str> = fields.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = P::FIELDS.iter().copied().collect();
    if received != expected {
        return Err(invalid(format!(
            "fields {received:?} do not match {expected:?}"
        )));
    }

    serde_json::from_value(body).map_err(|e| invalid(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationPacket {
    pub username: String,
}

impl Packet for InvitationPacket {
    const TAG: &'static str = "InvitationPacket";
    const FIELDS: &'static [&'static str] = &["username"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationAcceptedPacket {
    pub username: String,
}

impl Packet for InvitationAcceptedPacket {
    const TAG: &'static str = "InvitationAcceptedPacket";
    const FIELDS: &'static [&'static str] = &["username"];
}

/// Authoritative state sent by the server every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerData {
    #[serde(rename = "y_r1")]
    pub left_y: f32,
    #[serde(rename = "x_r1")]
    pub left_x: f32,
    #[serde(rename = "x_ball")]
    pub ball_x: f32,
    #[serde(rename = "y_ball")]
    pub ball_y: f32,
    pub directives: Vec<Directive>,
}

impl Packet for ServerData {
    const TAG: &'static str = "ServerData";
    const FIELDS: &'static [&'static str] = &["y_r1", "x_r1", "x_ball", "y_ball", "directives"];
}

/// The client's own paddle position, sent in reply to every `ServerData`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(rename = "y_r2")]
    pub right_y: f32,
    #[serde(rename = "x_r2")]
    pub right_x: f32,
}

impl Packet for ClientData {
    const TAG: &'static str = "ClientData";
    const FIELDS: &'static [&'static str] = &["y_r2", "x_r2"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ScoreScreen;

    fn keys_of<P: Packet>(packet: &P) -> BTreeSet<String> {
        match serde_json::to_value(packet).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("expected object, got {other}"),
        }
    }

    fn expected<P: Packet>() -> BTreeSet<String> {
        P::FIELDS.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_fields_match_serialized_keys() {
        let server = ServerData {
            left_y: 0.0,
            left_x: 0.0,
            ball_x: 0.0,
            ball_y: 0.0,
            directives: Vec::new(),
        };
        assert_eq!(keys_of(&server), expected::<ServerData>());
        assert_eq!(
            keys_of(&ClientData {
                right_y: 0.0,
                right_x: 0.0
            }),
            expected::<ClientData>()
        );
        assert_eq!(
            keys_of(&InvitationPacket {
                username: String::new()
            }),
            expected::<InvitationPacket>()
        );
    }

    #[test]
    fn test_envelope_shape() {
        let bytes = encode(&InvitationPacket {
            username: "alice".to_string(),
        })
        .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"InvitationPacket": {"username": "alice"}})
        );
    }

    #[test]
    fn test_server_data_carries_directives() {
        let packet = ServerData {
            left_y: 175.0,
            left_x: 30.0,
            ball_x: 400.0,
            ball_y: 200.0,
            directives: vec![
                Directive::UpdateScore(true),
                Directive::ScoreScreen(ScoreScreen::Lose),
            ],
        };
        let decoded: ServerData = decode(&encode(&packet).unwrap()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode::<ClientData>(b"\xff\x00garbage"),
            Err(ProtocolError::UnknownPacket(_))
        ));
        assert!(matches!(
            decode::<ClientData>(b"[1, 2]"),
            Err(ProtocolError::UnknownPacket(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_tag_or_fields() {
        let wrong_tag = br#"{"ServerData": {"y_r2": 1, "x_r2": 2}}"#;
        assert!(matches!(
            decode::<ClientData>(wrong_tag),
            Err(ProtocolError::InvalidData { .. })
        ));

        let extra_field = br#"{"ClientData": {"y_r2": 1, "x_r2": 2, "z": 3}}"#;
        assert!(matches!(
            decode::<ClientData>(extra_field),
            Err(ProtocolError::InvalidData { .. })
        ));

        let missing_field = br#"{"ClientData": {"y_r2": 1}}"#;
        assert!(matches!(
            decode::<ClientData>(missing_field),
            Err(ProtocolError::InvalidData { .. })
        ));

        let not_object = br#"{"ClientData": 5}"#;
        assert!(matches!(
            decode::<ClientData>(not_object),
            Err(ProtocolError::InvalidData { .. })
        ));

        let wrong_type = br#"{"ClientData": {"y_r2": "up", "x_r2": 2}}"#;
        assert!(matches!(
            decode::<ClientData>(wrong_type),
            Err(ProtocolError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_decode_accepts_integers_for_positions() {
        let data = br#"{"ClientData": {"y_r2": 120, "x_r2": 730}}"#;
        let packet: ClientData = decode(data).unwrap();
        assert_eq!(packet.right_y, 120.0);
        assert_eq!(packet.right_x, 730.0);
    }
}
