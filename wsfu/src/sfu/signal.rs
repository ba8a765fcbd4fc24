use super::engine::SessionDescriptor;
use super::errors::Error;
use serde::{Deserialize, Serialize};

/// One inbound JSON object; exactly one of the fields is expected to be set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<SessionDescriptor>,
    #[serde(
        rename = "joinRoom",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub join_room: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Signal(SessionDescriptor),
    JoinRoom(String),
}

/// Decodes a raw text frame into an intent. Malformed or unknown messages are
/// an error for the caller to log and drop; they are never fatal.
pub fn decode(raw: &str) -> Result<Intent, Error> {
    let message: ClientMessage = serde_json::from_str(raw).map_err(|_| Error::ErrBadMessage)?;

    if let Some(descriptor) = message.signal {
        return Ok(Intent::Signal(descriptor));
    }
    if let Some(room_id) = message.join_room {
        return Ok(Intent::JoinRoom(room_id));
    }

    Err(Error::ErrBadMessage)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Signal { signal: SessionDescriptor },
    Event(PeerEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PeerEvent {
    #[serde(rename = "newPeer")]
    NewPeer {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    #[serde(rename = "peer-disconnected")]
    PeerDisconnected {
        #[serde(rename = "streamId")]
        stream_id: String,
    },
}

impl ServerMessage {
    pub fn new_peer(peer_id: String) -> Self {
        ServerMessage::Event(PeerEvent::NewPeer { peer_id })
    }

    pub fn peer_disconnected(stream_id: String) -> Self {
        ServerMessage::Event(PeerEvent::PeerDisconnected { stream_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_signal() {
        let intent = decode(r#"{"signal":{"type":"offer","sdp":"v=0"}}"#).unwrap();
        assert_eq!(
            intent,
            Intent::Signal(json!({"type": "offer", "sdp": "v=0"}))
        );
    }

    #[test]
    fn test_decode_join_room() {
        let intent = decode(r#"{"joinRoom":"demo"}"#).unwrap();
        assert_eq!(intent, Intent::JoinRoom(String::from("demo")));
    }

    #[test]
    fn test_decode_rejects_unknown_and_malformed() {
        assert_eq!(decode("not json"), Err(Error::ErrBadMessage));
        assert_eq!(decode(r#"{"ping":true}"#), Err(Error::ErrBadMessage));
        assert_eq!(decode(r#"[1,2,3]"#), Err(Error::ErrBadMessage));
    }

    #[test]
    fn test_server_message_wire_shapes() {
        let signal = ServerMessage::Signal {
            signal: json!({"sdp": "v=0"}),
        };
        assert_eq!(
            serde_json::to_value(&signal).unwrap(),
            json!({"signal": {"sdp": "v=0"}})
        );

        let new_peer = ServerMessage::new_peer(String::from("p1"));
        assert_eq!(
            serde_json::to_value(&new_peer).unwrap(),
            json!({"type": "newPeer", "peerId": "p1"})
        );

        let gone = ServerMessage::peer_disconnected(String::from("s1"));
        assert_eq!(
            serde_json::to_value(&gone).unwrap(),
            json!({"type": "peer-disconnected", "streamId": "s1"})
        );
    }
}
