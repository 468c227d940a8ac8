//! Wire frames exchanged with clients over the WebSocket.
//!
//! Outbound frames are a tagged enum so each shape carries its own fixed
//! fields and is encoded explicitly at the boundary.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// A frame sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Recent-history replay delivered on join, newest-first.
    History { messages: Vec<Message> },

    /// A chat message relayed into the room.
    Chat {
        #[serde(flatten)]
        message: Message,
    },

    /// An error notice delivered only to the offending session.
    Error { message: String },

    /// An informational notice.
    System { message: String },
}

impl ServerFrame {
    /// Encode this frame as JSON text.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("failed to encode server frame: {e}");
            r#"{"type":"error","message":"internal encoding error"}"#.to_string()
        })
    }
}

/// Structured inbound payload: `{"content": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub content: String,
}

impl ClientFrame {
    /// Interpret one inbound text frame as chat content.
    ///
    /// Accepts either the structured `{"content": ...}` payload or a raw
    /// text frame whose entire body is the content, whichever the transport
    /// decided to forward.
    pub fn content_of(text: &str) -> String {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame.content,
            Err(_) => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::{MessageContent, RoomName, UserName};

    fn sample_message() -> Message {
        Message::new(
            RoomName::new("geral").unwrap(),
            UserName::new("ana").unwrap(),
            MessageContent::new("oi").unwrap(),
            42,
        )
    }

    #[test]
    fn test_chat_frame_is_tagged_and_flattened() {
        let frame = ServerFrame::Chat {
            message: sample_message(),
        };

        let value: serde_json::Value = serde_json::from_str(&frame.encode()).unwrap();
        assert_eq!(value["type"], "chat");
        assert_eq!(value["user"], "ana");
        assert_eq!(value["room"], "geral");
        assert_eq!(value["content"], "oi");
        assert_eq!(value["timestamp"], 42);
    }

    #[test]
    fn test_history_frame_carries_message_batch() {
        let frame = ServerFrame::History {
            messages: vec![sample_message()],
        };

        let value: serde_json::Value = serde_json::from_str(&frame.encode()).unwrap();
        assert_eq!(value["type"], "history");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["content"], "oi");
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = ServerFrame::Error {
            message: "Rate limit exceeded!".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(&frame.encode()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "Rate limit exceeded!");
    }

    #[test]
    fn test_content_of_accepts_structured_payload() {
        assert_eq!(ClientFrame::content_of(r#"{"content":"oi"}"#), "oi");
    }

    #[test]
    fn test_content_of_falls_back_to_raw_text() {
        assert_eq!(ClientFrame::content_of("just plain text"), "just plain text");
    }
}
