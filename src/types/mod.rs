use serde::{Deserialize, Serialize};

use crate::transcript::ParsedMessage;

/// Query string of `GET /api/transcript`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    /// Transcript path relative to the server's log root.
    pub path: String,
    #[serde(default)]
    pub from_byte: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    WatchTranscript {
        path: String,
        #[serde(rename = "fromByte", default)]
        from_byte: u64,
    },
    UnwatchTranscript,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    TranscriptBatch {
        path: String,
        messages: Vec<ParsedMessage>,
        #[serde(rename = "bytesRead")]
        bytes_read: u64,
    },
    TranscriptError {
        error: String,
    },
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_use_kebab_case_tags() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "watch-transcript", "path": "-work/s.jsonl"}))
                .unwrap();
        match msg {
            ClientMessage::WatchTranscript { path, from_byte } => {
                assert_eq!(path, "-work/s.jsonl");
                assert_eq!(from_byte, 0);
            }
            other => panic!("expected WatchTranscript, got {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_value(json!({"type": "ping"})).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn batch_serializes_with_camel_case_offset() {
        let msg = ServerMessage::TranscriptBatch {
            path: "a.jsonl".to_string(),
            messages: Vec::new(),
            bytes_read: 12,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "transcript-batch", "path": "a.jsonl", "messages": [], "bytesRead": 12})
        );
    }
}
