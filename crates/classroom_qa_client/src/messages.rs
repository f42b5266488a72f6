//! Realtime channel message types. Client ↔ server JSON text frames with a
//! `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId, SessionId};

/// Client → server: join the room of one session.
#[derive(Debug, Clone, Serialize)]
pub struct JoinSessionMessage<'a> {
    #[serde(rename = "type")]
    pub typ: &'static str,
    #[serde(rename = "sessionId")]
    pub session_id: &'a str,
}

impl<'a> JoinSessionMessage<'a> {
    pub fn new(session_id: &'a SessionId) -> Self {
        Self {
            typ: "joinSession",
            session_id: session_id.as_str(),
        }
    }
}

/// Server → client: a question was created or changed.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    pub question: Question,
}

/// Server → client: a question was removed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDeletedPayload {
    pub session_id: SessionId,
    pub question_id: QuestionId,
}

/// Server → client: session-wide notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub session_id: SessionId,
}

/// One domain event pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    NewQuestion(Question),
    QuestionUpdated(Question),
    QuestionDeleted {
        session_id: SessionId,
        question_id: QuestionId,
    },
    SessionCleared(SessionId),
    SessionEnded(SessionId),
}

impl ServerMessage {
    /// Session the event belongs to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            ServerMessage::NewQuestion(q) | ServerMessage::QuestionUpdated(q) => &q.session_id,
            ServerMessage::QuestionDeleted { session_id, .. }
            | ServerMessage::SessionCleared(session_id)
            | ServerMessage::SessionEnded(session_id) => session_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::NewQuestion(_) => "newQuestion",
            ServerMessage::QuestionUpdated(_) => "questionUpdated",
            ServerMessage::QuestionDeleted { .. } => "questionDeleted",
            ServerMessage::SessionCleared(_) => "sessionCleared",
            ServerMessage::SessionEnded(_) => "sessionEnded",
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let typ = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or("missing type")?;
        match typ {
            "newQuestion" => {
                let m: QuestionPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(ServerMessage::NewQuestion(m.question))
            }
            "questionUpdated" => {
                let m: QuestionPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(ServerMessage::QuestionUpdated(m.question))
            }
            "questionDeleted" => {
                let m: QuestionDeletedPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(ServerMessage::QuestionDeleted {
                    session_id: m.session_id,
                    question_id: m.question_id,
                })
            }
            "sessionCleared" => {
                let m: SessionPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(ServerMessage::SessionCleared(m.session_id))
            }
            "sessionEnded" => {
                let m: SessionPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(ServerMessage::SessionEnded(m.session_id))
            }
            _ => Err(format!("unknown type: {}", typ)),
        }
    }

    pub fn from_text(text: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        Self::from_json(&value)
    }
}
