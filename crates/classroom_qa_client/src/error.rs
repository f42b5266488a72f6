//! Error types for the client library.

use std::fmt;

use thiserror::Error;

/// Kind of server resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Session,
    Question,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Session => "session",
            Resource::Question => "question",
        })
    }
}

/// Failures surfaced by the API client and the session/question state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QaError {
    /// A required field was empty or out of bounds. Raised before any network call.
    #[error("{0}")]
    Validation(String),
    /// The server has no such resource.
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },
    /// The session exists but has ended.
    #[error("session {0} has ended")]
    InactiveSession(String),
    /// Transport or server failure; carries the collaborator's message.
    #[error("{0}")]
    Network(String),
}

impl QaError {
    pub fn validation(message: impl Into<String>) -> Self {
        QaError::Validation(message.into())
    }

    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        QaError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            QaError::Validation(message) | QaError::Network(message) => message.clone(),
            QaError::NotFound {
                resource: Resource::Session,
                ..
            } => "Session not found. Please check the session ID and try again.".into(),
            QaError::NotFound {
                resource: Resource::Question,
                ..
            } => "This question no longer exists".into(),
            QaError::InactiveSession(_) => {
                "This session has ended and is no longer accepting questions".into()
            }
        }
    }
}

impl From<reqwest::Error> for QaError {
    fn from(e: reqwest::Error) -> Self {
        QaError::Network(e.to_string())
    }
}

/// Persisted session pointer could not be read or written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt stored session: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_inactive_messages_differ() {
        let missing = QaError::not_found(Resource::Session, "X").user_message();
        let ended = QaError::InactiveSession("X".into()).user_message();
        assert_ne!(missing, ended);
        assert!(missing.contains("not found"));
        assert!(ended.contains("ended"));
    }

    #[test]
    fn missing_question_is_not_reported_as_missing_session() {
        let err = QaError::not_found(Resource::Question, "q1");
        assert_eq!(err.user_message(), "This question no longer exists");
        assert_eq!(err.to_string(), "question not found: q1");
    }

    #[test]
    fn network_message_passes_through() {
        let err = QaError::Network("Server unavailable".into());
        assert_eq!(err.user_message(), "Server unavailable");
        assert_eq!(err.to_string(), "Server unavailable");
    }
}
