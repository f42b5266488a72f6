//! Session and question records as the REST API and the realtime channel
//! send them (camelCase JSON, `_id` for questions and authors).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum question length accepted by the server, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Human-readable session code, e.g. `CS101-SEP27-001`.
    SessionId
);
string_id!(
    /// Server-assigned question identifier.
    QuestionId
);
string_id!(
    /// Authenticated user identity.
    UserId
);

/// Reference to the user who created a session or wrote a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A bounded Q&A period tied to one course meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "date_or_datetime")]
    pub session_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Author>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub question_count: u32,
}

/// Accepts `2025-09-27` as well as a full timestamp such as
/// `2025-09-27T00:00:00.000Z`, keeping the calendar date as written.
fn date_or_datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(stamp.date_naive());
    }
    raw.parse::<NaiveDateTime>()
        .map(|stamp| stamp.date())
        .map_err(|_| de::Error::custom(format!("invalid session date: {}", raw)))
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

/// Question lifecycle status. Unrecognised values are kept as `Other`,
/// which counts as not yet answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Asked,
    Answered,
    #[serde(other)]
    Other,
}

impl QuestionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, QuestionStatus::Answered)
    }
}

/// A single submission by a participant within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    pub session_id: SessionId,
    pub author: Author,
    pub text: String,
    pub status: QuestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.author.id == user
    }
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub course_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub session_date: NaiveDate,
}

/// Body of `POST /questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub text: String,
    pub session_id: SessionId,
    pub course: String,
}

/// Partial body of `PATCH /questions/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
}

impl QuestionUpdate {
    pub fn status(status: QuestionStatus) -> Self {
        Self {
            text: None,
            status: Some(status),
        }
    }
}
