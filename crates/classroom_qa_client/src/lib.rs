//! Classroom Q&A client library: REST API client, realtime channel, and the
//! session/question state that instructor and student front ends render.

pub mod api;
pub mod channel;
pub mod config;
pub mod dashboard;
pub mod driver;
pub mod error;
pub mod feed;
pub mod membership;
pub mod messages;
pub mod model;
pub mod selection;
pub mod store;

#[cfg(test)]
mod testutil;

pub use api::{HttpApi, QaApi};
pub use channel::{Affiliation, ChannelEvent, ChannelHandle, ChannelState};
pub use config::{default_config_path, Config, ConfigError};
pub use dashboard::{Effect, InstructorDashboard, StudentDashboard};
pub use driver::{StudentCommand, StudentDriver, StudentView};
pub use error::{QaError, Resource, StoreError};
pub use feed::{FeedChange, QuestionFeed, SnapshotTicket};
pub use membership::SessionMembership;
pub use messages::ServerMessage;
pub use model::{Question, QuestionId, QuestionStatus, Session, SessionId, UserId};
pub use selection::SessionSelection;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
