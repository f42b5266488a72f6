//! Question feed: merges REST snapshots and realtime events into one
//! newest-first collection for the active session.
//!
//! The collection only ever holds questions of the current session. Events
//! for any other session are ignored, and a snapshot whose fetch started for
//! a session that is no longer current is discarded on arrival.

use tracing::{debug, info};

use crate::messages::ServerMessage;
use crate::model::{Question, SessionId, UserId};

/// Notice shown when the current session is ended by the instructor.
pub const SESSION_ENDED_NOTICE: &str =
    "The session has ended. Please join a new session to continue asking questions.";

/// Tag for an in-flight snapshot fetch: the session that was current when
/// the fetch started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTicket {
    session_id: SessionId,
}

impl SnapshotTicket {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// What an event did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    Ignored,
    Inserted,
    Replaced,
    Removed,
    Cleared,
    SessionEnded,
}

#[derive(Debug, Default)]
pub struct QuestionFeed {
    session: Option<SessionId>,
    questions: Vec<Question>,
    notice: Option<String>,
}

impl QuestionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Point the feed at another session (or none). Switching drops every
    /// question held for the previous session.
    pub fn set_session(&mut self, session: Option<SessionId>) {
        if self.session != session {
            debug!(from = ?self.session, to = ?session, "feed session changed");
            self.questions.clear();
            self.session = session;
        }
    }

    /// Start a snapshot for the current session. `None` without a session.
    pub fn begin_snapshot(&self) -> Option<SnapshotTicket> {
        self.session.clone().map(|session_id| SnapshotTicket { session_id })
    }

    /// Replace the collection with a fetched snapshot. Returns `false` when
    /// the ticket's session is no longer current and the result was dropped.
    pub fn apply_snapshot(&mut self, ticket: &SnapshotTicket, questions: Vec<Question>) -> bool {
        if self.session.as_ref() != Some(&ticket.session_id) {
            info!(
                stale = %ticket.session_id,
                current = ?self.session,
                "discarding snapshot for a session that is no longer current"
            );
            return false;
        }
        self.questions = questions
            .into_iter()
            .filter(|q| q.session_id == ticket.session_id)
            .collect();
        true
    }

    pub fn apply_event(&mut self, event: &ServerMessage) -> FeedChange {
        if self.session.as_ref() != Some(event.session_id()) {
            debug!(
                kind = event.kind(),
                session = %event.session_id(),
                "ignoring event for another session"
            );
            return FeedChange::Ignored;
        }
        match event {
            ServerMessage::NewQuestion(question) => {
                match self.questions.iter_mut().find(|q| q.id == question.id) {
                    Some(existing) => {
                        *existing = question.clone();
                        FeedChange::Replaced
                    }
                    None => {
                        self.questions.insert(0, question.clone());
                        FeedChange::Inserted
                    }
                }
            }
            ServerMessage::QuestionUpdated(question) => {
                match self.questions.iter_mut().find(|q| q.id == question.id) {
                    Some(existing) => {
                        *existing = question.clone();
                        FeedChange::Replaced
                    }
                    None => FeedChange::Ignored,
                }
            }
            ServerMessage::QuestionDeleted { question_id, .. } => {
                let before = self.questions.len();
                self.questions.retain(|q| &q.id != question_id);
                if self.questions.len() == before {
                    FeedChange::Ignored
                } else {
                    FeedChange::Removed
                }
            }
            ServerMessage::SessionCleared(_) => {
                self.questions.clear();
                FeedChange::Cleared
            }
            ServerMessage::SessionEnded(session_id) => {
                info!(session = %session_id, "current session ended");
                self.questions.clear();
                self.session = None;
                self.notice = Some(SESSION_ENDED_NOTICE.to_string());
                FeedChange::SessionEnded
            }
        }
    }

    /// Questions by `user` that are still waiting for an answer.
    pub fn asked_by<'a>(&'a self, user: &'a UserId) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions
            .iter()
            .filter(move |q| q.is_authored_by(user) && !q.status.is_terminal())
    }

    /// Questions by `user` that have been answered.
    pub fn answered_by<'a>(
        &'a self,
        user: &'a UserId,
    ) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions
            .iter()
            .filter(move |q| q.is_authored_by(user) && q.status.is_terminal())
    }

    /// Forget everything, including the notice.
    pub fn reset(&mut self) {
        self.session = None;
        self.questions.clear();
        self.notice = None;
    }
}
