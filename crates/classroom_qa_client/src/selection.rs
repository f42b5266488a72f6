//! Instructor side: the list of active sessions and which one is selected.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::api::QaApi;
use crate::error::QaError;
use crate::model::{NewSession, Session, SessionId};

/// Session awaiting confirmation before it is ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEnd {
    pub session_id: SessionId,
    pub course_name: String,
}

pub struct SessionSelection {
    api: Arc<dyn QaApi>,
    list_limit: u32,
    sessions: Vec<Session>,
    selected: Option<SessionId>,
    pending_end: Option<PendingEnd>,
    error: Option<String>,
}

impl SessionSelection {
    pub fn new(api: Arc<dyn QaApi>, list_limit: u32) -> Self {
        Self {
            api,
            list_limit,
            sessions: Vec::new(),
            selected: None,
            pending_end: None,
            error: None,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn selected(&self) -> Option<&SessionId> {
        self.selected.as_ref()
    }

    pub fn selected_session(&self) -> Option<&Session> {
        let id = self.selected.as_ref()?;
        self.sessions.iter().find(|s| &s.session_id == id)
    }

    pub fn pending_end(&self) -> Option<&PendingEnd> {
        self.pending_end.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Refresh the list with the most recent active sessions. A selection
    /// that is missing from the new list is kept.
    pub async fn load(&mut self) -> Result<(), QaError> {
        self.error = None;
        match self.api.get_my_sessions(self.list_limit, true).await {
            Ok(sessions) => {
                self.sessions = sessions;
                if let Some(selected) = &self.selected {
                    if !self.sessions.iter().any(|s| &s.session_id == selected) {
                        warn!(session = %selected, "selected session is no longer active");
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load sessions");
                self.error = Some("Failed to load sessions".into());
                Err(e)
            }
        }
    }

    /// Create a session, prepend it and select it.
    pub async fn create(
        &mut self,
        course_name: &str,
        description: Option<&str>,
        session_date: NaiveDate,
    ) -> Result<&Session, QaError> {
        let course_name = course_name.trim();
        if course_name.is_empty() {
            let err = QaError::validation("Course name is required");
            self.error = Some(err.user_message());
            return Err(err);
        }
        let body = NewSession {
            course_name: course_name.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            session_date,
        };
        self.error = None;
        match self.api.create_session(&body).await {
            Ok(session) => {
                info!(session = %session.session_id, "session created");
                self.selected = Some(session.session_id.clone());
                self.sessions.insert(0, session);
                Ok(&self.sessions[0])
            }
            Err(e) => {
                error!(error = %e, "failed to create session");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn select(&mut self, session_id: SessionId) {
        self.selected = Some(session_id);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Ask to end a session. Refused (returns `false`) while another session
    /// is already waiting for confirmation.
    pub fn request_end(&mut self, session_id: &SessionId) -> bool {
        if self.pending_end.is_some() {
            return false;
        }
        let course_name = self
            .sessions
            .iter()
            .find(|s| &s.session_id == session_id)
            .map(|s| s.course_name.clone())
            .unwrap_or_default();
        self.pending_end = Some(PendingEnd {
            session_id: session_id.clone(),
            course_name,
        });
        true
    }

    pub fn cancel_end(&mut self) {
        self.pending_end = None;
    }

    /// The server reported `session_id` as ended: drop it from the list,
    /// the selection and the pending-end slot.
    pub fn mark_ended(&mut self, session_id: &SessionId) {
        info!(session = %session_id, "session ended");
        self.sessions.retain(|s| &s.session_id != session_id);
        if self.selected.as_ref() == Some(session_id) {
            self.selected = None;
        }
        if self.pending_end.as_ref().is_some_and(|p| &p.session_id == session_id) {
            self.pending_end = None;
        }
    }

    /// End the pending session. On failure nothing but the error message
    /// changes. Returns the ended id, or `None` when nothing was pending.
    pub async fn confirm_end(&mut self) -> Result<Option<SessionId>, QaError> {
        let Some(pending) = self.pending_end.clone() else {
            return Ok(None);
        };
        info!(session = %pending.session_id, "ending session");
        match self.api.end_session(&pending.session_id).await {
            Ok(()) => {
                self.sessions.retain(|s| s.session_id != pending.session_id);
                if self.selected.as_ref() == Some(&pending.session_id) {
                    self.selected = None;
                }
                self.pending_end = None;
                self.error = None;
                Ok(Some(pending.session_id))
            }
            Err(e) => {
                error!(session = %pending.session_id, error = %e, "failed to end session");
                self.error = Some(format!("Failed to end session: {}", e));
                Err(e)
            }
        }
    }
}
