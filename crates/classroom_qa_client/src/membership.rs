//! Student side: the one session the student has joined.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::QaApi;
use crate::error::QaError;
use crate::model::{Session, SessionId, UserId};
use crate::store::SessionStore;

pub struct SessionMembership {
    api: Arc<dyn QaApi>,
    store: Arc<dyn SessionStore>,
    user: Option<UserId>,
    current: Option<Session>,
    code_input: String,
    error: Option<String>,
}

impl SessionMembership {
    pub fn new(api: Arc<dyn QaApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            user: None,
            current: None,
            code_input: String::new(),
            error: None,
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<&SessionId> {
        self.current.as_ref().map(|s| &s.session_id)
    }

    pub fn code_input(&self) -> &str {
        &self.code_input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bind to `user` and adopt the session persisted for them, if any,
    /// without asking the server. Switching identity drops whatever the
    /// previous one had joined. A corrupt stored value is dropped.
    pub fn restore(&mut self, user: &UserId) -> Option<&Session> {
        if self.user.as_ref() != Some(user) {
            self.current = None;
            self.code_input.clear();
            self.error = None;
            self.user = Some(user.clone());
        }
        if self.current.is_none() {
            match self.store.get(user) {
                Ok(Some(session)) => {
                    info!(session = %session.session_id, user = %user, "restored persisted session");
                    self.current = Some(session);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "failed to restore session from storage");
                    self.clear_store();
                }
            }
        }
        self.current.as_ref()
    }

    /// Look a session up by its code, join it and make it current.
    pub async fn load_by_code(&mut self, code: &str) -> Result<&Session, QaError> {
        let code = code.trim().to_uppercase();
        self.code_input = code.clone();
        self.error = None;
        if code.is_empty() {
            let err = QaError::validation("Please enter a session ID");
            self.error = Some(err.user_message());
            return Err(err);
        }
        match self.fetch_and_join(SessionId::new(code)).await {
            Ok(session) => {
                info!(session = %session.session_id, "joined session");
                match &self.user {
                    Some(user) => {
                        if let Err(e) = self.store.set(user, &session) {
                            warn!(error = %e, "failed to persist current session");
                        }
                    }
                    None => warn!("no identity bound, current session is not persisted"),
                }
                Ok(&*self.current.insert(session))
            }
            Err(e) => {
                error!(error = %e, "failed to load session");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    async fn fetch_and_join(&self, session_id: SessionId) -> Result<Session, QaError> {
        let session = self.api.get_session(&session_id).await?;
        if !session.is_active {
            return Err(QaError::InactiveSession(session_id.to_string()));
        }
        self.api.join_session(&session.session_id).await?;
        Ok(session)
    }

    /// Drop the current session and the code input. No server call.
    pub fn leave(&mut self) {
        self.current = None;
        self.code_input.clear();
        self.error = None;
        self.clear_store();
    }

    /// Forget the session and its persisted pointer, then unbind the identity.
    pub fn sign_out(&mut self) {
        self.leave();
        self.user = None;
    }

    /// The server ended the current session.
    pub fn end_current(&mut self) {
        self.current = None;
        self.clear_store();
    }

    fn clear_store(&self) {
        let Some(user) = &self.user else { return };
        if let Err(e) = self.store.clear(user) {
            warn!(error = %e, "failed to clear persisted session");
        }
    }
}
