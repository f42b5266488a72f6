//! Dashboards: compose session state, the question feed and the channel
//! affiliation for one user.
//!
//! Dashboards never touch the network on their own for room membership or
//! snapshots. They return [`Effect`]s and the driver performs them, feeding
//! completions back through `finish_snapshot`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::api::QaApi;
use crate::channel::ChannelEvent;
use crate::error::QaError;
use crate::feed::{FeedChange, QuestionFeed, SnapshotTicket};
use crate::membership::SessionMembership;
use crate::messages::ServerMessage;
use crate::model::{
    NewQuestion, Question, QuestionId, QuestionStatus, QuestionUpdate, Session, SessionId,
    UserId, MAX_QUESTION_CHARS,
};
use crate::selection::SessionSelection;
use crate::store::SessionStore;

/// Work requested from the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Affiliate the realtime channel with this session's room.
    Join(SessionId),
    /// Stop dispatching realtime events.
    Leave,
    /// Fetch the question list and hand it to `finish_snapshot`.
    Snapshot(SnapshotTicket),
}

/// A submitted question still waiting for its realtime echo.
#[derive(Debug, Clone)]
struct PendingSubmission {
    session_id: SessionId,
    text: String,
    deadline: Instant,
}

pub struct StudentDashboard {
    api: Arc<dyn QaApi>,
    identity: Option<UserId>,
    membership: SessionMembership,
    feed: QuestionFeed,
    connected: bool,
    error: Option<String>,
    pending: Vec<PendingSubmission>,
    echo_timeout: Duration,
}

impl StudentDashboard {
    pub fn new(api: Arc<dyn QaApi>, store: Arc<dyn SessionStore>, echo_timeout: Duration) -> Self {
        Self {
            membership: SessionMembership::new(api.clone(), store),
            api,
            identity: None,
            feed: QuestionFeed::new(),
            connected: false,
            error: None,
            pending: Vec::new(),
            echo_timeout,
        }
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.membership.current()
    }

    pub fn questions(&self) -> &[Question] {
        self.feed.questions()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn notice(&self) -> Option<&str> {
        self.feed.notice()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| self.membership.error())
    }

    pub fn pending_submissions(&self) -> usize {
        self.pending.len()
    }

    /// Questions by the signed-in user that are still open.
    pub fn asked_questions(&self) -> Vec<&Question> {
        match &self.identity {
            Some(user) => self.feed.asked_by(user).collect(),
            None => Vec::new(),
        }
    }

    /// Questions by the signed-in user that have been answered.
    pub fn answered_questions(&self) -> Vec<&Question> {
        match &self.identity {
            Some(user) => self.feed.answered_by(user).collect(),
            None => Vec::new(),
        }
    }

    /// Sign in and restore the session persisted for `user`, if any.
    /// Signing in as someone else first drops the previous identity's
    /// session, feed and pending submissions.
    pub fn login(&mut self, user: UserId) -> Vec<Effect> {
        info!(user = %user, "student signed in");
        let switched = self.identity.as_ref() != Some(&user);
        let had_session = self.feed.session().is_some();
        if switched {
            self.feed.reset();
            self.pending.clear();
            self.error = None;
        }
        self.identity = Some(user.clone());
        match self.membership.restore(&user).map(|s| s.session_id.clone()) {
            Some(id) => self.enter(id),
            None if had_session && switched => vec![Effect::Leave],
            None => Vec::new(),
        }
    }

    /// Sign out: forget the session, the persisted pointer and the feed.
    pub fn logout(&mut self) -> Vec<Effect> {
        info!("student signed out");
        self.identity = None;
        self.membership.sign_out();
        self.feed.reset();
        self.pending.clear();
        self.error = None;
        vec![Effect::Leave]
    }

    pub async fn load_session(&mut self, code: &str) -> Result<Vec<Effect>, QaError> {
        self.error = None;
        let id = self.membership.load_by_code(code).await?.session_id.clone();
        self.feed.clear_notice();
        Ok(self.enter(id))
    }

    pub fn leave_session(&mut self) -> Vec<Effect> {
        self.membership.leave();
        self.feed.set_session(None);
        self.pending.clear();
        self.error = None;
        vec![Effect::Leave]
    }

    fn enter(&mut self, id: SessionId) -> Vec<Effect> {
        self.feed.set_session(Some(id.clone()));
        let mut effects = vec![Effect::Join(id)];
        effects.extend(self.feed.begin_snapshot().map(Effect::Snapshot));
        effects
    }

    /// Re-fetch the question list for the current session.
    pub fn refresh(&self) -> Vec<Effect> {
        self.feed.begin_snapshot().map(Effect::Snapshot).into_iter().collect()
    }

    pub fn finish_snapshot(
        &mut self,
        ticket: &SnapshotTicket,
        result: Result<Vec<Question>, QaError>,
    ) -> bool {
        match result {
            Ok(questions) => self.feed.apply_snapshot(ticket, questions),
            Err(e) => {
                error!(session = %ticket.session_id(), error = %e, "failed to load session questions");
                if self.feed.session() == Some(ticket.session_id()) {
                    self.error = Some("Failed to load session questions".into());
                }
                false
            }
        }
    }

    /// Submit a question. The feed is updated by the realtime echo, not here.
    pub async fn submit_question(&mut self, text: &str) -> Result<(), QaError> {
        let text = text.trim();
        let checked = if text.is_empty() {
            Err(QaError::validation("Please enter a question"))
        } else if text.chars().count() > MAX_QUESTION_CHARS {
            Err(QaError::validation(format!(
                "Question must be {} characters or fewer",
                MAX_QUESTION_CHARS
            )))
        } else {
            self.membership
                .current()
                .cloned()
                .ok_or_else(|| QaError::validation("Please load a session first"))
        };
        let session = match checked {
            Ok(session) => session,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        self.error = None;
        let body = NewQuestion {
            text: text.to_string(),
            session_id: session.session_id.clone(),
            course: session.course_name.clone(),
        };
        if let Err(e) = self.api.submit_question(&body).await {
            error!(error = %e, "failed to submit question");
            self.error = Some(e.user_message());
            return Err(e);
        }
        self.pending.push(PendingSubmission {
            session_id: session.session_id,
            text: body.text,
            deadline: Instant::now() + self.echo_timeout,
        });
        Ok(())
    }

    pub async fn update_question(
        &mut self,
        question_id: &QuestionId,
        update: &QuestionUpdate,
    ) -> Result<(), QaError> {
        let result = self.api.update_question(question_id, update).await;
        self.record(result, question_id, "failed to update question")
    }

    pub async fn delete_question(&mut self, question_id: &QuestionId) -> Result<(), QaError> {
        let result = self.api.delete_question(question_id).await;
        self.record(result, question_id, "failed to delete question")
    }

    fn record(
        &mut self,
        result: Result<(), QaError>,
        question_id: &QuestionId,
        what: &str,
    ) -> Result<(), QaError> {
        if let Err(e) = &result {
            error!(question = %question_id, error = %e, "{}", what);
            self.error = Some(e.user_message());
        }
        result
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) -> Vec<Effect> {
        match event {
            ChannelEvent::Connected => {
                // the channel re-joins its affiliated room by itself
                self.connected = true;
                Vec::new()
            }
            ChannelEvent::Disconnected => {
                self.connected = false;
                Vec::new()
            }
            ChannelEvent::Message(message) => {
                self.corroborate(&message);
                if self.feed.apply_event(&message) == FeedChange::SessionEnded {
                    self.membership.end_current();
                    self.pending.clear();
                    return vec![Effect::Leave];
                }
                Vec::new()
            }
        }
    }

    fn corroborate(&mut self, message: &ServerMessage) {
        let ServerMessage::NewQuestion(question) = message else {
            return;
        };
        if self.identity.as_ref() != Some(&question.author.id) {
            return;
        }
        if let Some(i) = self
            .pending
            .iter()
            .position(|p| p.session_id == question.session_id && p.text == question.text)
        {
            debug!(question = %question.id, "submission echoed");
            self.pending.remove(i);
        }
    }

    /// Drop submissions whose echo never arrived and ask for a snapshot to
    /// reconcile.
    pub fn expire_submissions(&mut self, now: Instant) -> Vec<Effect> {
        let before = self.pending.len();
        self.pending.retain(|p| p.deadline > now);
        if self.pending.len() == before {
            return Vec::new();
        }
        warn!(
            expired = before - self.pending.len(),
            "submission echo timed out, re-fetching questions"
        );
        self.refresh()
    }

    /// Earliest pending echo deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }
}

pub struct InstructorDashboard {
    api: Arc<dyn QaApi>,
    selection: SessionSelection,
    feed: QuestionFeed,
    connected: bool,
    error: Option<String>,
}

impl InstructorDashboard {
    pub fn new(api: Arc<dyn QaApi>, list_limit: u32) -> Self {
        Self {
            selection: SessionSelection::new(api.clone(), list_limit),
            api,
            feed: QuestionFeed::new(),
            connected: false,
            error: None,
        }
    }

    pub fn selection(&self) -> &SessionSelection {
        &self.selection
    }

    pub fn questions(&self) -> &[Question] {
        self.feed.questions()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| self.selection.error())
    }

    pub async fn load(&mut self) -> Result<(), QaError> {
        self.selection.load().await
    }

    pub async fn create(
        &mut self,
        course_name: &str,
        description: Option<&str>,
        session_date: NaiveDate,
    ) -> Result<Vec<Effect>, QaError> {
        let id = self
            .selection
            .create(course_name, description, session_date)
            .await?
            .session_id
            .clone();
        Ok(self.follow(Some(id)))
    }

    pub fn select(&mut self, session_id: SessionId) -> Vec<Effect> {
        self.selection.select(session_id.clone());
        self.follow(Some(session_id))
    }

    pub fn deselect(&mut self) -> Vec<Effect> {
        self.selection.deselect();
        self.follow(None)
    }

    pub fn request_end(&mut self, session_id: &SessionId) -> bool {
        self.selection.request_end(session_id)
    }

    pub fn cancel_end(&mut self) {
        self.selection.cancel_end();
    }

    pub async fn confirm_end(&mut self) -> Result<Vec<Effect>, QaError> {
        self.selection.confirm_end().await?;
        let selected = self.selection.selected().cloned();
        if selected.as_ref() == self.feed.session() {
            return Ok(Vec::new());
        }
        Ok(self.follow(selected))
    }

    fn follow(&mut self, session: Option<SessionId>) -> Vec<Effect> {
        self.error = None;
        self.feed.set_session(session.clone());
        match session {
            Some(id) => {
                let mut effects = vec![Effect::Join(id)];
                effects.extend(self.feed.begin_snapshot().map(Effect::Snapshot));
                effects
            }
            None => vec![Effect::Leave],
        }
    }

    pub fn refresh(&self) -> Vec<Effect> {
        self.feed.begin_snapshot().map(Effect::Snapshot).into_iter().collect()
    }

    pub fn finish_snapshot(
        &mut self,
        ticket: &SnapshotTicket,
        result: Result<Vec<Question>, QaError>,
    ) -> bool {
        match result {
            Ok(questions) => self.feed.apply_snapshot(ticket, questions),
            Err(e) => {
                error!(session = %ticket.session_id(), error = %e, "failed to load session questions");
                if self.feed.session() == Some(ticket.session_id()) {
                    self.error = Some("Failed to load session questions".into());
                }
                false
            }
        }
    }

    /// Mark a question answered. The feed follows via `questionUpdated`.
    pub async fn answer_question(&self, question_id: &QuestionId) -> Result<(), QaError> {
        self.api
            .update_question(question_id, &QuestionUpdate::status(QuestionStatus::Answered))
            .await
            .inspect_err(|e| error!(question = %question_id, error = %e, "failed to answer question"))
    }

    pub async fn delete_question(&self, question_id: &QuestionId) -> Result<(), QaError> {
        self.api
            .delete_question(question_id)
            .await
            .inspect_err(|e| error!(question = %question_id, error = %e, "failed to delete question"))
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) -> Vec<Effect> {
        match event {
            ChannelEvent::Connected => {
                self.connected = true;
                Vec::new()
            }
            ChannelEvent::Disconnected => {
                self.connected = false;
                Vec::new()
            }
            ChannelEvent::Message(message) => {
                if self.feed.apply_event(&message) == FeedChange::SessionEnded {
                    self.selection.mark_ended(message.session_id());
                    return vec![Effect::Leave];
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::store::MemorySessionStore;
    use crate::testutil::{answered, question, session};

    fn student(api: &Arc<FakeApi>, store: &Arc<MemorySessionStore>) -> StudentDashboard {
        StudentDashboard::new(api.clone(), store.clone(), Duration::from_secs(5))
    }

    fn ticket_of(effects: &[Effect]) -> SnapshotTicket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Snapshot(t) => Some(t.clone()),
                _ => None,
            })
            .expect("snapshot effect")
    }

    #[tokio::test]
    async fn loading_a_session_joins_and_snapshots() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));

        let effects = d.load_session("a").await.unwrap();
        assert_eq!(effects[0], Effect::Join(SessionId::new("A")));
        let ticket = ticket_of(&effects);
        assert!(d.finish_snapshot(
            &ticket,
            Ok(vec![question("q1", "A", "me", "open"), answered(question("q0", "A", "me", "done"))])
        ));
        assert_eq!(d.asked_questions().len(), 1);
        assert_eq!(d.answered_questions().len(), 1);
    }

    #[test]
    fn login_restores_persisted_session() {
        let api = Arc::new(FakeApi::default());
        let store = Arc::new(MemorySessionStore::new());
        store.set(&UserId::new("me"), &session("A", "CS", true)).unwrap();
        let mut d = student(&api, &store);
        let effects = d.login(UserId::new("me"));
        assert_eq!(effects[0], Effect::Join(SessionId::new("A")));
        assert!(matches!(effects[1], Effect::Snapshot(_)));
        assert_eq!(d.current_session().map(|s| s.session_id.as_str()), Some("A"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn login_as_another_identity_drops_previous_session() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("alice"));
        let ticket = ticket_of(&d.load_session("A").await.unwrap());
        d.finish_snapshot(&ticket, Ok(vec![question("q1", "A", "alice", "mine")]));
        d.submit_question("pending").await.unwrap();

        let effects = d.login(UserId::new("bob"));
        assert_eq!(effects, [Effect::Leave]);
        assert_eq!(d.identity(), Some(&UserId::new("bob")));
        assert!(d.current_session().is_none());
        assert!(d.questions().is_empty());
        assert_eq!(d.pending_submissions(), 0);

        // alice keeps her pointer, bob never sees it
        let mut fresh = student(&api, &store);
        assert!(fresh.login(UserId::new("bob")).is_empty());
        assert!(fresh.current_session().is_none());
        assert_eq!(
            fresh.login(UserId::new("alice")).first(),
            Some(&Effect::Join(SessionId::new("A")))
        );
    }

    #[tokio::test]
    async fn missing_question_reports_question_error() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));
        api.fail_call(
            "delete_question",
            QaError::not_found(crate::error::Resource::Question, "q9"),
        );
        assert!(d.delete_question(&QuestionId::new("q9")).await.is_err());
        assert_eq!(d.error(), Some("This question no longer exists"));
    }

    #[tokio::test]
    async fn switching_sessions_discards_late_snapshot() {
        let api = Arc::new(FakeApi::with_sessions(vec![
            session("A", "CS", true),
            session("B", "Math", true),
        ]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));

        let stale = ticket_of(&d.load_session("A").await.unwrap());
        let fresh = ticket_of(&d.load_session("B").await.unwrap());
        assert!(d.finish_snapshot(&fresh, Ok(vec![question("b1", "B", "me", "b")])));
        assert!(!d.finish_snapshot(&stale, Ok(vec![question("a1", "A", "me", "a")])));
        assert!(d.questions().iter().all(|q| q.session_id.as_str() == "B"));

        // a stale failure does not surface an error either
        assert!(!d.finish_snapshot(&stale, Err(QaError::Network("x".into()))));
        assert!(d.error().is_none());
    }

    #[tokio::test]
    async fn session_ended_resets_membership_and_store() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));
        d.load_session("A").await.unwrap();
        d.handle_channel_event(ChannelEvent::Message(ServerMessage::NewQuestion(question(
            "q1", "A", "me", "x",
        ))));

        let effects = d.handle_channel_event(ChannelEvent::Message(ServerMessage::SessionEnded(
            SessionId::new("A"),
        )));
        assert_eq!(effects, [Effect::Leave]);
        assert!(d.questions().is_empty());
        assert!(d.current_session().is_none());
        assert!(!d.notice().unwrap_or_default().is_empty());
        assert!(store.get(&UserId::new("me")).unwrap().is_none());
    }

    #[tokio::test]
    async fn connection_flag_follows_channel() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        assert!(d.handle_channel_event(ChannelEvent::Connected).is_empty());
        assert!(d.is_connected());
        d.load_session("A").await.unwrap();
        d.handle_channel_event(ChannelEvent::Disconnected);
        assert!(!d.is_connected());
        assert_eq!(d.current_session().map(|s| s.session_id.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn submit_validates_before_network() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));

        assert!(d.submit_question("hello").await.is_err());
        assert_eq!(d.error(), Some("Please load a session first"));

        d.load_session("A").await.unwrap();
        assert!(d.submit_question("   ").await.is_err());
        assert_eq!(d.error(), Some("Please enter a question"));
        assert!(d.submit_question(&"x".repeat(MAX_QUESTION_CHARS + 1)).await.is_err());

        assert!(!api.calls().iter().any(|c| c.starts_with("submit_question")));
    }

    #[tokio::test]
    async fn submission_waits_for_echo() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));
        d.load_session("A").await.unwrap();

        d.submit_question("  Why lifetimes? ").await.unwrap();
        assert!(api.calls().contains(&"submit_question:A:Why lifetimes?".to_string()));
        assert!(d.questions().is_empty());
        assert_eq!(d.pending_submissions(), 1);

        d.handle_channel_event(ChannelEvent::Message(ServerMessage::NewQuestion(question(
            "q1",
            "A",
            "me",
            "Why lifetimes?",
        ))));
        assert_eq!(d.pending_submissions(), 0);
        assert_eq!(d.asked_questions().len(), 1);
        assert!(d.expire_submissions(Instant::now() + Duration::from_secs(60)).is_empty());
    }

    #[tokio::test]
    async fn missing_echo_triggers_snapshot() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));
        d.load_session("A").await.unwrap();
        d.submit_question("lost").await.unwrap();

        assert!(d.expire_submissions(Instant::now()).is_empty());
        let deadline = d.next_deadline().unwrap();
        let effects = d.expire_submissions(deadline + Duration::from_millis(1));
        assert!(matches!(effects.as_slice(), [Effect::Snapshot(t)] if t.session_id().as_str() == "A"));
        assert_eq!(d.pending_submissions(), 0);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let store = Arc::new(MemorySessionStore::new());
        let mut d = student(&api, &store);
        d.login(UserId::new("me"));
        d.load_session("A").await.unwrap();
        let effects = d.logout();
        assert_eq!(effects, [Effect::Leave]);
        assert!(d.current_session().is_none());
        assert!(d.identity().is_none());
        assert!(store.get(&UserId::new("me")).unwrap().is_none());
        assert!(d.asked_questions().is_empty());
    }

    #[tokio::test]
    async fn instructor_select_and_answer() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        let mut d = InstructorDashboard::new(api.clone(), 10);
        d.load().await.unwrap();

        let effects = d.select(SessionId::new("A"));
        assert_eq!(effects[0], Effect::Join(SessionId::new("A")));
        let ticket = ticket_of(&effects);
        d.finish_snapshot(
            &ticket,
            Ok(vec![question("q1", "A", "s1", "x"), question("q2", "A", "s2", "y")]),
        );
        assert_eq!(d.questions().len(), 2);

        d.answer_question(&QuestionId::new("q1")).await.unwrap();
        assert!(api.calls().contains(&"update_question:q1".to_string()));

        assert_eq!(d.deselect(), [Effect::Leave]);
        assert!(d.questions().is_empty());
    }

    #[tokio::test]
    async fn instructor_ending_selected_session_leaves_room() {
        let api = Arc::new(FakeApi::with_sessions(vec![
            session("A", "CS", true),
            session("B", "Math", true),
        ]));
        let mut d = InstructorDashboard::new(api.clone(), 10);
        d.load().await.unwrap();
        d.select(SessionId::new("A"));
        d.request_end(&SessionId::new("A"));
        let effects = d.confirm_end().await.unwrap();
        assert_eq!(effects, [Effect::Leave]);
        assert_eq!(d.selection().sessions().len(), 1);
        assert!(d.selection().selected().is_none());
    }

    #[tokio::test]
    async fn instructor_drops_session_ended_by_server() {
        let api = Arc::new(FakeApi::with_sessions(vec![
            session("A", "CS", true),
            session("B", "Math", true),
        ]));
        let mut d = InstructorDashboard::new(api.clone(), 10);
        d.load().await.unwrap();
        d.select(SessionId::new("A"));
        d.request_end(&SessionId::new("A"));

        let effects = d.handle_channel_event(ChannelEvent::Message(ServerMessage::SessionEnded(
            SessionId::new("A"),
        )));
        assert_eq!(effects, [Effect::Leave]);
        let ids: Vec<_> = d.selection().sessions().iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, ["B"]);
        assert!(d.selection().selected().is_none());
        assert!(d.selection().pending_end().is_none());
    }

    #[tokio::test]
    async fn instructor_create_with_empty_name_makes_no_call() {
        let api = Arc::new(FakeApi::default());
        let mut d = InstructorDashboard::new(api.clone(), 10);
        let date = NaiveDate::from_ymd_opt(2025, 9, 27).unwrap();
        assert!(matches!(
            d.create("", None, date).await,
            Err(QaError::Validation(_))
        ));
        assert!(api.calls().is_empty());

        let effects = d.create("CS 101", None, date).await.unwrap();
        assert_eq!(d.selection().sessions().len(), 1);
        assert!(matches!(&effects[0], Effect::Join(id) if Some(id) == d.selection().selected()));
    }
}
