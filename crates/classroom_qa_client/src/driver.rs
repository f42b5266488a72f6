//! Event loop for a student dashboard.
//!
//! One task owns the dashboard. UI commands, channel events, finished
//! snapshot fetches and the echo-timeout tick are taken one at a time and
//! each handler runs to completion before the next input is looked at.
//! Snapshot fetches run concurrently and are applied through their ticket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::api::QaApi;
use crate::channel::{ChannelEvent, ChannelHandle};
use crate::dashboard::{Effect, StudentDashboard};
use crate::error::QaError;
use crate::feed::SnapshotTicket;
use crate::model::{Question, QuestionId, QuestionUpdate, Session, UserId};

const EXPIRY_TICK: Duration = Duration::from_millis(250);

/// Requests from the user interface.
#[derive(Debug, Clone)]
pub enum StudentCommand {
    Login(UserId),
    Logout,
    Load(String),
    Leave,
    Ask(String),
    Update(QuestionId, QuestionUpdate),
    Delete(QuestionId),
    Refresh,
}

/// Everything a student screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentView {
    pub session: Option<Session>,
    pub asked: Vec<Question>,
    pub answered: Vec<Question>,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub connected: bool,
}

impl StudentView {
    pub fn of(dashboard: &StudentDashboard) -> Self {
        Self {
            session: dashboard.current_session().cloned(),
            asked: dashboard.asked_questions().into_iter().cloned().collect(),
            answered: dashboard.answered_questions().into_iter().cloned().collect(),
            notice: dashboard.notice().map(str::to_string),
            error: dashboard.error().map(str::to_string),
            connected: dashboard.is_connected(),
        }
    }
}

type Fetch = BoxFuture<'static, (SnapshotTicket, Result<Vec<Question>, QaError>)>;

pub struct StudentDriver {
    dashboard: StudentDashboard,
    api: Arc<dyn QaApi>,
    channel: ChannelHandle,
    question_page: u32,
    view: watch::Sender<StudentView>,
}

impl StudentDriver {
    pub fn new(
        dashboard: StudentDashboard,
        api: Arc<dyn QaApi>,
        channel: ChannelHandle,
        question_page: u32,
    ) -> (Self, watch::Receiver<StudentView>) {
        let (view, view_rx) = watch::channel(StudentView::of(&dashboard));
        (
            Self {
                dashboard,
                api,
                channel,
                question_page,
                view,
            },
            view_rx,
        )
    }

    /// Run until the command sender or the channel goes away. Returns the
    /// dashboard for inspection.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        mut commands: mpsc::Receiver<StudentCommand>,
    ) -> StudentDashboard {
        let mut fetches: FuturesUnordered<Fetch> = FuturesUnordered::new();
        let mut tick = tokio::time::interval(EXPIRY_TICK);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let effects = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.command(command).await,
                    None => break,
                },
                event = events.recv() => match event {
                    Some(event) => self.dashboard.handle_channel_event(event),
                    None => break,
                },
                Some((ticket, result)) = fetches.next(), if !fetches.is_empty() => {
                    let applied = self.dashboard.finish_snapshot(&ticket, result);
                    debug!(session = %ticket.session_id(), applied, "snapshot finished");
                    Vec::new()
                },
                _ = tick.tick() => self.dashboard.expire_submissions(Instant::now()),
            };
            for effect in effects {
                self.perform(effect, &mut fetches);
            }
            self.view.send_if_modified(|view| {
                let next = StudentView::of(&self.dashboard);
                if *view == next {
                    false
                } else {
                    *view = next;
                    true
                }
            });
        }

        info!("student driver stopped");
        self.channel.shutdown();
        self.dashboard
    }

    async fn command(&mut self, command: StudentCommand) -> Vec<Effect> {
        let d = &mut self.dashboard;
        match command {
            StudentCommand::Login(user) => d.login(user),
            StudentCommand::Logout => d.logout(),
            StudentCommand::Load(code) => d.load_session(&code).await.unwrap_or_default(),
            StudentCommand::Leave => d.leave_session(),
            StudentCommand::Ask(text) => {
                let _ = d.submit_question(&text).await;
                Vec::new()
            }
            StudentCommand::Update(id, update) => {
                let _ = d.update_question(&id, &update).await;
                Vec::new()
            }
            StudentCommand::Delete(id) => {
                let _ = d.delete_question(&id).await;
                Vec::new()
            }
            StudentCommand::Refresh => d.refresh(),
        }
    }

    fn perform(&self, effect: Effect, fetches: &mut FuturesUnordered<Fetch>) {
        match effect {
            Effect::Join(id) => self.channel.join(id),
            Effect::Leave => self.channel.leave(),
            Effect::Snapshot(ticket) => {
                let api = self.api.clone();
                let limit = self.question_page;
                fetches.push(
                    async move {
                        let result = api.get_questions(ticket.session_id(), limit).await;
                        (ticket, result)
                    }
                    .boxed(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::channel::Command;
    use crate::messages::ServerMessage;
    use crate::model::SessionId;
    use crate::store::MemorySessionStore;
    use crate::testutil::{question, session};

    async fn until(
        view: &mut watch::Receiver<StudentView>,
        what: impl FnMut(&StudentView) -> bool,
    ) -> StudentView {
        tokio::time::timeout(Duration::from_secs(5), view.wait_for(what))
            .await
            .expect("view condition in time")
            .expect("driver alive")
            .clone()
    }

    #[tokio::test]
    async fn drives_join_snapshot_and_realtime_updates() {
        let api = Arc::new(FakeApi::with_sessions(vec![session("A", "CS", true)]));
        api.questions
            .lock()
            .unwrap()
            .insert(SessionId::new("A"), vec![question("q1", "A", "me", "first")]);
        let store = Arc::new(MemorySessionStore::new());
        let dashboard = StudentDashboard::new(api.clone(), store, Duration::from_secs(5));
        let (channel, mut channel_commands) = ChannelHandle::detached();
        let (driver, mut view) = StudentDriver::new(dashboard, api.clone(), channel, 50);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(8);
        let task = tokio::spawn(driver.run(event_rx, command_rx));

        command_tx.send(StudentCommand::Login(UserId::new("me"))).await.unwrap();
        command_tx.send(StudentCommand::Load("A".into())).await.unwrap();
        let v = until(&mut view, |v| v.asked.len() == 1).await;
        assert_eq!(v.session.map(|s| s.session_id), Some(SessionId::new("A")));
        assert_eq!(
            channel_commands.recv().await,
            Some(Command::Join(SessionId::new("A")))
        );
        assert!(api.calls().contains(&"get_questions:A:50".to_string()));

        event_tx.send(ChannelEvent::Connected).unwrap();
        event_tx
            .send(ChannelEvent::Message(ServerMessage::NewQuestion(question(
                "x1", "B", "me", "foreign",
            ))))
            .unwrap();
        event_tx
            .send(ChannelEvent::Message(ServerMessage::NewQuestion(question(
                "q2", "A", "me", "second",
            ))))
            .unwrap();
        let v = until(&mut view, |v| v.asked.len() == 2).await;
        assert!(v.connected);
        assert_eq!(v.asked[0].id.as_str(), "q2");

        event_tx
            .send(ChannelEvent::Message(ServerMessage::SessionEnded(SessionId::new("A"))))
            .unwrap();
        let v = until(&mut view, |v| v.session.is_none()).await;
        assert!(v.asked.is_empty());
        assert!(v.notice.is_some());
        assert_eq!(channel_commands.recv().await, Some(Command::Leave));

        drop(command_tx);
        let dashboard = task.await.unwrap();
        assert!(dashboard.current_session().is_none());
        assert_eq!(channel_commands.recv().await, Some(Command::Shutdown));
    }

    #[tokio::test]
    async fn load_failure_is_published_as_error() {
        let api = Arc::new(FakeApi::default());
        let dashboard = StudentDashboard::new(
            api.clone(),
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(5),
        );
        let (channel, _channel_commands) = ChannelHandle::detached();
        let (driver, mut view) = StudentDriver::new(dashboard, api, channel, 50);
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(8);
        tokio::spawn(driver.run(event_rx, command_rx));

        command_tx.send(StudentCommand::Load("NOPE".into())).await.unwrap();
        let v = until(&mut view, |v| v.error.is_some()).await;
        assert!(v.error.unwrap().contains("not found"));
        assert!(v.session.is_none());
    }
}
