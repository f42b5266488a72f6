//! REST client for the session/question API.
//!
//! State machines talk to the server through [`QaApi`] so they can run
//! against [`HttpApi`] in production and an in-memory fake in tests.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{QaError, Resource};
use crate::model::{
    NewQuestion, NewSession, Question, QuestionId, QuestionUpdate, Session, SessionId,
};

/// Logical REST surface consumed by the client.
#[async_trait]
pub trait QaApi: Send + Sync {
    /// Most recent sessions created by the caller.
    async fn get_my_sessions(&self, limit: u32, active_only: bool)
        -> Result<Vec<Session>, QaError>;
    async fn create_session(&self, session: &NewSession) -> Result<Session, QaError>;
    async fn end_session(&self, session_id: &SessionId) -> Result<(), QaError>;
    async fn get_session(&self, session_id: &SessionId) -> Result<Session, QaError>;
    async fn join_session(&self, session_id: &SessionId) -> Result<(), QaError>;
    async fn get_questions(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<Question>, QaError>;
    async fn submit_question(&self, question: &NewQuestion) -> Result<(), QaError>;
    async fn update_question(
        &self,
        question_id: &QuestionId,
        update: &QuestionUpdate,
    ) -> Result<(), QaError>;
    async fn delete_question(&self, question_id: &QuestionId) -> Result<(), QaError>;
}

#[derive(Deserialize)]
struct SessionsEnvelope {
    sessions: Vec<Session>,
}

#[derive(Deserialize)]
struct SessionEnvelope {
    session: Session,
}

#[derive(Deserialize)]
struct QuestionsEnvelope {
    questions: Vec<Question>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`QaApi`] over HTTP with bearer-token auth.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpApi {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            auth_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        builder: RequestBuilder,
        resource: Resource,
        id: &str,
    ) -> Result<reqwest::Response, QaError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| format!("request failed with status {}", status));
        if status == StatusCode::NOT_FOUND {
            Err(QaError::not_found(resource, id))
        } else {
            Err(QaError::Network(message))
        }
    }

    async fn json<T: DeserializeOwned>(
        builder: RequestBuilder,
        resource: Resource,
        id: &str,
    ) -> Result<T, QaError> {
        let response = Self::send(builder, resource, id).await?;
        Ok(response.json::<T>().await?)
    }

    async fn empty(builder: RequestBuilder, resource: Resource, id: &str) -> Result<(), QaError> {
        Self::send(builder, resource, id).await.map(|_| ())
    }
}

#[async_trait]
impl QaApi for HttpApi {
    async fn get_my_sessions(
        &self,
        limit: u32,
        active_only: bool,
    ) -> Result<Vec<Session>, QaError> {
        let req = self
            .request(Method::GET, "/sessions/my")
            .query(&[("limit", limit.to_string()), ("active", active_only.to_string())]);
        let body: SessionsEnvelope = Self::json(req, Resource::Session, "").await?;
        Ok(body.sessions)
    }

    async fn create_session(&self, session: &NewSession) -> Result<Session, QaError> {
        let req = self.request(Method::POST, "/sessions").json(session);
        let body: SessionEnvelope = Self::json(req, Resource::Session, "").await?;
        Ok(body.session)
    }

    async fn end_session(&self, session_id: &SessionId) -> Result<(), QaError> {
        let req = self.request(Method::PATCH, &format!("/sessions/{}/end", session_id));
        Self::empty(req, Resource::Session, session_id.as_str()).await
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<Session, QaError> {
        let req = self.request(Method::GET, &format!("/sessions/{}", session_id));
        let body: SessionEnvelope = Self::json(req, Resource::Session, session_id.as_str()).await?;
        Ok(body.session)
    }

    async fn join_session(&self, session_id: &SessionId) -> Result<(), QaError> {
        let req = self.request(Method::POST, &format!("/sessions/{}/join", session_id));
        Self::empty(req, Resource::Session, session_id.as_str()).await
    }

    async fn get_questions(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<Question>, QaError> {
        let req = self
            .request(Method::GET, &format!("/questions/session/{}", session_id))
            .query(&[("limit", limit.to_string())]);
        let body: QuestionsEnvelope = Self::json(req, Resource::Session, session_id.as_str()).await?;
        Ok(body.questions)
    }

    async fn submit_question(&self, question: &NewQuestion) -> Result<(), QaError> {
        let req = self.request(Method::POST, "/questions").json(question);
        Self::empty(req, Resource::Session, question.session_id.as_str()).await
    }

    async fn update_question(
        &self,
        question_id: &QuestionId,
        update: &QuestionUpdate,
    ) -> Result<(), QaError> {
        let req = self
            .request(Method::PATCH, &format!("/questions/{}", question_id))
            .json(update);
        Self::empty(req, Resource::Question, question_id.as_str()).await
    }

    async fn delete_question(&self, question_id: &QuestionId) -> Result<(), QaError> {
        let req = self.request(Method::DELETE, &format!("/questions/{}", question_id));
        Self::empty(req, Resource::Question, question_id.as_str()).await
    }
}
