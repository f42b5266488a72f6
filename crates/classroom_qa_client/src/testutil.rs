//! Record builders for unit tests.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::model::{Author, Question, QuestionId, QuestionStatus, Session, SessionId, UserId};

pub fn session(id: &str, course: &str, active: bool) -> Session {
    Session {
        session_id: SessionId::new(id),
        course_name: course.to_string(),
        description: None,
        session_date: NaiveDate::from_ymd_opt(2025, 9, 27).unwrap(),
        created_at: Utc.with_ymd_and_hms(2025, 9, 27, 9, 0, 0).unwrap(),
        is_active: active,
        created_by: Some(Author {
            id: UserId::new("teacher-1"),
            name: Some("Prof. Rao".into()),
        }),
        question_count: 0,
    }
}

pub fn question(id: &str, session: &str, author: &str, text: &str) -> Question {
    Question {
        id: QuestionId::new(id),
        session_id: SessionId::new(session),
        author: Author {
            id: UserId::new(author),
            name: None,
        },
        text: text.to_string(),
        status: QuestionStatus::Asked,
        created_at: None,
        updated_at: None,
    }
}

pub fn answered(mut q: Question) -> Question {
    q.status = QuestionStatus::Answered;
    q
}
