use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    dto::analysis_dto::{AnalysisReply, AnalyzeRequest, ChatTurnRequest},
    error::{Error, Result},
    models::{
        application::{Application, ApplicationStatus},
        interview::DialogStage,
        vacancy::Vacancy,
    },
    routes::demo::DemoState,
    utils::token::generate_session_id,
};

pub const MAX_ANSWERS: usize = 5;
pub const CLOSING_LINE: &str = "Thank you for your answers! We will get back to you soon.";

const STOPWORDS: [&str; 16] = [
    "and", "with", "the", "for", "years", "year", "experience", "of", "in", "or", "a", "an",
    "skills", "knowledge", "basic", "good",
];

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningSession {
    pub session_id: String,
    pub application_id: i64,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub keywords: Vec<String>,
    pub profile_text: String,
    pub relevance_percent: f64,
    pub reasons: Vec<String>,
    pub summary_for_employer: String,
    pub is_completed: bool,
}

impl ScreeningSession {
    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    fn reply(&self, bot_reply: String) -> AnalysisReply {
        AnalysisReply {
            session_id: self.session_id.clone(),
            relevance_percent: self.relevance_percent,
            reasons: self.reasons.clone(),
            summary_for_employer: self.summary_for_employer.clone(),
            bot_reply: Some(bot_reply),
            dialog_stage: Some(if self.is_completed {
                DialogStage::Completed
            } else {
                DialogStage::Questioning
            }),
            is_completed: self.is_completed,
            bot_replies: Vec::new(),
            followup_questions: Vec::new(),
        }
    }

    fn evidence(&self) -> String {
        let mut text = self.profile_text.to_lowercase();
        for answer in &self.answers {
            text.push(' ');
            text.push_str(&answer.to_lowercase());
        }
        text
    }

    fn matched_keywords(&self) -> Vec<&str> {
        let evidence = self.evidence();
        self.keywords
            .iter()
            .filter(|k| evidence.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// 70% requirement coverage, 30% answer depth.
    fn score(&self) -> f64 {
        let coverage = if self.keywords.is_empty() {
            0.5
        } else {
            self.matched_keywords().len() as f64 / self.keywords.len() as f64
        };
        let depth = if self.answers.is_empty() {
            0.0
        } else {
            let words: usize = self.answers.iter().map(|a| a.split_whitespace().count()).sum();
            (words as f64 / self.answers.len() as f64 / 30.0).min(1.0)
        };
        (100.0 * (0.7 * coverage + 0.3 * depth)).round().clamp(0.0, 100.0)
    }

    fn finish(&mut self) {
        self.relevance_percent = self.score();
        let matched: BTreeSet<&str> = self.matched_keywords().into_iter().collect();
        let mut reasons: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| !matched.contains(k.as_str()))
            .take(3)
            .map(|k| format!("No evidence of experience with {}", k))
            .collect();
        let brief = self
            .answers
            .iter()
            .all(|a| a.split_whitespace().count() < 5);
        if brief {
            reasons.push("Answers were very brief".to_string());
        }
        self.summary_for_employer = format!(
            "{} of {} key requirements confirmed; relevance {}% after {} answers.",
            matched.len(),
            self.keywords.len(),
            self.relevance_percent,
            self.answers.len()
        );
        self.reasons = reasons;
        self.is_completed = true;
    }
}

pub fn requirement_keywords(requirements: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    requirements
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| t.len() >= 2)
        .filter(|t| !t.starts_with(|c: char| c.is_ascii_digit()))
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn questions_for(vacancy: &Vacancy) -> Vec<String> {
    let focus = if vacancy.requirements.trim().is_empty() {
        "the main tools of this role".to_string()
    } else {
        vacancy.requirements.trim().to_string()
    };
    vec![
        format!(
            "Hello! I am the screening assistant for the {} position at {}. To start, tell me briefly about your most relevant experience.",
            vacancy.title, vacancy.company
        ),
        format!("Which of these have you used in practice, and for how long: {}?", focus),
        "Describe a recent project you are proud of and your exact role in it.".to_string(),
        "What are your expectations regarding salary and working format?".to_string(),
        "When could you start, and is there anything else we should know?".to_string(),
    ]
}

/// Deterministic interviewer standing in for the AI screening service.
#[derive(Clone, Default)]
pub struct ScriptedScreener {
    sessions: Arc<Mutex<HashMap<String, ScreeningSession>>>,
}

impl ScriptedScreener {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ScreeningSession>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::Internal("screening sessions lock poisoned".to_string()))
    }

    pub fn open(
        &self,
        application: &Application,
        vacancy: &Vacancy,
        profile_text: String,
    ) -> Result<AnalysisReply> {
        let mut session = ScreeningSession {
            session_id: generate_session_id(24),
            application_id: application.id,
            questions: questions_for(vacancy),
            answers: Vec::new(),
            keywords: requirement_keywords(&vacancy.requirements),
            profile_text,
            relevance_percent: 0.0,
            reasons: Vec::new(),
            summary_for_employer: String::new(),
            is_completed: false,
        };
        session.relevance_percent = session.score();
        let reply = session.reply(session.questions[0].clone());
        self.sessions()?.insert(session.session_id.clone(), session);
        Ok(reply)
    }

    /// Records one answer. Returns the reply and, when this answer closed the dialog, the final session.
    pub fn answer(
        &self,
        application_id: i64,
        session_id: &str,
        message: &str,
    ) -> Result<(AnalysisReply, Option<ScreeningSession>)> {
        let mut sessions = self.sessions()?;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| s.application_id == application_id)
            .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

        if session.is_completed {
            return Ok((session.reply(CLOSING_LINE.to_string()), None));
        }

        session.answers.push(message.trim().to_string());
        let asked = session.answers.len();
        if asked >= MAX_ANSWERS || asked >= session.questions.len() {
            session.finish();
            return Ok((session.reply(CLOSING_LINE.to_string()), Some(session.clone())));
        }
        session.relevance_percent = session.score();
        let next = session.questions[asked].clone();
        Ok((session.reply(next), None))
    }

    pub fn get(&self, session_id: &str) -> Result<ScreeningSession> {
        self.sessions()?
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Session not found".to_string()))
    }
}

pub async fn analyze(
    State(state): State<DemoState>,
    Path(application_id): Path<i64>,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<impl IntoResponse> {
    let application = state.application(application_id).await?;
    let vacancy = state.vacancy(application.vacancy_id).await?;
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let profile = [
        request.cv_text,
        state.resume_text(application_id),
        application.cover_letter.clone(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n");

    let reply = state.screener.open(&application, &vacancy, profile)?;
    tracing::info!(
        application_id,
        session_id = %reply.session_id,
        relevance = reply.relevance_percent,
        "Screening session opened"
    );
    Ok(Json(reply))
}

pub async fn chat(
    State(state): State<DemoState>,
    Path(application_id): Path<i64>,
    Json(request): Json<ChatTurnRequest>,
) -> Result<impl IntoResponse> {
    if request.message.trim().is_empty() {
        return Err(Error::BadRequest("Message must not be empty".to_string()));
    }
    let (reply, finished) =
        state
            .screener
            .answer(application_id, &request.session_id, &request.message)?;

    if let Some(session) = finished {
        let mut application = state.application(application_id).await?;
        application.relevance_score = Some(session.relevance_percent / 100.0);
        application.ai_summary = Some(session.summary_for_employer.clone());
        application.mismatch_reasons = session.reasons.clone();
        application.chat_completed = true;
        if application.status == ApplicationStatus::Pending {
            application.status = ApplicationStatus::Reviewed;
        }
        application.updated_at = Some(Utc::now());
        state.store.applications.update(application).await?;
        tracing::info!(
            application_id,
            relevance = session.relevance_percent,
            "Screening completed"
        );
    }
    Ok(Json(reply))
}

pub async fn get_session(
    State(state): State<DemoState>,
    Path((application_id, session_id)): Path<(i64, String)>,
) -> Result<impl IntoResponse> {
    let session = state.screener.get(&session_id)?;
    if session.application_id != application_id {
        return Err(Error::NotFound("Session not found".to_string()));
    }
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Application, Vacancy) {
        let vacancy: Vacancy = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Backend Engineer",
            "company": "Acme",
            "requirements": "3+ years of Rust, Tokio, PostgreSQL and Docker",
            "created_at": "2024-05-01T10:00:00Z",
            "employer_id": 1
        }))
        .unwrap();
        let application: Application = serde_json::from_value(serde_json::json!({
            "id": 9,
            "status": "pending",
            "created_at": "2024-05-02T10:00:00Z",
            "job_seeker_id": 2,
            "vacancy_id": 3
        }))
        .unwrap();
        (application, vacancy)
    }

    #[test]
    fn keywords_skip_numbers_and_filler() {
        assert_eq!(
            requirement_keywords("3+ years of Rust, Tokio, PostgreSQL and Docker"),
            vec!["rust", "tokio", "postgresql", "docker"]
        );
        assert_eq!(requirement_keywords("C#, Next.js, c#"), vec!["c#", "next.js"]);
    }

    #[test]
    fn dialog_completes_after_five_answers_and_repeats_result() {
        let screener = ScriptedScreener::new();
        let (application, vacancy) = fixtures();
        let opened = screener
            .open(&application, &vacancy, "Rust developer".to_string())
            .unwrap();
        assert!(!opened.is_completed);
        assert!(opened.relevance_percent < 40.0);

        let answers = [
            "Four years of Rust services on Tokio",
            "PostgreSQL daily, Docker for deployments",
            "Built a payment gateway",
            "Remote, market rate",
            "In two weeks",
        ];
        let mut last = None;
        for (i, answer) in answers.iter().enumerate() {
            let (reply, finished) = screener.answer(9, &opened.session_id, answer).unwrap();
            assert_eq!(reply.is_completed, i == answers.len() - 1);
            last = Some((reply, finished));
        }
        let (final_reply, finished) = last.unwrap();
        let session = finished.expect("final answer closes the session");
        assert_eq!(session.question_count(), 5);
        assert_eq!(final_reply.dialog_stage, Some(DialogStage::Completed));
        assert!(final_reply.relevance_percent >= 70.0);

        let (again, closed_now) = screener.answer(9, &opened.session_id, "hello?").unwrap();
        assert!(again.is_completed);
        assert!(closed_now.is_none());
        assert_eq!(again.relevance_percent, final_reply.relevance_percent);
        assert_eq!(screener.get(&opened.session_id).unwrap().answers.len(), 5);
    }

    #[test]
    fn session_is_bound_to_its_application() {
        let screener = ScriptedScreener::new();
        let (application, vacancy) = fixtures();
        let opened = screener.open(&application, &vacancy, String::new()).unwrap();
        assert!(matches!(
            screener.answer(10, &opened.session_id, "hi"),
            Err(Error::NotFound(_))
        ));
    }
}
