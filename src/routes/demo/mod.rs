pub mod applications;
pub mod auth;
pub mod employer_chat;
pub mod messages;
pub mod screening;
pub mod vacancies;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::middleware::auth::{require_bearer_auth, JwtSecret};
use crate::models::application::Application;
use crate::models::vacancy::Vacancy;
use crate::store::{seed::seed_test_data, DemoStore};

use self::screening::ScriptedScreener;

/// In-process stand-in for the recruitment backend.
#[derive(Clone)]
pub struct DemoState {
    pub store: DemoStore,
    pub jwt_secret: JwtSecret,
    pub screener: ScriptedScreener,
    pub max_resume_bytes: u64,
    /// Extracted resume text keyed by application id.
    pub resumes: Arc<RwLock<HashMap<i64, String>>>,
}

impl DemoState {
    pub fn new(store: DemoStore, jwt_secret: &str, max_resume_bytes: u64) -> Self {
        Self {
            store,
            jwt_secret: JwtSecret(Arc::from(jwt_secret)),
            screener: ScriptedScreener::new(),
            max_resume_bytes,
            resumes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let secret = config.jwt_secret.as_deref().ok_or_else(|| {
            Error::Config("JWT_SECRET is required when DEMO_BACKEND is enabled".to_string())
        })?;
        let state = Self::new(DemoStore::in_memory(), secret, config.max_resume_bytes);
        if config.seed_test_data {
            seed_test_data(&state.store).await?;
        }
        Ok(state)
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret.0
    }

    pub async fn vacancy(&self, id: i64) -> Result<Vacancy> {
        self.store
            .vacancies
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Vacancy not found".to_string()))
    }

    pub async fn application(&self, id: i64) -> Result<Application> {
        self.store
            .applications
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    pub fn resume_text(&self, application_id: i64) -> Option<String> {
        self.resumes
            .read()
            .ok()
            .and_then(|r| r.get(&application_id).cloned())
    }
}

pub fn router(state: DemoState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/vacancies", post(vacancies::create_vacancy))
        .route(
            "/vacancies/:id",
            axum::routing::put(vacancies::update_vacancy).delete(vacancies::delete_vacancy),
        )
        .route(
            "/applications/:id/action",
            post(applications::application_action),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_secret.clone(),
            require_bearer_auth,
        ));

    let open = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/vacancies", get(vacancies::list_vacancies))
        .route("/vacancies/:id", get(vacancies::get_vacancy))
        .route(
            "/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/applications/:id",
            get(applications::get_application).patch(applications::update_application),
        )
        .route(
            "/applications/:id/upload-resume",
            post(applications::upload_resume)
                .layer(DefaultBodyLimit::max(upload_body_limit(state.max_resume_bytes))),
        )
        .route("/applications/:id/analyze", post(screening::analyze))
        .route("/applications/:id/chat", post(screening::chat))
        .route(
            "/applications/:id/session/:session_id",
            get(screening::get_session),
        )
        .route(
            "/applications/:id/employer-chat",
            get(employer_chat::list_messages).post(employer_chat::send_message),
        )
        .route(
            "/applications/:id/employer-chat/:message_id/read",
            patch(employer_chat::mark_read),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        );

    open.merge(protected).with_state(state)
}

/// Room for the file plus multipart framing.
pub fn upload_body_limit(max_resume_bytes: u64) -> usize {
    usize::try_from(max_resume_bytes.saturating_mul(2)).unwrap_or(usize::MAX)
}
