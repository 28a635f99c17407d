pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::auth::AuthContext;
use crate::middleware::in_flight::InFlightGuard;
use crate::services::backend_client::BackendClient;
use crate::services::interview_service::{InterviewRegistry, InterviewSettings, ScreeningBackend};

const BACKEND_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: Client,
    pub interviews: InterviewRegistry,
    pub in_flight: InFlightGuard,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(BACKEND_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            config: Arc::new(config.clone()),
            http_client,
            interviews: InterviewRegistry::new(InterviewSettings::from_config(config)),
            in_flight: InFlightGuard::new(),
        })
    }

    /// Backend client acting on behalf of the caller.
    pub fn backend(&self, auth: &AuthContext) -> BackendClient {
        self.anonymous_backend().with_token(auth.token.clone())
    }

    pub fn anonymous_backend(&self) -> BackendClient {
        BackendClient::from_config(self.http_client.clone(), &self.config)
    }

    pub fn screening_backend(&self, auth: &AuthContext) -> Arc<dyn ScreeningBackend> {
        Arc::new(self.backend(auth))
    }
}
