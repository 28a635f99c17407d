#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use reqwest::Client;
use serde_json::Value as JsonValue;
use smartbot_portal::{
    config::{Config, DEFAULT_MAX_RESUME_BYTES},
    dto::{application_dto::NewApplication, auth_dto::RegisterPayload},
    models::{
        application::Application,
        user::{User, UserRole},
    },
    routes::{self, demo::DemoState},
    services::backend_client::BackendClient,
    store::{
        seed::{seed_test_data, SEED_EMPLOYER_EMAIL, SEED_PASSWORD, SEED_SEEKER_EMAIL},
        DemoStore,
    },
    AppState,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test_secret_key";

/// Seeded demo backend listening on an ephemeral port; returns its base URL.
pub async fn spawn_demo_backend() -> String {
    let store = DemoStore::in_memory();
    seed_test_data(&store).await.expect("seed demo data");
    let state = DemoState::new(store, JWT_SECRET, DEFAULT_MAX_RESUME_BYTES);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, routes::demo::router(state))
            .await
            .expect("demo backend");
    });
    format!("http://{}", addr)
}

pub fn portal(backend_url: &str) -> Router {
    let state = AppState::new(&Config::for_backend(backend_url)).expect("app state");
    routes::portal_router(state)
}

pub fn client(backend_url: &str) -> BackendClient {
    BackendClient::new(Client::new(), backend_url)
}

pub struct Session {
    pub token: String,
    pub user: User,
}

pub async fn login(backend_url: &str, email: &str) -> Session {
    let response = client(backend_url)
        .login(email, SEED_PASSWORD)
        .await
        .expect("login");
    Session {
        token: response.access_token,
        user: response.user,
    }
}

pub async fn employer(backend_url: &str) -> Session {
    login(backend_url, SEED_EMPLOYER_EMAIL).await
}

pub async fn seeker(backend_url: &str) -> Session {
    login(backend_url, SEED_SEEKER_EMAIL).await
}

/// Registers a fresh job seeker account and logs it in.
pub async fn register_seeker(backend_url: &str, email: &str) -> Session {
    let response = client(backend_url)
        .register(&RegisterPayload {
            email: email.to_string(),
            password: SEED_PASSWORD.to_string(),
            full_name: "Second Seeker".to_string(),
            phone: None,
            role: UserRole::JobSeeker,
        })
        .await
        .expect("register");
    Session {
        token: response.access_token,
        user: response.user,
    }
}

/// Seeker applies to the first seeded vacancy.
pub async fn apply(backend_url: &str, seeker: &Session, cover_letter: &str) -> Application {
    let vacancy_id = client(backend_url)
        .list_vacancies(&Default::default())
        .await
        .expect("vacancies")
        .vacancies
        .iter()
        .map(|v| v.id)
        .min()
        .expect("seeded vacancy");
    client(backend_url)
        .with_token(seeker.token.clone())
        .create_application(
            seeker.user.id,
            &NewApplication {
                vacancy_id,
                cover_letter: Some(cover_letter.to_string()),
            },
        )
        .await
        .expect("create application")
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}
