use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse, RegisterPayload},
    error::{Error, Result},
    models::user::User,
    routes::demo::DemoState,
    store::Account,
    utils::{
        crypto::{hash_password, verify_password},
        token::{issue_access_token, Claims},
    },
};

pub async fn register(
    State(state): State<DemoState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if state.store.account_by_email(&payload.email).await?.is_some() {
        return Err(Error::BadRequest("Email already registered".to_string()));
    }

    let account = state
        .store
        .accounts
        .create(Account {
            user: User {
                id: 0,
                email: payload.email.trim().to_lowercase(),
                full_name: payload.full_name.trim().to_string(),
                phone: payload.phone.filter(|p| !p.trim().is_empty()),
                role: payload.role,
                is_active: true,
                created_at: Some(Utc::now()),
                updated_at: None,
            },
            password_hash: hash_password(&payload.password)?,
        })
        .await?;
    tracing::info!(user_id = account.user.id, role = account.user.role.as_str(), "Registered user");
    Ok((StatusCode::CREATED, Json(account.user)))
}

pub async fn login(
    State(state): State<DemoState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let account = state
        .store
        .account_by_email(&payload.email)
        .await?
        .filter(|a| a.user.is_active && verify_password(&payload.password, &a.password_hash))
        .ok_or_else(|| Error::Unauthorized("Incorrect email or password".to_string()))?;

    let access_token = issue_access_token(&account.user, state.jwt_secret())?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: account.user,
    }))
}

pub async fn me(
    State(state): State<DemoState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(user))
}

pub async fn current_user(state: &DemoState, claims: &Claims) -> Result<User> {
    let id = claims
        .user_id()
        .ok_or_else(|| Error::Unauthorized("invalid_token".to_string()))?;
    state
        .store
        .accounts
        .get(id)
        .await?
        .map(|a| a.user)
        .ok_or_else(|| Error::Unauthorized("User no longer exists".to_string()))
}
