// handlers/public/session.rs - Sign up, log in, restore and log out
//
// These endpoints issue the credential that `restore_user` validates. The token
// is returned in the body and also set as an HttpOnly cookie.

use axum::extract::State;
use serde::Serialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::api::format::SessionUser;
use crate::api::{AppJson, AppState};
use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::{NewUser, User};
use crate::database::DatabaseError;
use crate::error::{ApiError, FieldErrors};
use crate::handlers::payload::{LoginPayload, SignupPayload};
use crate::middleware::{clear_session_cookie, set_session_cookie, ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub user: SessionUser,
    pub token: String,
}

fn user_exists() -> ApiError {
    let mut errors = FieldErrors::new();
    errors.insert("email".to_string(), "User with that email already exists".to_string());
    ApiError::forbidden_with("User already exists", errors)
}

fn issue_session(cookies: &Cookies, user: &User) -> Result<SessionBody, ApiError> {
    let token = generate_jwt(&Claims::new(user.id, user.email.clone())).map_err(|e| {
        tracing::error!("Failed to issue session token for user {}: {}", user.id, e);
        ApiError::internal_server_error("Failed to create session")
    })?;

    set_session_cookie(cookies, token.clone());

    Ok(SessionBody {
        user: SessionUser::from(user),
        token,
    })
}

/// POST /users - create an account and start a session
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<SignupPayload>,
) -> ApiResult<SessionBody> {
    let signup = payload.validate()?;
    let email = signup.email.to_lowercase();

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(user_exists());
    }

    // Hash on the blocking pool
    let password = signup.password;
    let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Failed to create user")
        })?
        .map_err(|e| {
            tracing::error!("{}", e);
            ApiError::internal_server_error("Failed to create user")
        })?;

    let user = state
        .store
        .create_user(NewUser {
            first_name: signup.first_name,
            last_name: signup.last_name,
            email,
            hashed_password,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => user_exists(),
            other => ApiError::from(other),
        })?;

    tracing::info!("Created user {}", user.id);
    Ok(ApiResponse::created(issue_session(&cookies, &user)?))
}

/// POST /session - log in with email and password
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<LoginPayload>,
) -> ApiResult<SessionBody> {
    let (credential, password) = payload.validate()?;

    let Some(user) = state.store.find_user_by_email(&credential.to_lowercase()).await? else {
        tracing::debug!("Login for unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let hashed = user.hashed_password.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Failed to verify credentials")
        })?;

    if !verified {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    Ok(ApiResponse::success(issue_session(&cookies, &user)?))
}

/// GET /session - the current user, or null
pub async fn restore(user: Option<CurrentUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "user": user.map(SessionUser::from) })))
}

/// DELETE /session - forget the session cookie
pub async fn logout(cookies: Cookies) -> ApiResult<Value> {
    clear_session_cookie(&cookies);
    Ok(ApiResponse::success(json!({ "message": "success" })))
}
