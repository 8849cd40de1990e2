use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tower_cookies::{cookie::time, cookie::SameSite, Cookie, Cookies};

use crate::api::AppState;
use crate::auth::validate_jwt;
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;

/// The authenticated caller, stored in request extensions by `restore_user`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

/// Handlers that take a `CurrentUser` argument require authentication; the
/// rejection is the standard 401 body. Use `Option<CurrentUser>` to make it optional.
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::authentication_required)
    }
}

/// Resolves the session credential (if any) into a `CurrentUser`.
///
/// Never rejects on a bad credential: the request continues anonymously and
/// the stale cookie is cleared. Handlers that need a user take `CurrentUser`.
pub async fn restore_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_name = &config::config().security.session_cookie;

    let cookie_token = cookies.get(cookie_name).map(|c| c.value().to_string());

    if let Some(token) = extract_token(request.headers(), cookie_token.as_deref()) {
        match validate_jwt(&token) {
            Ok(claims) => match state.store.find_user(claims.sub).await? {
                Some(user) => {
                    tracing::debug!("Restored session for user {}", user.id);
                    request.extensions_mut().insert(CurrentUser::from(user));
                }
                None => {
                    tracing::debug!("Session token refers to unknown user {}", claims.sub);
                    clear_session_cookie(&cookies);
                }
            },
            Err(e) => {
                tracing::debug!("Ignoring session token: {}", e);
                clear_session_cookie(&cookies);
            }
        }
    }

    Ok(next.run(request).await)
}

/// Bearer token first, then the session cookie
fn extract_token(headers: &HeaderMap, cookie_token: Option<&str>) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer
        .or(cookie_token)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub fn set_session_cookie(cookies: &Cookies, token: String) {
    let security = &config::config().security;
    let cookie = Cookie::build((security.session_cookie.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.require_https)
        .max_age(time::Duration::hours(security.jwt_expiry_hours as i64))
        .build();
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let name = config::config().security.session_cookie.clone();
    cookies.remove(Cookie::build((name, "")).path("/").build());
}
