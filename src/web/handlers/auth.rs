use crate::services::auth;
use crate::services::session::SESSION_COOKIE;
use crate::web::error::{ApiError, ApiResult};
use crate::web::extractors::{CurrentOperator, JsonBody};
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use time::Duration;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    JsonBody(form): JsonBody<LoginForm>,
) -> ApiResult<Response> {
    let email = form.email.trim();

    if let Err(errors) = auth::validate_login(email, &form.password) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "errors": errors })),
        )
            .into_response());
    }

    let rate_key = format!("login:{}", email.to_lowercase());
    if !state.login_limiter.check(&rate_key) {
        tracing::warn!(email = %email, "Login rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }

    match auth::authenticate(&state.config.auth, email, &form.password) {
        Some(subject) => {
            state.login_limiter.clear(&rate_key);
            let session = state.sessions.issue(&subject);
            let cookie = Cookie::build((SESSION_COOKIE, session.token()))
                .path("/")
                .http_only(true)
                .secure(state.config.auth.secure_cookie)
                .same_site(SameSite::Lax)
                .max_age(Duration::seconds(session.lifetime_secs()))
                .build();

            tracing::info!(subject = %subject, "Operator logged in");
            Ok((
                jar.add(cookie),
                Json(serde_json::json!({
                    "subject": subject,
                    "expiresAt": session.expires_at,
                })),
            )
                .into_response())
        }
        None => {
            state.login_limiter.record_attempt(&rate_key);
            tracing::warn!(email = %email, "Failed login attempt");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "errors": { "email": [auth::INVALID_CREDENTIALS] }
                })),
            )
                .into_response())
        }
    }
}

/// Drops the holder's copy of the session. The token itself stays valid
/// until it expires.
pub async fn logout(CurrentOperator(subject): CurrentOperator, jar: CookieJar) -> Response {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    tracing::info!(subject = %subject, "Operator logged out");
    (
        jar.remove(cookie),
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}
