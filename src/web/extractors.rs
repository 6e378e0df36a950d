use crate::services::session::SESSION_COOKIE;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::{async_trait, Json};
use axum_extra::extract::CookieJar;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The authenticated operator. Taking this extractor is what gates a route:
/// without a valid session cookie the request is rejected with 401 before
/// the handler runs.
pub struct CurrentOperator(pub String);

impl FromRequestParts<Arc<AppState>> for CurrentOperator {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(ApiError::Unauthorized)?;

            let subject = state
                .sessions
                .validate(&token)
                .ok_or(ApiError::Unauthorized)?;

            Ok(CurrentOperator(subject))
        })
    }
}

/// `Json<T>` whose rejection renders as our 400 error body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
            })?;
        Ok(JsonBody(value))
    }
}
