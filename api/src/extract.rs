use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::AppState;
use crate::auth::{Identity, decode_token};
use crate::error::ApiError;

/// JSON extractor that reports a malformed body or missing field as a
/// structured 400 instead of axum's plain-text rejection. Doubles as the
/// response type so handlers use one `Json` in both directions.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Token middleware for every protected route: verifies the Bearer token and
/// injects the verified identity into the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        bearer_token(&req).ok_or(ApiError::Unauthorized("Missing authorization token"))?;
    let claims = decode_token(&token, &state.auth)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;
    req.extensions_mut().insert(Identity::from(claims));
    Ok(next.run(req).await)
}

/// Role middleware for mutation routes, composed after `require_auth`.
pub async fn require_hr(req: Request, next: Next) -> Result<Response, ApiError> {
    match req.extensions().get::<Identity>() {
        Some(identity) if identity.is_hr() => Ok(next.run(req).await),
        Some(identity) => {
            tracing::warn!(username = %identity.username, "non-HR mutation attempt");
            Err(ApiError::Forbidden)
        }
        None => Err(ApiError::Unauthorized("Missing authorization token")),
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?;
    let text = value.to_str().ok()?;
    text.strip_prefix("Bearer ")
        .map(|rest| rest.trim().to_string())
}
