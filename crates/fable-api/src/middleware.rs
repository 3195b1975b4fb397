use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use fable_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// The per-request identity: decoded once by `identify`, threaded through
/// request extensions. `None` means an anonymous visitor.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Claims>);

/// Extract and validate the JWT carried in the `session` cookie.
pub fn decode_session(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let token = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Runs on every route: resolves the session cookie into a `CurrentUser`
/// extension so no handler reads ambient session state itself.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = decode_session(req.headers(), &state.session_secret);
    req.extensions_mut().insert(CurrentUser(claims));
    next.run(req).await
}

/// API gate: anonymous callers get 401 JSON.
pub async fn require_auth_api(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|u| u.0.clone())
        .ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Page gate: anonymous visitors are sent to the auth page, carrying the
/// path they wanted so login can return them there.
pub async fn require_auth_page(mut req: Request, next: Next) -> Response {
    let claims = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|u| u.0.clone());

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => Redirect::to(&format!("/auth?next={}", req.uri().path())).into_response(),
    }
}
