//! Single-operator authentication: one configured credential pair, opaque
//! bearer tokens held in process memory. Restarting the server logs the
//! editor out, which is acceptable for a one-admin deployment.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionToken>, AppError> {
    let ok = credentials.email.trim().eq_ignore_ascii_case(&state.config.admin_email)
        && credentials.password == state.config.admin_password;
    if !ok {
        info!("rejected login for '{}'", credentials.email);
        return Err(AppError::Unauthorized);
    }

    let token = Uuid::new_v4().to_string();
    state.sessions.write().await.insert(token.clone());
    info!("admin session opened");
    Ok(Json(SessionToken { token }))
}

pub async fn logout(State(state): State<AppState>, request: Request) -> Result<(), AppError> {
    let token = bearer(&request).ok_or(AppError::Unauthorized)?;
    if state.sessions.write().await.remove(token) {
        info!("admin session closed");
    }
    Ok(())
}

/// Gate in front of every admin route except login.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let valid = match bearer(&request) {
        Some(token) => state.sessions.read().await.contains(token),
        None => false,
    };
    if !valid {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/admin/sections");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer(&request_with(Some("Bearer abc-123"))), Some("abc-123"));
        assert_eq!(bearer(&request_with(Some("Bearer   "))), None);
        assert_eq!(bearer(&request_with(Some("Basic abc"))), None);
        assert_eq!(bearer(&request_with(None)), None);
    }
}
