use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::form::FormError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    /// The top-level section list could not be read. Fatal for a menu load.
    #[error("menu is unavailable")]
    MenuUnavailable(#[source] StoreError),

    #[error("section '{0}' already exists")]
    DuplicateSection(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{op} failed: {source}")]
    Mutation {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Wrap a store failure for the named mutation; a missing target document
    /// surfaces as not-found instead.
    pub fn mutation(op: &'static str, kind: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| match source {
            StoreError::NotFound(_) => AppError::NotFound(kind),
            source => AppError::Mutation { op, source },
        }
    }
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MenuUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DuplicateSection { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Mutation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::MenuUnavailable(source) => {
                error!("menu load failed: {source}");
                // full-page fallback text for the public site
                json!({
                    "error": self.to_string(),
                    "message": {
                        "es": "No se pudo cargar la carta. Inténtalo de nuevo más tarde.",
                        "en": "Could not load the menu. Please try again later.",
                    },
                })
            }
            AppError::Mutation { op, source } => {
                error!("{op} failed: {source}");
                json!({ "error": self.to_string(), "operation": op })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
