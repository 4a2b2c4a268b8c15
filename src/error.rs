// error.rs
// Typed error taxonomy for the domain layer plus the HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Domain errors. Handlers return these directly; the `IntoResponse` impl
/// turns each variant into its status code and a JSON `{ "error": ... }` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validacion(String),

    /// Missing loan/client/user/etc.
    #[error("{0}")]
    NoEncontrado(String),

    /// Role, permission, day-closed or time-limit rejection.
    #[error("{0}")]
    Prohibido(String),

    /// Duplicate unique key (documento, fecha de cierre, ...).
    #[error("{0}")]
    Conflicto(String),

    /// Unexpected failure; the cause is logged, the caller gets a generic message.
    #[error(transparent)]
    Interno(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validacion(_) => StatusCode::BAD_REQUEST,
            ApiError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            ApiError::Prohibido(_) => StatusCode::FORBIDDEN,
            ApiError::Conflicto(_) => StatusCode::CONFLICT,
            ApiError::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Interno(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mensaje = match &self {
            ApiError::Interno(causa) => {
                log::error!("error interno: {causa:?}");
                "error interno del servidor".to_string()
            }
            otro => otro.to_string(),
        };
        (status, Json(serde_json::json!({ "error": mensaje }))).into_response()
    }
}
