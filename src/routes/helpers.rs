// routes/helpers.rs
// Small parsing and request-metadata helpers shared by the handlers.

use std::str::FromStr;

use axum::http::HeaderMap;
use bson::oid::ObjectId;
use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::{TipoMovimientoCaja, TipoPago};

pub(super) fn parse_object_id(value: &str, label: &str) -> Result<ObjectId, ApiError> {
    ObjectId::from_str(value).map_err(|_| ApiError::Validacion(format!("{label} inválido")))
}

pub(super) fn parse_fecha(value: &str, label: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::Validacion(format!("{label} debe tener formato AAAA-MM-DD")))
}

pub(super) fn parse_tipo_pago(value: &str) -> Result<TipoPago, ApiError> {
    TipoPago::parse(value)
        .ok_or_else(|| ApiError::Validacion(format!("tipo de pago desconocido: {value}")))
}

pub(super) fn parse_tipo_movimiento(value: &str) -> Result<TipoMovimientoCaja, ApiError> {
    TipoMovimientoCaja::parse(value)
        .ok_or_else(|| ApiError::Validacion(format!("tipo de movimiento desconocido: {value}")))
}

pub(super) fn clean_opt(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Originating IP and user agent for the audit log.
pub(super) fn meta_solicitud(headers: &HeaderMap) -> (String, String) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "desconocida".to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "desconocido".to_string());
    (ip, user_agent)
}
