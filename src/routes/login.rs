// routes/login.rs
// POST /login { "email": "...", "clave": "...", "device_id": "..." }
// Validates credentials and the device-authorization gate, then issues a
// session cookie.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::EstadoDispositivo;
use crate::session::{DEVICE_COOKIE_NAME, SESSION_COOKIE_NAME, extract_cookies};
use crate::state::{AppState, SESSION_TTL_SECONDS, buscar_usuario, crear_sesion, registrar_dispositivo};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub clave: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let usuario = buscar_usuario(&state, &body.email)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("usuario no encontrado".into()))?;
    if !usuario.activo {
        return Err(ApiError::Prohibido("usuario desactivado".into()));
    }
    if usuario.clave != body.clave {
        return Err(ApiError::Prohibido("credenciales inválidas".into()));
    }

    // Device gate: administrators may log in from anywhere; everyone else
    // needs an approved device.
    let device_id = body
        .device_id
        .clone()
        .or_else(|| extract_cookies(&headers, DEVICE_COOKIE_NAME).into_iter().next());
    if !usuario.rol.is_admin() {
        let Some(device_id) = device_id.as_deref() else {
            return Err(ApiError::Prohibido("dispositivo no identificado".into()));
        };
        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("desconocido");
        match registrar_dispositivo(&state, device_id, user_agent, &usuario.email).await? {
            EstadoDispositivo::Aprobado => {}
            EstadoDispositivo::Pendiente => {
                return Err(ApiError::Prohibido(
                    "dispositivo pendiente de aprobación".into(),
                ));
            }
            EstadoDispositivo::Rechazado => {
                return Err(ApiError::Prohibido("dispositivo rechazado".into()));
            }
        }
    }

    let token = crear_sesion(&state, &usuario.email).await?;

    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "rol": usuario.rol.as_str() })),
    )
        .into_response();
    if let Ok(header_value) = HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE_NAME, token, SESSION_TTL_SECONDS
    )) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
    if let Some(device_id) = device_id {
        if let Ok(header_value) = HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=31536000",
            DEVICE_COOKIE_NAME, device_id
        )) {
            response.headers_mut().append(SET_COOKIE, header_value);
        }
    }
    Ok(response)
}
