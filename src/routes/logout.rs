// routes/logout.rs
// POST /logout: drops the session and expires the cookie.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::session::{Actor, SESSION_COOKIE_NAME};
use crate::state::{AppState, cerrar_sesion};

pub async fn logout(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    cerrar_sesion(&state, actor.token()).await?;

    let mut response = (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response();
    if let Ok(header_value) = HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    )) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
    Ok(response)
}
