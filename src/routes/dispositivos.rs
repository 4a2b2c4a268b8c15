// routes/dispositivos.rs
// Device-authorization administration.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::{EstadoDispositivo, Rol};
use crate::session::Actor;
use crate::state::{AppState, cambiar_estado_dispositivo, listar_dispositivos};

use super::helpers::parse_object_id;

pub async fn dispositivos_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let dispositivos = listar_dispositivos(&state).await?;
    Ok(Json(json!({
        "dispositivos": dispositivos
            .iter()
            .map(|d| json!({
                "id": d.id.map(|id| id.to_hex()),
                "device_id": d.device_id,
                "descripcion": d.descripcion,
                "usuario_email": d.usuario_email,
                "estado": d.estado,
            }))
            .collect::<Vec<_>>(),
    })))
}

pub async fn dispositivos_aprobar(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Dispositivo")?;
    cambiar_estado_dispositivo(&state, &id, EstadoDispositivo::Aprobado).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn dispositivos_rechazar(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Dispositivo")?;
    cambiar_estado_dispositivo(&state, &id, EstadoDispositivo::Rechazado).await?;
    Ok(Json(json!({ "ok": true })))
}
