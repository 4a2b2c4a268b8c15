// routes/auditoria.rs
// Read-only audit-log listing for administrators.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::Rol;
use crate::session::Actor;
use crate::state::{AppState, listar_auditoria};

pub async fn auditoria_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let registros = listar_auditoria(&state).await?;
    Ok(Json(json!({
        "registros": registros
            .iter()
            .map(|r| json!({
                "id": r.id.map(|id| id.to_hex()),
                "usuario_id": r.usuario_id.to_hex(),
                "tipo_entidad": r.tipo_entidad,
                "entidad_id": r.entidad_id,
                "detalles": r.detalles,
                "ip": r.ip,
                "user_agent": r.user_agent,
                "fecha": r.fecha.try_to_rfc3339_string().ok(),
            }))
            .collect::<Vec<_>>(),
    })))
}
