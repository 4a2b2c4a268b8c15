// routes/cierres.rs
// End-of-day closure handlers. Closing a day takes SUPERVISOR or above.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::Rol;
use crate::session::Actor;
use crate::state::{AppState, cerrar_dia, fecha_como_str, hoy, listar_cierres};

use super::helpers::{clean_opt, parse_fecha};

#[derive(Deserialize)]
pub struct CierreFormData {
    #[serde(default)]
    pub fecha: Option<String>,
}

pub async fn cierres_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("cierres.gestionar")?;
    let cierres = listar_cierres(&state).await?;
    Ok(Json(json!({
        "cierres": cierres
            .iter()
            .map(|c| json!({
                "id": c.id.map(|id| id.to_hex()),
                "fecha": c.fecha,
                "cerrado_por": c.cerrado_por.to_hex(),
            }))
            .collect::<Vec<_>>(),
    })))
}

pub async fn cierres_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<CierreFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Supervisor)?;
    actor.capacidades().exigir_permiso("cierres.gestionar")?;
    let fecha = match clean_opt(form.fecha) {
        Some(valor) => fecha_como_str(parse_fecha(&valor, "Fecha")?),
        None => fecha_como_str(hoy()),
    };
    let id = cerrar_dia(&state, &fecha, actor.usuario_id()).await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex(), "fecha": fecha })))
}
