// routes/gastos.rs
// Expense handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::Gasto;
use crate::money::parse_monto;
use crate::session::Actor;
use crate::state::{
    AppState, eliminar_gasto, listar_gastos, registrar_eliminacion, registrar_gasto,
};

use super::helpers::{meta_solicitud, parse_object_id};

#[derive(Deserialize)]
pub struct GastoFormData {
    pub concepto: String,
    pub monto: String,
}

fn gasto_json(gasto: &Gasto) -> Value {
    json!({
        "id": gasto.id.map(|id| id.to_hex()),
        "usuario_id": gasto.usuario_id.to_hex(),
        "concepto": gasto.concepto,
        "monto": gasto.monto,
        "fecha": gasto.fecha.try_to_rfc3339_string().ok(),
    })
}

pub async fn gastos_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("gastos.ver")?;
    let gastos = listar_gastos(&state).await?;
    Ok(Json(json!({
        "gastos": gastos.iter().map(gasto_json).collect::<Vec<_>>(),
    })))
}

pub async fn gastos_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<GastoFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("gastos.crear")?;
    let monto = parse_monto(&form.monto, "Monto")?;
    let id = registrar_gasto(&state, actor.usuario_id(), actor.rol(), &form.concepto, monto).await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex() })))
}

pub async fn gastos_delete(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("gastos.crear")?;
    let id = parse_object_id(&id, "Gasto")?;
    let gasto = eliminar_gasto(&state, &id).await?;

    if !actor.is_admin() {
        let (ip, user_agent) = meta_solicitud(&headers);
        let snapshot = serde_json::to_value(&gasto).unwrap_or(Value::Null);
        registrar_eliminacion(
            &state,
            actor.usuario_id(),
            "Gasto",
            &id.to_hex(),
            snapshot,
            &ip,
            &user_agent,
        )
        .await?;
    }

    Ok(Json(json!({ "ok": true })))
}
