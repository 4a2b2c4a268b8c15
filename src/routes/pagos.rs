// routes/pagos.rs
// Payment and transfer-evidence handlers under /prestamos/{id}.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::{Pago, Transferencia};
use crate::money::parse_monto;
use crate::session::Actor;
use crate::state::{
    AppState, eliminar_pago, listar_pagos_de_prestamo, listar_transferencias_de_prestamo,
    marcar_pago_modificado, registrar_eliminacion, registrar_pago, registrar_transferencia,
};

use super::helpers::{clean_opt, meta_solicitud, parse_object_id};

#[derive(Deserialize)]
pub struct PagoFormData {
    pub monto: String,
    #[serde(default)]
    pub observaciones: Option<String>,
}

#[derive(Deserialize)]
pub struct TransferenciaFormData {
    pub monto: String,
    pub banco: String,
    pub referencia: String,
}

fn pago_json(pago: &Pago) -> Value {
    json!({
        "id": pago.id.map(|id| id.to_hex()),
        "prestamo_id": pago.prestamo_id.to_hex(),
        "monto": pago.monto,
        "fecha": pago.fecha.try_to_rfc3339_string().ok(),
        "observaciones": pago.observaciones,
        "modificado": pago.modificado,
    })
}

fn transferencia_json(transferencia: &Transferencia) -> Value {
    json!({
        "id": transferencia.id.map(|id| id.to_hex()),
        "prestamo_id": transferencia.prestamo_id.to_hex(),
        "monto": transferencia.monto,
        "banco": transferencia.banco,
        "referencia": transferencia.referencia,
        "fecha": transferencia.fecha.try_to_rfc3339_string().ok(),
    })
}

pub async fn pagos_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.ver")?;
    let prestamo_id = parse_object_id(&id, "Préstamo")?;
    let pagos = listar_pagos_de_prestamo(&state, &prestamo_id).await?;
    Ok(Json(json!({
        "pagos": pagos.iter().map(pago_json).collect::<Vec<_>>(),
    })))
}

pub async fn pagos_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<PagoFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.crear")?;
    let prestamo_id = parse_object_id(&id, "Préstamo")?;
    let monto = parse_monto(&form.monto, "Monto")?;
    let nuevo_saldo = registrar_pago(
        &state,
        &prestamo_id,
        monto,
        clean_opt(form.observaciones),
        actor.usuario_id(),
        actor.rol(),
    )
    .await?;
    Ok(Json(json!({ "ok": true, "nuevo_saldo": nuevo_saldo })))
}

pub async fn pagos_marcar_modificado(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.crear")?;
    let id = parse_object_id(&id, "Pago")?;
    marcar_pago_modificado(&state, &id).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn pagos_delete(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.crear")?;
    let id = parse_object_id(&id, "Pago")?;
    let pago = eliminar_pago(&state, &id).await?;

    if !actor.is_admin() {
        let (ip, user_agent) = meta_solicitud(&headers);
        let snapshot = serde_json::to_value(&pago).unwrap_or(Value::Null);
        registrar_eliminacion(
            &state,
            actor.usuario_id(),
            "Pago",
            &id.to_hex(),
            snapshot,
            &ip,
            &user_agent,
        )
        .await?;
    }

    Ok(Json(json!({ "ok": true })))
}

pub async fn transferencias_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.ver")?;
    let prestamo_id = parse_object_id(&id, "Préstamo")?;
    let transferencias = listar_transferencias_de_prestamo(&state, &prestamo_id).await?;
    Ok(Json(json!({
        "transferencias": transferencias.iter().map(transferencia_json).collect::<Vec<_>>(),
    })))
}

pub async fn transferencias_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<TransferenciaFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("pagos.crear")?;
    let prestamo_id = parse_object_id(&id, "Préstamo")?;
    let monto = parse_monto(&form.monto, "Monto")?;
    let transferencia_id = registrar_transferencia(
        &state,
        &prestamo_id,
        monto,
        &form.banco,
        &form.referencia,
        actor.usuario_id(),
    )
    .await?;
    Ok(Json(json!({ "ok": true, "id": transferencia_id.to_hex() })))
}
