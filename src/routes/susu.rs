// routes/susu.rs
// Rotating-savings group handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::{Susu, SusuParticipante};
use crate::money::parse_monto;
use crate::session::Actor;
use crate::state::{
    AppState, crear_susu, get_susu_por_id, listar_participantes, listar_pagos_susu, listar_susus,
    registrar_pago_susu,
};

use super::helpers::{clean_opt, parse_object_id};

#[derive(Deserialize)]
pub struct SusuParticipanteForm {
    pub nombre: String,
    #[serde(default)]
    pub cliente_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SusuFormData {
    pub nombre: String,
    pub monto_total: String,
    pub participantes: Vec<SusuParticipanteForm>,
}

#[derive(Deserialize)]
pub struct SusuPagoFormData {
    pub participante_id: String,
}

fn susu_json(susu: &Susu) -> Value {
    json!({
        "id": susu.id.map(|id| id.to_hex()),
        "nombre": susu.nombre,
        "monto_total": susu.monto_total,
        "monto_por_periodo": susu.monto_por_periodo,
        "periodo_actual": susu.periodo_actual,
        "estado": susu.estado,
    })
}

fn participante_json(participante: &SusuParticipante) -> Value {
    json!({
        "id": participante.id.map(|id| id.to_hex()),
        "nombre": participante.nombre,
        "orden": participante.orden,
        "ya_recibio": participante.ya_recibio,
        "activo": participante.activo,
    })
}

pub async fn susu_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("susu.ver")?;
    let susus = listar_susus(&state).await?;
    Ok(Json(json!({
        "susus": susus.iter().map(susu_json).collect::<Vec<_>>(),
    })))
}

pub async fn susu_show(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("susu.ver")?;
    let id = parse_object_id(&id, "Susu")?;
    let susu = get_susu_por_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("grupo susu no encontrado".into()))?;
    let participantes = listar_participantes(&state, &id).await?;
    let pagos = listar_pagos_susu(&state, &id).await?;

    let mut cuerpo = susu_json(&susu);
    if let Value::Object(ref mut mapa) = cuerpo {
        mapa.insert(
            "participantes".into(),
            json!(participantes.iter().map(participante_json).collect::<Vec<_>>()),
        );
        mapa.insert("pagos_registrados".into(), json!(pagos.len()));
    }
    Ok(Json(cuerpo))
}

pub async fn susu_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SusuFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("susu.gestionar")?;
    let monto_total = parse_monto(&form.monto_total, "Monto total")?;
    let mut participantes = Vec::with_capacity(form.participantes.len());
    for participante in &form.participantes {
        let cliente_id = match clean_opt(participante.cliente_id.clone()) {
            Some(valor) => Some(parse_object_id(&valor, "Cliente")?),
            None => None,
        };
        participantes.push((participante.nombre.trim().to_string(), cliente_id));
    }
    let id = crear_susu(&state, &form.nombre, monto_total, &participantes).await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex() })))
}

pub async fn susu_pago_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<SusuPagoFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("susu.gestionar")?;
    let susu_id = parse_object_id(&id, "Susu")?;
    let participante_id = parse_object_id(&form.participante_id, "Participante")?;
    let pago = registrar_pago_susu(&state, &susu_id, &participante_id).await?;
    Ok(Json(json!({
        "ok": true,
        "numero_periodo": pago.numero_periodo,
        "monto": pago.monto,
    })))
}
