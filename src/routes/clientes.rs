// routes/clientes.rs
// Borrower CRUD. Deletions by non-administrators leave an audit snapshot.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::Cliente;
use crate::session::Actor;
use crate::state::{
    AppState, actualizar_cliente, crear_cliente, eliminar_cliente, get_cliente_por_id,
    listar_clientes, registrar_eliminacion,
};

use super::helpers::{meta_solicitud, parse_object_id};

#[derive(Deserialize)]
pub struct ClienteFormData {
    pub documento: String,
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub telefono: String,
}

#[derive(Deserialize)]
pub struct ClienteUpdateData {
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default = "activo_por_defecto")]
    pub activo: bool,
}

fn activo_por_defecto() -> bool {
    true
}

fn cliente_json(cliente: &Cliente) -> Value {
    json!({
        "id": cliente.id.map(|id| id.to_hex()),
        "documento": cliente.documento,
        "nombre": cliente.nombre,
        "direccion": cliente.direccion,
        "telefono": cliente.telefono,
        "activo": cliente.activo,
    })
}

pub async fn clientes_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("clientes.ver")?;
    let clientes = listar_clientes(&state).await?;
    Ok(Json(json!({
        "clientes": clientes.iter().map(cliente_json).collect::<Vec<_>>(),
    })))
}

pub async fn clientes_show(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("clientes.ver")?;
    let id = parse_object_id(&id, "Cliente")?;
    let cliente = get_cliente_por_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("cliente no encontrado".into()))?;
    Ok(Json(cliente_json(&cliente)))
}

pub async fn clientes_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ClienteFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("clientes.crear")?;
    let id = crear_cliente(
        &state,
        form.documento.trim(),
        form.nombre.trim(),
        form.direccion.trim(),
        form.telefono.trim(),
        actor.usuario_id(),
    )
    .await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex() })))
}

pub async fn clientes_update(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<ClienteUpdateData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("clientes.editar")?;
    let id = parse_object_id(&id, "Cliente")?;
    actualizar_cliente(
        &state,
        &id,
        form.nombre.trim(),
        form.direccion.trim(),
        form.telefono.trim(),
        form.activo,
    )
    .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn clientes_delete(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("clientes.eliminar")?;
    let id = parse_object_id(&id, "Cliente")?;
    let (cliente, eliminado) = eliminar_cliente(&state, &id).await?;

    if !actor.is_admin() {
        let (ip, user_agent) = meta_solicitud(&headers);
        let snapshot = serde_json::to_value(&cliente).unwrap_or(Value::Null);
        registrar_eliminacion(
            &state,
            actor.usuario_id(),
            "Cliente",
            &id.to_hex(),
            snapshot,
            &ip,
            &user_agent,
        )
        .await?;
    }

    Ok(Json(json!({ "ok": true, "eliminado": eliminado })))
}
