// routes/usuarios.rs
// Staff administration: only administrators manage users and grants.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::permisos_por_defecto;
use crate::error::ApiError;
use crate::models::{Rol, Usuario};
use crate::session::Actor;
use crate::state::{
    AppState, actualizar_usuario, asignar_permisos, crear_usuario, eliminar_usuario,
    get_usuario_por_id, listar_usuarios,
};

use super::helpers::{clean_opt, parse_object_id};

#[derive(Deserialize)]
pub struct UsuarioFormData {
    pub email: String,
    pub clave: String,
    pub nombre: String,
    pub rol: String,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub limite_minutos: Option<i64>,
}

#[derive(Deserialize)]
pub struct UsuarioUpdateData {
    pub nombre: String,
    pub rol: String,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub limite_minutos: Option<i64>,
    #[serde(default = "activo_por_defecto")]
    pub activo: bool,
}

#[derive(Deserialize)]
pub struct PermisosFormData {
    pub permisos: Vec<String>,
}

fn activo_por_defecto() -> bool {
    true
}

fn parse_rol(valor: &str) -> Result<Rol, ApiError> {
    match valor.trim().to_uppercase().as_str() {
        "COBRADOR" => Ok(Rol::Cobrador),
        "SUPERVISOR" => Ok(Rol::Supervisor),
        "ADMINISTRADOR" => Ok(Rol::Administrador),
        otro => Err(ApiError::Validacion(format!("rol desconocido: {otro}"))),
    }
}

fn usuario_json(usuario: &Usuario) -> Value {
    json!({
        "id": usuario.id.map(|id| id.to_hex()),
        "email": usuario.email,
        "nombre": usuario.nombre,
        "rol": usuario.rol,
        "supervisor_id": usuario.supervisor_id.map(|id| id.to_hex()),
        "permisos": usuario.permisos,
        "limite_minutos": usuario.limite_minutos,
        "activo": usuario.activo,
    })
}

pub async fn usuarios_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let usuarios = listar_usuarios(&state).await?;
    Ok(Json(json!({
        "usuarios": usuarios.iter().map(usuario_json).collect::<Vec<_>>(),
    })))
}

pub async fn usuarios_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<UsuarioFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let rol = parse_rol(&form.rol)?;
    let supervisor_id = match clean_opt(form.supervisor_id) {
        Some(valor) => Some(parse_object_id(&valor, "Supervisor")?),
        None => None,
    };
    let id = crear_usuario(
        &state,
        form.email.trim(),
        &form.clave,
        form.nombre.trim(),
        rol,
        supervisor_id,
        form.limite_minutos,
    )
    .await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex() })))
}

pub async fn usuarios_update(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<UsuarioUpdateData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Usuario")?;
    let rol = parse_rol(&form.rol)?;
    let supervisor_id = match clean_opt(form.supervisor_id) {
        Some(valor) => Some(parse_object_id(&valor, "Supervisor")?),
        None => None,
    };
    actualizar_usuario(
        &state,
        &id,
        form.nombre.trim(),
        rol,
        supervisor_id,
        form.limite_minutos,
        form.activo,
    )
    .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn usuarios_delete(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Usuario")?;
    if &id == actor.usuario_id() {
        return Err(ApiError::Validacion(
            "un usuario no puede eliminarse a sí mismo".into(),
        ));
    }
    eliminar_usuario(&state, &id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Replaces the grant set with an explicit list.
pub async fn usuarios_permisos(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<PermisosFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Usuario")?;
    asignar_permisos(&state, &id, &form.permisos).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Applies the recommended grant list for the user's role.
pub async fn usuarios_permisos_defaults(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_rol(Rol::Administrador)?;
    let id = parse_object_id(&id, "Usuario")?;
    let usuario = get_usuario_por_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("usuario no encontrado".into()))?;
    let permisos: Vec<String> = permisos_por_defecto(usuario.rol)
        .iter()
        .map(|p| p.to_string())
        .collect();
    asignar_permisos(&state, &id, &permisos).await?;
    Ok(Json(json!({ "ok": true, "permisos": permisos })))
}
