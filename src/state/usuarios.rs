// state/usuarios.rs
// Staff users, sessions, and the daily-usage accumulator.

use bson::{DateTime, doc, oid::ObjectId};
use data_encoding::BASE32_NOPAD;
use futures::stream::TryStreamExt;
use rand::RngCore;
use std::time::{Duration, SystemTime};

use crate::error::{ApiError, ApiResult};
use crate::models::{Rol, Sesion, Usuario};

use super::{AppState, SESSION_TTL_SECONDS, ahora, fecha_como_str, hoy};

/// Gaps longer than this between requests do not count as active time.
const BRECHA_MAXIMA_SEGUNDOS: i64 = 300;

/// Session-facing view of a user, resolved once per request.
#[derive(Debug, Clone)]
pub struct UsuarioActual {
    pub id: ObjectId,
    pub email: String,
    pub nombre: String,
    pub rol: Rol,
    pub supervisor_id: Option<ObjectId>,
    pub permisos: Vec<String>,
    pub limite_minutos: Option<i64>,
}

fn vista_actual(usuario: Usuario) -> ApiResult<UsuarioActual> {
    let id = usuario
        .id
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("usuario sin _id")))?;
    Ok(UsuarioActual {
        id,
        email: usuario.email,
        nombre: usuario.nombre,
        rol: usuario.rol,
        supervisor_id: usuario.supervisor_id,
        permisos: usuario.permisos,
        limite_minutos: usuario.limite_minutos,
    })
}

pub async fn buscar_usuario(state: &AppState, email: &str) -> ApiResult<Option<Usuario>> {
    Ok(state.usuarios.find_one(doc! { "email": email }).await?)
}

pub async fn get_usuario_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Usuario>> {
    Ok(state.usuarios.find_one(doc! { "_id": id }).await?)
}

pub async fn listar_usuarios(state: &AppState) -> ApiResult<Vec<Usuario>> {
    let mut cursor = state.usuarios.find(doc! {}).await?;
    let mut usuarios = Vec::new();
    while let Some(usuario) = cursor.try_next().await? {
        usuarios.push(usuario);
    }
    Ok(usuarios)
}

pub async fn crear_usuario(
    state: &AppState,
    email: &str,
    clave: &str,
    nombre: &str,
    rol: Rol,
    supervisor_id: Option<ObjectId>,
    limite_minutos: Option<i64>,
) -> ApiResult<ObjectId> {
    if state
        .usuarios
        .find_one(doc! { "email": email })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflicto(format!(
            "ya existe un usuario con email {email}"
        )));
    }

    let res = state
        .usuarios
        .insert_one(Usuario {
            id: None,
            email: email.to_string(),
            clave: clave.to_string(),
            nombre: nombre.to_string(),
            rol,
            supervisor_id,
            permisos: Vec::new(),
            limite_minutos,
            activo: true,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de usuario sin _id")))
}

pub async fn actualizar_usuario(
    state: &AppState,
    id: &ObjectId,
    nombre: &str,
    rol: Rol,
    supervisor_id: Option<ObjectId>,
    limite_minutos: Option<i64>,
    activo: bool,
) -> ApiResult<()> {
    let res = state
        .usuarios
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "nombre": nombre,
                "rol": rol.as_str(),
                "supervisor_id": supervisor_id,
                "limite_minutos": limite_minutos,
                "activo": activo,
            } },
        )
        .await?;
    if res.matched_count == 0 {
        return Err(ApiError::NoEncontrado("usuario no encontrado".into()));
    }
    Ok(())
}

/// Replaces the stored grant set.
pub async fn asignar_permisos(
    state: &AppState,
    id: &ObjectId,
    permisos: &[String],
) -> ApiResult<()> {
    let res = state
        .usuarios
        .update_one(doc! { "_id": id }, doc! { "$set": { "permisos": permisos } })
        .await?;
    if res.matched_count == 0 {
        return Err(ApiError::NoEncontrado("usuario no encontrado".into()));
    }
    Ok(())
}

pub async fn eliminar_usuario(state: &AppState, id: &ObjectId) -> ApiResult<Usuario> {
    let Some(usuario) = get_usuario_por_id(state, id).await? else {
        return Err(ApiError::NoEncontrado("usuario no encontrado".into()));
    };
    state.usuarios.delete_one(doc! { "_id": id }).await?;
    let _ = state
        .sesiones
        .delete_many(doc! { "usuario_email": &usuario.email })
        .await;
    Ok(usuario)
}

pub async fn crear_sesion(state: &AppState, email: &str) -> ApiResult<String> {
    let _ = state
        .sesiones
        .delete_many(doc! { "usuario_email": email })
        .await;

    let mut token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut token_bytes);
    let token = BASE32_NOPAD.encode(&token_bytes);

    let expira_en =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sesiones
        .insert_one(Sesion {
            id: None,
            token: token.clone(),
            usuario_email: email.to_string(),
            expira_en,
            ultima_actividad: ahora(),
        })
        .await?;

    Ok(token)
}

pub async fn cerrar_sesion(state: &AppState, token: &str) -> ApiResult<()> {
    let _ = state.sesiones.delete_one(doc! { "token": token }).await;
    Ok(())
}

pub async fn buscar_usuario_por_sesion(
    state: &AppState,
    token: &str,
) -> ApiResult<Option<UsuarioActual>> {
    let Some(sesion) = state.sesiones.find_one(doc! { "token": token }).await? else {
        return Ok(None);
    };
    if sesion.expira_en.to_system_time() <= SystemTime::now() {
        // Remove expired session, ignore result
        let _ = state.sesiones.delete_one(doc! { "token": token }).await;
        return Ok(None);
    }
    match buscar_usuario(state, &sesion.usuario_email).await? {
        Some(usuario) if usuario.activo => vista_actual(usuario).map(Some),
        _ => Ok(None),
    }
}

/// Accumulates active seconds for the day and reports whether the user's
/// daily cap ran out. Only collector accounts carry a cap.
pub async fn registrar_actividad(
    state: &AppState,
    usuario: &UsuarioActual,
    token: &str,
) -> ApiResult<bool> {
    let ahora_ts = ahora();
    if let Some(sesion) = state.sesiones.find_one(doc! { "token": token }).await? {
        let transcurrido = (ahora_ts.timestamp_millis()
            - sesion.ultima_actividad.timestamp_millis())
            / 1000;
        if transcurrido > 0 && transcurrido <= BRECHA_MAXIMA_SEGUNDOS {
            state
                .uso_diario
                .update_one(
                    doc! { "usuario_id": usuario.id, "fecha": fecha_como_str(hoy()) },
                    doc! { "$inc": { "segundos": transcurrido } },
                )
                .upsert(true)
                .await?;
        }
        state
            .sesiones
            .update_one(
                doc! { "token": token },
                doc! { "$set": { "ultima_actividad": ahora_ts } },
            )
            .await?;
    }

    let (Rol::Cobrador, Some(limite)) = (usuario.rol, usuario.limite_minutos) else {
        return Ok(false);
    };
    let uso = state
        .uso_diario
        .find_one(doc! { "usuario_id": usuario.id, "fecha": fecha_como_str(hoy()) })
        .await?;
    Ok(uso.map(|u| u.segundos / 60 >= limite).unwrap_or(false))
}
