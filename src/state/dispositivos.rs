// state/dispositivos.rs
// Device-authorization gate: unknown devices queue as PENDIENTE until an
// administrator approves them.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{ApiError, ApiResult};
use crate::models::{Dispositivo, EstadoDispositivo};

use super::{AppState, ahora};

/// Looks up a device by its cookie id, registering it as pending on first
/// sight. Returns the current state of the device.
pub async fn registrar_dispositivo(
    state: &AppState,
    device_id: &str,
    descripcion: &str,
    usuario_email: &str,
) -> ApiResult<EstadoDispositivo> {
    if let Some(existente) = state
        .dispositivos
        .find_one(doc! { "device_id": device_id })
        .await?
    {
        return Ok(existente.estado);
    }

    state
        .dispositivos
        .insert_one(Dispositivo {
            id: None,
            device_id: device_id.to_string(),
            descripcion: descripcion.to_string(),
            usuario_email: Some(usuario_email.to_string()),
            estado: EstadoDispositivo::Pendiente,
            creado: ahora(),
        })
        .await?;
    Ok(EstadoDispositivo::Pendiente)
}

pub async fn listar_dispositivos(state: &AppState) -> ApiResult<Vec<Dispositivo>> {
    let mut cursor = state
        .dispositivos
        .find(doc! {})
        .sort(doc! { "creado": -1 })
        .await?;
    let mut dispositivos = Vec::new();
    while let Some(dispositivo) = cursor.try_next().await? {
        dispositivos.push(dispositivo);
    }
    Ok(dispositivos)
}

pub async fn cambiar_estado_dispositivo(
    state: &AppState,
    id: &ObjectId,
    estado: EstadoDispositivo,
) -> ApiResult<()> {
    let estado_str = match estado {
        EstadoDispositivo::Pendiente => "PENDIENTE",
        EstadoDispositivo::Aprobado => "APROBADO",
        EstadoDispositivo::Rechazado => "RECHAZADO",
    };
    let res = state
        .dispositivos
        .update_one(doc! { "_id": id }, doc! { "$set": { "estado": estado_str } })
        .await?;
    if res.matched_count == 0 {
        return Err(ApiError::NoEncontrado("dispositivo no encontrado".into()));
    }
    Ok(())
}
