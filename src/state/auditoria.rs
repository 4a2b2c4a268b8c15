// state/auditoria.rs
// Append-only deletion log. Callers invoke this only for non-administrator
// actors; the snapshot is whatever the handler serialized.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::ApiResult;
use crate::models::RegistroAuditoria;

use super::{AppState, ahora};

pub async fn registrar_eliminacion(
    state: &AppState,
    usuario_id: &ObjectId,
    tipo_entidad: &str,
    entidad_id: &str,
    detalles: serde_json::Value,
    ip: &str,
    user_agent: &str,
) -> ApiResult<()> {
    state
        .auditoria
        .insert_one(RegistroAuditoria {
            id: None,
            usuario_id: *usuario_id,
            tipo_entidad: tipo_entidad.to_string(),
            entidad_id: entidad_id.to_string(),
            detalles,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            fecha: ahora(),
        })
        .await?;
    Ok(())
}

pub async fn listar_auditoria(state: &AppState) -> ApiResult<Vec<RegistroAuditoria>> {
    let mut cursor = state
        .auditoria
        .find(doc! {})
        .sort(doc! { "fecha": -1 })
        .await?;
    let mut registros = Vec::new();
    while let Some(registro) = cursor.try_next().await? {
        registros.push(registro);
    }
    Ok(registros)
}
