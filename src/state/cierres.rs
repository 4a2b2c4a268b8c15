// state/cierres.rs
// End-of-day closures. A closure for a date freezes payment/expense entry
// for collector-role users on that date.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{ApiError, ApiResult};
use crate::models::{CierreDia, Rol};

use super::{AppState, ahora, fecha_como_str, hoy};

pub async fn dia_cerrado(state: &AppState, fecha: &str) -> ApiResult<bool> {
    Ok(state
        .cierres
        .find_one(doc! { "fecha": fecha })
        .await?
        .is_some())
}

/// The gate consulted by payment and expense creation. Only collectors are
/// blocked by a closed day.
pub async fn exigir_dia_abierto(state: &AppState, rol: Rol) -> ApiResult<()> {
    if rol != Rol::Cobrador {
        return Ok(());
    }
    if dia_cerrado(state, &fecha_como_str(hoy())).await? {
        return Err(ApiError::Prohibido(
            "el día ya fue cerrado; no se pueden registrar operaciones".into(),
        ));
    }
    Ok(())
}

pub async fn cerrar_dia(state: &AppState, fecha: &str, cerrado_por: &ObjectId) -> ApiResult<ObjectId> {
    if dia_cerrado(state, fecha).await? {
        return Err(ApiError::Conflicto(format!(
            "el día {fecha} ya está cerrado"
        )));
    }
    let res = state
        .cierres
        .insert_one(CierreDia {
            id: None,
            fecha: fecha.to_string(),
            cerrado_por: *cerrado_por,
            creado: ahora(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de cierre sin _id")))
}

pub async fn listar_cierres(state: &AppState) -> ApiResult<Vec<CierreDia>> {
    let mut cursor = state.cierres.find(doc! {}).sort(doc! { "fecha": -1 }).await?;
    let mut cierres = Vec::new();
    while let Some(cierre) = cursor.try_next().await? {
        cierres.push(cierre);
    }
    Ok(cierres)
}
