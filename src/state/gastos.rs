// state/gastos.rs
// Field expenses. Subject to the same day-closed gate as payments.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};
use crate::models::{Gasto, Rol};
use crate::money::{redondear, validar_monto_positivo};

use super::{AppState, ahora, exigir_dia_abierto};

pub async fn registrar_gasto(
    state: &AppState,
    usuario_id: &ObjectId,
    rol: Rol,
    concepto: &str,
    monto: Decimal,
) -> ApiResult<ObjectId> {
    exigir_dia_abierto(state, rol).await?;
    if concepto.trim().is_empty() {
        return Err(ApiError::Validacion("el concepto es obligatorio".into()));
    }
    validar_monto_positivo(monto, "Monto")?;

    let res = state
        .gastos
        .insert_one(Gasto {
            id: None,
            usuario_id: *usuario_id,
            concepto: concepto.trim().to_string(),
            monto: redondear(monto),
            fecha: ahora(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de gasto sin _id")))
}

pub async fn get_gasto_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Gasto>> {
    Ok(state.gastos.find_one(doc! { "_id": id }).await?)
}

pub async fn listar_gastos(state: &AppState) -> ApiResult<Vec<Gasto>> {
    let mut cursor = state.gastos.find(doc! {}).sort(doc! { "fecha": -1 }).await?;
    let mut gastos = Vec::new();
    while let Some(gasto) = cursor.try_next().await? {
        gastos.push(gasto);
    }
    Ok(gastos)
}

pub async fn eliminar_gasto(state: &AppState, id: &ObjectId) -> ApiResult<Gasto> {
    let Some(gasto) = get_gasto_por_id(state, id).await? else {
        return Err(ApiError::NoEncontrado("gasto no encontrado".into()));
    };
    state.gastos.delete_one(doc! { "_id": id }).await?;
    Ok(gasto)
}
