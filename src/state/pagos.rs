// state/pagos.rs
// Payment ledger. Appends payments against a loan with the balance check
// re-read inside a transaction, and keeps the separate transfer-evidence
// ledger.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongodb::ClientSession;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoPrestamo, Pago, Rol, Transferencia};
use crate::money::{redondear, validar_monto_positivo};

use super::prestamos::saldo_en_sesion;
use super::{AppState, ahora, exigir_dia_abierto};

/// Records a payment and returns the new outstanding balance. The balance
/// is recomputed from the stored ledger inside the same session that
/// inserts the row, so two concurrent payments cannot both pass the check
/// against a stale read.
pub async fn registrar_pago(
    state: &AppState,
    prestamo_id: &ObjectId,
    monto: Decimal,
    observaciones: Option<String>,
    actor_id: &ObjectId,
    actor_rol: Rol,
) -> ApiResult<Decimal> {
    exigir_dia_abierto(state, actor_rol).await?;
    validar_monto_positivo(monto, "Monto")?;
    let monto = redondear(monto);

    let mut sesion = state.client.start_session().await?;
    let en_transaccion = match sesion.start_transaction().await {
        Ok(()) => true,
        Err(err) => {
            log::warn!("sin soporte de transacciones, escrituras directas: {err}");
            false
        }
    };

    let resultado =
        registrar_en_sesion(state, &mut sesion, prestamo_id, monto, observaciones, actor_id).await;
    match resultado {
        Ok(saldo) => {
            if en_transaccion {
                sesion.commit_transaction().await?;
            }
            Ok(saldo)
        }
        Err(err) => {
            if en_transaccion {
                let _ = sesion.abort_transaction().await;
            }
            Err(err)
        }
    }
}

async fn registrar_en_sesion(
    state: &AppState,
    sesion: &mut ClientSession,
    prestamo_id: &ObjectId,
    monto: Decimal,
    observaciones: Option<String>,
    actor_id: &ObjectId,
) -> ApiResult<Decimal> {
    let prestamo = state
        .prestamos
        .find_one(doc! { "_id": prestamo_id })
        .session(&mut *sesion)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("préstamo no encontrado".into()))?;
    if prestamo.estado != EstadoPrestamo::Activo {
        return Err(ApiError::Validacion("el préstamo no está activo".into()));
    }

    let saldo = saldo_en_sesion(state, sesion, &prestamo).await?;
    if saldo == Decimal::ZERO {
        return Err(ApiError::Validacion("el préstamo ya está pagado".into()));
    }
    if monto > saldo {
        return Err(ApiError::Validacion(format!(
            "el monto excede el saldo pendiente de {saldo}"
        )));
    }

    state
        .pagos
        .insert_one(Pago {
            id: None,
            prestamo_id: *prestamo_id,
            monto,
            fecha: ahora(),
            observaciones,
            modificado: false,
            registrado_por: *actor_id,
        })
        .session(&mut *sesion)
        .await?;

    Ok(saldo - monto)
}

pub async fn get_pago_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Pago>> {
    Ok(state.pagos.find_one(doc! { "_id": id }).await?)
}

pub async fn listar_pagos_de_prestamo(
    state: &AppState,
    prestamo_id: &ObjectId,
) -> ApiResult<Vec<Pago>> {
    let mut cursor = state
        .pagos
        .find(doc! { "prestamo_id": prestamo_id })
        .sort(doc! { "fecha": 1 })
        .await?;
    let mut pagos = Vec::new();
    while let Some(pago) = cursor.try_next().await? {
        pagos.push(pago);
    }
    Ok(pagos)
}

/// Flag consumed by downstream tooling; the payment row itself stays
/// immutable.
pub async fn marcar_pago_modificado(state: &AppState, id: &ObjectId) -> ApiResult<()> {
    let res = state
        .pagos
        .update_one(doc! { "_id": id }, doc! { "$set": { "modificado": true } })
        .await?;
    if res.matched_count == 0 {
        return Err(ApiError::NoEncontrado("pago no encontrado".into()));
    }
    Ok(())
}

pub async fn eliminar_pago(state: &AppState, id: &ObjectId) -> ApiResult<Pago> {
    let Some(pago) = get_pago_por_id(state, id).await? else {
        return Err(ApiError::NoEncontrado("pago no encontrado".into()));
    };
    state.pagos.delete_one(doc! { "_id": id }).await?;
    Ok(pago)
}

/// Transfer evidence lives in its own ledger and does not touch the loan
/// balance.
pub async fn registrar_transferencia(
    state: &AppState,
    prestamo_id: &ObjectId,
    monto: Decimal,
    banco: &str,
    referencia: &str,
    actor_id: &ObjectId,
) -> ApiResult<ObjectId> {
    if state
        .prestamos
        .find_one(doc! { "_id": prestamo_id })
        .await?
        .is_none()
    {
        return Err(ApiError::NoEncontrado("préstamo no encontrado".into()));
    }
    validar_monto_positivo(monto, "Monto")?;
    if banco.trim().is_empty() || referencia.trim().is_empty() {
        return Err(ApiError::Validacion(
            "banco y referencia son obligatorios".into(),
        ));
    }

    let res = state
        .transferencias
        .insert_one(Transferencia {
            id: None,
            prestamo_id: *prestamo_id,
            monto: redondear(monto),
            banco: banco.trim().to_string(),
            referencia: referencia.trim().to_string(),
            fecha: ahora(),
            registrado_por: *actor_id,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de transferencia sin _id")))
}

pub async fn listar_transferencias_de_prestamo(
    state: &AppState,
    prestamo_id: &ObjectId,
) -> ApiResult<Vec<Transferencia>> {
    let mut cursor = state
        .transferencias
        .find(doc! { "prestamo_id": prestamo_id })
        .sort(doc! { "fecha": 1 })
        .await?;
    let mut transferencias = Vec::new();
    while let Some(transferencia) = cursor.try_next().await? {
        transferencias.push(transferencia);
    }
    Ok(transferencias)
}
