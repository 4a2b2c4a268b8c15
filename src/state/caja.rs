// state/caja.rs
// Petty-cash ("caja chica") movement chain per collector. The running
// balance is always derived by replaying the chain ordered by fecha.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};
use crate::models::{MovimientoCaja, TipoMovimientoCaja};
use crate::money::{MONTO_MAXIMO, redondear, validar_monto_positivo};

use super::{AppState, ahora};

fn aplicar(tipo: TipoMovimientoCaja, saldo: Decimal, monto: Decimal) -> Decimal {
    match tipo {
        TipoMovimientoCaja::Entregado | TipoMovimientoCaja::Entrega => saldo + monto,
        TipoMovimientoCaja::Gastado | TipoMovimientoCaja::Devuelto => saldo - monto,
        // AJUSTE carries a signed amount
        TipoMovimientoCaja::Ajuste => saldo + monto,
    }
}

pub async fn listar_movimientos_caja(
    state: &AppState,
    cobrador_id: &ObjectId,
) -> ApiResult<Vec<MovimientoCaja>> {
    let mut cursor = state
        .movimientos_caja
        .find(doc! { "cobrador_id": cobrador_id })
        .sort(doc! { "fecha": 1 })
        .await?;
    let mut movimientos = Vec::new();
    while let Some(movimiento) = cursor.try_next().await? {
        movimientos.push(movimiento);
    }
    Ok(movimientos)
}

/// Replays the movement chain to derive the collector's current balance.
pub async fn saldo_caja(state: &AppState, cobrador_id: &ObjectId) -> ApiResult<Decimal> {
    let movimientos = listar_movimientos_caja(state, cobrador_id).await?;
    Ok(movimientos
        .iter()
        .fold(Decimal::ZERO, |saldo, m| aplicar(m.tipo, saldo, m.monto)))
}

pub async fn registrar_movimiento_caja(
    state: &AppState,
    cobrador_id: &ObjectId,
    asignado_por: Option<ObjectId>,
    tipo: TipoMovimientoCaja,
    monto: Decimal,
    descripcion: Option<String>,
) -> ApiResult<MovimientoCaja> {
    let monto = redondear(monto);
    match tipo {
        TipoMovimientoCaja::Ajuste => {
            if monto == Decimal::ZERO || monto.abs() > MONTO_MAXIMO {
                return Err(ApiError::Validacion(
                    "el ajuste debe ser distinto de cero y dentro del rango permitido".into(),
                ));
            }
        }
        _ => validar_monto_positivo(monto, "Monto")?,
    }

    if state
        .usuarios
        .find_one(doc! { "_id": cobrador_id })
        .await?
        .is_none()
    {
        return Err(ApiError::NoEncontrado("cobrador no encontrado".into()));
    }

    let saldo_anterior = saldo_caja(state, cobrador_id).await?;
    let saldo_nuevo = redondear(aplicar(tipo, saldo_anterior, monto));
    if saldo_nuevo < Decimal::ZERO {
        return Err(ApiError::Validacion(format!(
            "saldo de caja insuficiente; disponible {saldo_anterior}"
        )));
    }

    let movimiento = MovimientoCaja {
        id: None,
        cobrador_id: *cobrador_id,
        asignado_por,
        tipo,
        monto,
        saldo_anterior,
        saldo_nuevo,
        descripcion,
        fecha: ahora(),
    };
    state.movimientos_caja.insert_one(movimiento.clone()).await?;
    Ok(movimiento)
}
