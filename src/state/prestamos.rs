// state/prestamos.rs
// Loan origination, balance derivation, and the renewal engine.

use bson::{doc, oid::ObjectId};
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::ClientSession;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoPrestamo, Pago, Prestamo, TipoPago};
use crate::schedule::{calcular_cronograma, saldo_pendiente, total_a_pagar};

use super::{AppState, ahora, fecha_como_str, hoy};

/// Terms for a new loan, either fresh or replacing a renewed one.
#[derive(Debug, Clone)]
pub struct TerminosPrestamo {
    pub monto: Decimal,
    pub interes: Decimal,
    pub cuotas: i32,
    pub tipo_pago: TipoPago,
    pub fecha_inicio: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct ResultadoRenovacion {
    pub prestamo_anterior: ObjectId,
    pub prestamo_nuevo: ObjectId,
    pub principal_efectivo: Decimal,
    pub descuento_aplicado: Decimal,
}

pub async fn crear_prestamo(
    state: &AppState,
    cliente_id: &ObjectId,
    terminos: &TerminosPrestamo,
    creado_por: &ObjectId,
) -> ApiResult<ObjectId> {
    let Some(cliente) = super::get_cliente_por_id(state, cliente_id).await? else {
        return Err(ApiError::NoEncontrado("cliente no encontrado".into()));
    };
    if !cliente.activo {
        return Err(ApiError::Validacion(
            "el cliente está inactivo; no puede recibir préstamos".into(),
        ));
    }

    let cronograma = calcular_cronograma(
        terminos.monto,
        terminos.interes,
        terminos.cuotas,
        terminos.tipo_pago,
        terminos.fecha_inicio,
    )?;

    let res = state
        .prestamos
        .insert_one(Prestamo {
            id: None,
            cliente_id: *cliente_id,
            monto: terminos.monto,
            interes: terminos.interes,
            tipo_pago: terminos.tipo_pago,
            cuotas: terminos.cuotas,
            valor_cuota: cronograma.valor_cuota,
            fecha_inicio: terminos.fecha_inicio,
            fecha_fin: cronograma.fecha_fin,
            estado: EstadoPrestamo::Activo,
            observaciones: None,
            creado_por: *creado_por,
            creado: ahora(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de préstamo sin _id")))
}

pub async fn get_prestamo_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Prestamo>> {
    Ok(state.prestamos.find_one(doc! { "_id": id }).await?)
}

pub async fn listar_prestamos(
    state: &AppState,
    cliente_id: Option<&ObjectId>,
) -> ApiResult<Vec<Prestamo>> {
    let filtro = match cliente_id {
        Some(id) => doc! { "cliente_id": id },
        None => doc! {},
    };
    let mut cursor = state
        .prestamos
        .find(filtro)
        .sort(doc! { "creado": -1 })
        .await?;
    let mut prestamos = Vec::new();
    while let Some(prestamo) = cursor.try_next().await? {
        prestamos.push(prestamo);
    }
    Ok(prestamos)
}

/// Outstanding balance of a loan, recomputed from its full payment history.
pub async fn saldo_de_prestamo(state: &AppState, prestamo: &Prestamo) -> ApiResult<Decimal> {
    let Some(id) = prestamo.id else {
        return Err(ApiError::Interno(anyhow::anyhow!("préstamo sin _id")));
    };
    let mut cursor = state.pagos.find(doc! { "prestamo_id": id }).await?;
    let mut montos = Vec::new();
    while let Some(pago) = cursor.try_next().await? {
        montos.push(pago.monto);
    }
    Ok(saldo_pendiente(
        total_a_pagar(prestamo.monto, prestamo.interes),
        &montos,
    ))
}

/// Same derivation but read through a client session so renewal and payment
/// insertion see a consistent ledger.
pub(super) async fn saldo_en_sesion(
    state: &AppState,
    sesion: &mut ClientSession,
    prestamo: &Prestamo,
) -> ApiResult<Decimal> {
    let Some(id) = prestamo.id else {
        return Err(ApiError::Interno(anyhow::anyhow!("préstamo sin _id")));
    };
    let mut cursor = state
        .pagos
        .find(doc! { "prestamo_id": id })
        .session(&mut *sesion)
        .await?;
    let mut montos = Vec::new();
    while let Some(pago) = cursor.next(sesion).await {
        montos.push(pago?.monto);
    }
    Ok(saldo_pendiente(
        total_a_pagar(prestamo.monto, prestamo.interes),
        &montos,
    ))
}

/// Marks a fully paid loan as CANCELADO. Rejected while balance remains.
pub async fn cancelar_prestamo(state: &AppState, id: &ObjectId) -> ApiResult<()> {
    let Some(prestamo) = get_prestamo_por_id(state, id).await? else {
        return Err(ApiError::NoEncontrado("préstamo no encontrado".into()));
    };
    if prestamo.estado != EstadoPrestamo::Activo {
        return Err(ApiError::Validacion("el préstamo no está activo".into()));
    }
    let saldo = saldo_de_prestamo(state, &prestamo).await?;
    if saldo > Decimal::ZERO {
        return Err(ApiError::Validacion(format!(
            "el préstamo aún tiene saldo pendiente de {saldo}"
        )));
    }
    state
        .prestamos
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "estado": "CANCELADO" } },
        )
        .await?;
    Ok(())
}

/// Closes an active loan into a new one, netting the outstanding balance
/// against the new principal and carrying it forward as a discount payment.
/// The whole sequence runs in one transaction where the deployment supports
/// them; a standalone server degrades to direct writes.
pub async fn renovar_prestamo(
    state: &AppState,
    prestamo_id: &ObjectId,
    terminos: &TerminosPrestamo,
    actor_id: &ObjectId,
) -> ApiResult<ResultadoRenovacion> {
    let mut sesion = state.client.start_session().await?;
    let en_transaccion = match sesion.start_transaction().await {
        Ok(()) => true,
        Err(err) => {
            log::warn!("sin soporte de transacciones, escrituras directas: {err}");
            false
        }
    };

    let resultado = renovar_en_sesion(state, &mut sesion, prestamo_id, terminos, actor_id).await;
    match resultado {
        Ok(ok) => {
            if en_transaccion {
                sesion.commit_transaction().await?;
            }
            Ok(ok)
        }
        Err(err) => {
            if en_transaccion {
                let _ = sesion.abort_transaction().await;
            }
            Err(err)
        }
    }
}

async fn renovar_en_sesion(
    state: &AppState,
    sesion: &mut ClientSession,
    prestamo_id: &ObjectId,
    terminos: &TerminosPrestamo,
    actor_id: &ObjectId,
) -> ApiResult<ResultadoRenovacion> {
    let anterior = state
        .prestamos
        .find_one(doc! { "_id": prestamo_id })
        .session(&mut *sesion)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("préstamo no encontrado".into()))?;
    if anterior.estado != EstadoPrestamo::Activo {
        return Err(ApiError::Validacion(
            "solo un préstamo activo puede renovarse".into(),
        ));
    }

    let saldo = saldo_en_sesion(state, sesion, &anterior).await?;
    let principal_efectivo = terminos.monto - saldo;
    if principal_efectivo <= Decimal::ZERO {
        return Err(ApiError::Validacion(
            "el monto de la renovación debe superar el saldo pendiente".into(),
        ));
    }

    // Validate the new schedule before any write lands.
    let cronograma = calcular_cronograma(
        terminos.monto,
        terminos.interes,
        terminos.cuotas,
        terminos.tipo_pago,
        terminos.fecha_inicio,
    )?;

    let nota = format!(
        "Renovado el {}; saldo de {} trasladado al préstamo nuevo",
        fecha_como_str(hoy()),
        saldo
    );
    let observaciones = match &anterior.observaciones {
        Some(previas) => format!("{previas}\n{nota}"),
        None => nota,
    };
    state
        .prestamos
        .update_one(
            doc! { "_id": prestamo_id },
            doc! { "$set": { "estado": "RENOVADO", "observaciones": observaciones } },
        )
        .session(&mut *sesion)
        .await?;

    let res = state
        .prestamos
        .insert_one(Prestamo {
            id: None,
            cliente_id: anterior.cliente_id,
            monto: terminos.monto,
            interes: terminos.interes,
            tipo_pago: terminos.tipo_pago,
            cuotas: terminos.cuotas,
            valor_cuota: cronograma.valor_cuota,
            fecha_inicio: terminos.fecha_inicio,
            fecha_fin: cronograma.fecha_fin,
            estado: EstadoPrestamo::Activo,
            observaciones: Some(format!(
                "Renovación del préstamo {}",
                prestamo_id.to_hex()
            )),
            creado_por: *actor_id,
            creado: ahora(),
        })
        .session(&mut *sesion)
        .await?;
    let nuevo_id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de préstamo sin _id")))?;

    if saldo > Decimal::ZERO {
        state
            .pagos
            .insert_one(Pago {
                id: None,
                prestamo_id: nuevo_id,
                monto: saldo,
                fecha: ahora(),
                observaciones: Some(format!(
                    "Descuento por renovación del préstamo {}",
                    prestamo_id.to_hex()
                )),
                modificado: false,
                registrado_por: *actor_id,
            })
            .session(&mut *sesion)
            .await?;
    }

    Ok(ResultadoRenovacion {
        prestamo_anterior: *prestamo_id,
        prestamo_nuevo: nuevo_id,
        principal_efectivo,
        descuento_aplicado: saldo,
    })
}
