// state/susu.rs
// Rotating savings groups: ordered participants take turns receiving the
// pooled contribution, one per period.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};
use crate::models::{EstadoSusu, Susu, SusuPago, SusuParticipante};
use crate::money::{redondear, validar_monto_positivo};

use super::{AppState, ahora};

pub async fn crear_susu(
    state: &AppState,
    nombre: &str,
    monto_total: Decimal,
    participantes: &[(String, Option<ObjectId>)],
) -> ApiResult<ObjectId> {
    validar_monto_positivo(monto_total, "Monto total")?;
    if participantes.is_empty() {
        return Err(ApiError::Validacion(
            "el grupo necesita al menos un participante".into(),
        ));
    }

    let n = Decimal::from(participantes.len() as u32);
    let monto_por_periodo = redondear(monto_total / n);

    let res = state
        .susus
        .insert_one(Susu {
            id: None,
            nombre: nombre.trim().to_string(),
            monto_total: redondear(monto_total),
            monto_por_periodo,
            periodo_actual: 1,
            estado: EstadoSusu::Activo,
            creado: ahora(),
        })
        .await?;
    let susu_id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de susu sin _id")))?;

    for (orden, (nombre, cliente_id)) in participantes.iter().enumerate() {
        state
            .susu_participantes
            .insert_one(SusuParticipante {
                id: None,
                susu_id,
                cliente_id: *cliente_id,
                nombre: nombre.clone(),
                orden: orden as i32 + 1,
                ya_recibio: false,
                activo: true,
            })
            .await?;
    }

    Ok(susu_id)
}

pub async fn get_susu_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Susu>> {
    Ok(state.susus.find_one(doc! { "_id": id }).await?)
}

pub async fn listar_susus(state: &AppState) -> ApiResult<Vec<Susu>> {
    let mut cursor = state.susus.find(doc! {}).sort(doc! { "creado": -1 }).await?;
    let mut susus = Vec::new();
    while let Some(susu) = cursor.try_next().await? {
        susus.push(susu);
    }
    Ok(susus)
}

pub async fn listar_participantes(
    state: &AppState,
    susu_id: &ObjectId,
) -> ApiResult<Vec<SusuParticipante>> {
    let mut cursor = state
        .susu_participantes
        .find(doc! { "susu_id": susu_id })
        .sort(doc! { "orden": 1 })
        .await?;
    let mut participantes = Vec::new();
    while let Some(participante) = cursor.try_next().await? {
        participantes.push(participante);
    }
    Ok(participantes)
}

pub async fn listar_pagos_susu(state: &AppState, susu_id: &ObjectId) -> ApiResult<Vec<SusuPago>> {
    let mut cursor = state
        .susu_pagos
        .find(doc! { "susu_id": susu_id })
        .sort(doc! { "fecha": 1 })
        .await?;
    let mut pagos = Vec::new();
    while let Some(pago) = cursor.try_next().await? {
        pagos.push(pago);
    }
    Ok(pagos)
}

/// Records one participant's contribution for the current period. When the
/// period fills, the participant whose `orden` matches the period number is
/// marked as paid out; after the last period the group completes.
pub async fn registrar_pago_susu(
    state: &AppState,
    susu_id: &ObjectId,
    participante_id: &ObjectId,
) -> ApiResult<SusuPago> {
    let Some(susu) = get_susu_por_id(state, susu_id).await? else {
        return Err(ApiError::NoEncontrado("grupo susu no encontrado".into()));
    };
    if susu.estado != EstadoSusu::Activo {
        return Err(ApiError::Validacion("el grupo ya está completado".into()));
    }

    let participante = state
        .susu_participantes
        .find_one(doc! { "_id": participante_id, "susu_id": susu_id })
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("participante no encontrado".into()))?;
    if !participante.activo {
        return Err(ApiError::Validacion("el participante está inactivo".into()));
    }

    let periodo = susu.periodo_actual;
    let duplicado = state
        .susu_pagos
        .find_one(doc! {
            "susu_id": susu_id,
            "participante_id": participante_id,
            "numero_periodo": periodo,
        })
        .await?
        .is_some();
    if duplicado {
        return Err(ApiError::Conflicto(format!(
            "el participante ya pagó el período {periodo}"
        )));
    }

    let pago = SusuPago {
        id: None,
        susu_id: *susu_id,
        participante_id: *participante_id,
        numero_periodo: periodo,
        monto: susu.monto_por_periodo,
        fecha: ahora(),
    };
    state.susu_pagos.insert_one(pago.clone()).await?;

    let activos = state
        .susu_participantes
        .count_documents(doc! { "susu_id": susu_id, "activo": true })
        .await? as i32;
    let pagos_del_periodo = state
        .susu_pagos
        .count_documents(doc! { "susu_id": susu_id, "numero_periodo": periodo })
        .await? as i32;

    if pagos_del_periodo >= activos {
        // Period complete: whoever holds this turn receives the pool.
        state
            .susu_participantes
            .update_one(
                doc! { "susu_id": susu_id, "orden": periodo },
                doc! { "$set": { "ya_recibio": true } },
            )
            .await?;

        if periodo >= activos {
            state
                .susus
                .update_one(
                    doc! { "_id": susu_id },
                    doc! { "$set": { "estado": "COMPLETADO" } },
                )
                .await?;
        } else {
            state
                .susus
                .update_one(
                    doc! { "_id": susu_id },
                    doc! { "$inc": { "periodo_actual": 1 } },
                )
                .await?;
        }
    }

    Ok(pago)
}
