// routes/caja.rs
// Petty-cash movement handlers. Assignments to a collector come from a
// supervisor or administrator; collectors record their own spend/return.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::{MovimientoCaja, TipoMovimientoCaja};
use crate::money::parse_monto;
use crate::session::Actor;
use crate::state::{AppState, listar_movimientos_caja, registrar_movimiento_caja, saldo_caja};

use super::helpers::{clean_opt, parse_object_id, parse_tipo_movimiento};

#[derive(Deserialize)]
pub struct MovimientoFormData {
    pub cobrador_id: String,
    pub tipo: String,
    pub monto: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

fn movimiento_json(movimiento: &MovimientoCaja) -> Value {
    json!({
        "id": movimiento.id.map(|id| id.to_hex()),
        "cobrador_id": movimiento.cobrador_id.to_hex(),
        "asignado_por": movimiento.asignado_por.map(|id| id.to_hex()),
        "tipo": movimiento.tipo,
        "monto": movimiento.monto,
        "saldo_anterior": movimiento.saldo_anterior,
        "saldo_nuevo": movimiento.saldo_nuevo,
        "descripcion": movimiento.descripcion,
        "fecha": movimiento.fecha.try_to_rfc3339_string().ok(),
    })
}

pub async fn movimientos_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(cobrador_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("caja.ver")?;
    let cobrador_id = parse_object_id(&cobrador_id, "Cobrador")?;
    let movimientos = listar_movimientos_caja(&state, &cobrador_id).await?;
    Ok(Json(json!({
        "movimientos": movimientos.iter().map(movimiento_json).collect::<Vec<_>>(),
    })))
}

pub async fn saldo_show(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(cobrador_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("caja.ver")?;
    let cobrador_id = parse_object_id(&cobrador_id, "Cobrador")?;
    let saldo = saldo_caja(&state, &cobrador_id).await?;
    Ok(Json(json!({ "cobrador_id": cobrador_id.to_hex(), "saldo": saldo })))
}

pub async fn movimientos_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<MovimientoFormData>,
) -> Result<Json<Value>, ApiError> {
    let tipo = parse_tipo_movimiento(&form.tipo)?;
    let cobrador_id = parse_object_id(&form.cobrador_id, "Cobrador")?;

    // Handing out or adjusting the float is a supervisor action; spending
    // and returning it belongs to the collector's own flow.
    let (permiso, asignado_por) = match tipo {
        TipoMovimientoCaja::Entregado | TipoMovimientoCaja::Entrega | TipoMovimientoCaja::Ajuste => {
            ("caja.asignar", Some(*actor.usuario_id()))
        }
        TipoMovimientoCaja::Gastado | TipoMovimientoCaja::Devuelto => ("caja.ver", None),
    };
    actor.capacidades().exigir_permiso(permiso)?;
    if asignado_por.is_none()
        && cobrador_id != *actor.usuario_id()
        && !actor.capacidades().tiene_permiso("caja.asignar")
    {
        return Err(ApiError::Prohibido(
            "solo puede registrar movimientos de su propia caja".into(),
        ));
    }

    let monto = parse_monto(&form.monto, "Monto")?;
    let movimiento = registrar_movimiento_caja(
        &state,
        &cobrador_id,
        asignado_por,
        tipo,
        monto,
        clean_opt(form.descripcion),
    )
    .await?;
    Ok(Json(movimiento_json(&movimiento)))
}
