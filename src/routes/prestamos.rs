// routes/prestamos.rs
// Loan origination, renewal and closing. Amounts travel as strings and are
// parsed into Decimal at the boundary.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::models::Prestamo;
use crate::money::parse_monto;
use crate::session::Actor;
use crate::state::{
    AppState, TerminosPrestamo, cancelar_prestamo, crear_prestamo, fecha_como_str,
    get_prestamo_por_id, hoy, listar_prestamos, renovar_prestamo, saldo_de_prestamo,
};

use super::helpers::{clean_opt, parse_fecha, parse_object_id, parse_tipo_pago};

#[derive(Deserialize)]
pub struct PrestamoFormData {
    #[serde(default)]
    pub cliente_id: Option<String>,
    pub monto: String,
    pub interes: String,
    pub cuotas: i32,
    pub tipo_pago: String,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
}

#[derive(Deserialize)]
pub struct PrestamosQuery {
    #[serde(default)]
    pub cliente_id: Option<String>,
}

fn terminos_de_form(form: &PrestamoFormData) -> Result<TerminosPrestamo, ApiError> {
    let fecha_inicio = match clean_opt(form.fecha_inicio.clone()) {
        Some(valor) => parse_fecha(&valor, "Fecha de inicio")?,
        None => hoy(),
    };
    Ok(TerminosPrestamo {
        monto: parse_monto(&form.monto, "Monto")?,
        interes: parse_monto(&form.interes, "Interés")?,
        cuotas: form.cuotas,
        tipo_pago: parse_tipo_pago(&form.tipo_pago)?,
        fecha_inicio,
    })
}

fn prestamo_json(prestamo: &Prestamo) -> Value {
    json!({
        "id": prestamo.id.map(|id| id.to_hex()),
        "cliente_id": prestamo.cliente_id.to_hex(),
        "monto": prestamo.monto,
        "interes": prestamo.interes,
        "tipo_pago": prestamo.tipo_pago,
        "cuotas": prestamo.cuotas,
        "valor_cuota": prestamo.valor_cuota,
        "fecha_inicio": fecha_como_str(prestamo.fecha_inicio),
        "fecha_fin": fecha_como_str(prestamo.fecha_fin),
        "estado": prestamo.estado,
        "observaciones": prestamo.observaciones,
    })
}

pub async fn prestamos_index(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PrestamosQuery>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("prestamos.ver")?;
    let cliente_id = match clean_opt(query.cliente_id) {
        Some(valor) => Some(parse_object_id(&valor, "Cliente")?),
        None => None,
    };
    let prestamos = listar_prestamos(&state, cliente_id.as_ref()).await?;
    Ok(Json(json!({
        "prestamos": prestamos.iter().map(prestamo_json).collect::<Vec<_>>(),
    })))
}

pub async fn prestamos_show(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("prestamos.ver")?;
    let id = parse_object_id(&id, "Préstamo")?;
    let prestamo = get_prestamo_por_id(&state, &id)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("préstamo no encontrado".into()))?;
    let saldo = saldo_de_prestamo(&state, &prestamo).await?;

    let mut cuerpo = prestamo_json(&prestamo);
    if let Value::Object(ref mut mapa) = cuerpo {
        mapa.insert("saldo_pendiente".into(), json!(saldo));
    }
    Ok(Json(cuerpo))
}

pub async fn prestamos_create(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Json(form): Json<PrestamoFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("prestamos.crear")?;
    let cliente_id = clean_opt(form.cliente_id.clone())
        .ok_or_else(|| ApiError::Validacion("Cliente es obligatorio".into()))?;
    let cliente_id = parse_object_id(&cliente_id, "Cliente")?;
    let terminos = terminos_de_form(&form)?;
    let id = crear_prestamo(&state, &cliente_id, &terminos, actor.usuario_id()).await?;
    Ok(Json(json!({ "ok": true, "id": id.to_hex() })))
}

pub async fn prestamos_renovar(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<PrestamoFormData>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("prestamos.renovar")?;
    let id = parse_object_id(&id, "Préstamo")?;
    let terminos = terminos_de_form(&form)?;
    let resultado = renovar_prestamo(&state, &id, &terminos, actor.usuario_id()).await?;
    Ok(Json(json!({
        "ok": true,
        "prestamo_anterior": resultado.prestamo_anterior.to_hex(),
        "prestamo_nuevo": resultado.prestamo_nuevo.to_hex(),
        "principal_efectivo": resultado.principal_efectivo,
        "descuento_aplicado": resultado.descuento_aplicado,
    })))
}

pub async fn prestamos_cancelar(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("prestamos.renovar")?;
    let id = parse_object_id(&id, "Préstamo")?;
    cancelar_prestamo(&state, &id).await?;
    Ok(Json(json!({ "ok": true })))
}
