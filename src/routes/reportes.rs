// routes/reportes.rs
// GET /reportes?desde=AAAA-MM-DD&hasta=AAAA-MM-DD

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::session::Actor;
use crate::state::{AppState, reporte_rango};

use super::helpers::parse_fecha;

#[derive(Deserialize)]
pub struct ReporteQuery {
    pub desde: String,
    pub hasta: String,
}

pub async fn reporte_show(
    actor: Actor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReporteQuery>,
) -> Result<Json<Value>, ApiError> {
    actor.capacidades().exigir_permiso("reportes.ver")?;
    let desde = parse_fecha(&query.desde, "Desde")?;
    let hasta = parse_fecha(&query.hasta, "Hasta")?;
    if desde > hasta {
        return Err(ApiError::Validacion(
            "el inicio del rango no puede ser posterior al fin".into(),
        ));
    }
    let reporte = reporte_rango(&state, desde, hasta).await?;
    let cuerpo = serde_json::to_value(&reporte)
        .map_err(|err| ApiError::Interno(err.into()))?;
    Ok(Json(cuerpo))
}
