// state/reportes.rs
// Reporting aggregator. Walks raw loan/payment/expense rows for a date
// range and derives the portfolio metrics; nothing is cached.

use std::collections::HashMap;

use bson::{doc, oid::ObjectId};
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::ApiResult;
use crate::models::EstadoPrestamo;
use crate::money::{no_negativo, redondear};
use crate::schedule::{dias_de_atraso, saldo_pendiente, total_a_pagar};

use super::{AppState, fin_del_dia, hoy, inicio_del_dia};

/// Arrears policy: flat monthly rate prorated by days late. Business
/// policy, not a stored contractual rate.
pub const TASA_MORA_MENSUAL: Decimal = dec!(5);

/// Collector commission over recovered capital.
pub const TASA_COMISION_COBRADOR: Decimal = dec!(10);

#[derive(Debug, Clone, Serialize)]
pub struct ComisionCobrador {
    pub usuario_id: String,
    pub recuperado: Decimal,
    pub comision: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReporteRango {
    pub desde: NaiveDate,
    pub hasta: NaiveDate,
    pub capital_invertido: Decimal,
    pub capital_recuperado: Decimal,
    pub saldo_pendiente_total: Decimal,
    pub capital_vencido: Decimal,
    pub interes_ganado: Decimal,
    pub mora_estimada: Decimal,
    pub total_gastos: Decimal,
    pub comisiones: Vec<ComisionCobrador>,
    pub total_comisiones: Decimal,
    pub ganancia_neta: Decimal,
}

pub async fn reporte_rango(
    state: &AppState,
    desde: NaiveDate,
    hasta: NaiveDate,
) -> ApiResult<ReporteRango> {
    let mut prestamos = Vec::new();
    let mut cursor = state.prestamos.find(doc! {}).await?;
    while let Some(prestamo) = cursor.try_next().await? {
        prestamos.push(prestamo);
    }

    // Full payment history grouped per loan; the balance formula needs it
    // all, not just the range.
    let mut pagos_por_prestamo: HashMap<ObjectId, Vec<Decimal>> = HashMap::new();
    let mut pagos_en_rango = Vec::new();
    let rango = doc! { "$gte": inicio_del_dia(desde), "$lt": fin_del_dia(hasta) };
    let mut cursor = state.pagos.find(doc! {}).await?;
    while let Some(pago) = cursor.try_next().await? {
        pagos_por_prestamo
            .entry(pago.prestamo_id)
            .or_default()
            .push(pago.monto);
        let fecha = pago.fecha.to_chrono().date_naive();
        if fecha >= desde && fecha <= hasta {
            pagos_en_rango.push(pago);
        }
    }

    let mut total_gastos = Decimal::ZERO;
    let mut cursor = state.gastos.find(doc! { "fecha": rango }).await?;
    while let Some(gasto) = cursor.try_next().await? {
        total_gastos += gasto.monto;
    }

    let totales: HashMap<ObjectId, (Decimal, Decimal)> = prestamos
        .iter()
        .filter_map(|p| {
            p.id.map(|id| (id, (p.monto, total_a_pagar(p.monto, p.interes))))
        })
        .collect();

    let mut capital_invertido = Decimal::ZERO;
    let mut saldo_pendiente_total = Decimal::ZERO;
    let mut capital_vencido = Decimal::ZERO;
    let mut mora_estimada = Decimal::ZERO;
    let dia = hoy();

    for prestamo in &prestamos {
        if prestamo.fecha_inicio >= desde && prestamo.fecha_inicio <= hasta {
            capital_invertido += prestamo.monto;
        }
        if prestamo.estado != EstadoPrestamo::Activo {
            continue;
        }
        let Some(id) = prestamo.id else { continue };
        let vacio = Vec::new();
        let pagos = pagos_por_prestamo.get(&id).unwrap_or(&vacio);
        let saldo = saldo_pendiente(total_a_pagar(prestamo.monto, prestamo.interes), pagos);
        saldo_pendiente_total += saldo;
        if prestamo.fecha_fin < dia {
            capital_vencido += saldo;
            let dias = dias_de_atraso(prestamo.tipo_pago, prestamo.fecha_fin, dia);
            mora_estimada +=
                saldo * (TASA_MORA_MENSUAL / dec!(100)) * (Decimal::from(dias) / dec!(30));
        }
    }

    // Interest share of each recovered payment, prorated by the loan's own
    // interest-to-total ratio.
    let mut capital_recuperado = Decimal::ZERO;
    let mut interes_ganado = Decimal::ZERO;
    let mut recuperado_por_cobrador: HashMap<ObjectId, Decimal> = HashMap::new();
    for pago in &pagos_en_rango {
        capital_recuperado += pago.monto;
        if let Some((principal, total)) = totales.get(&pago.prestamo_id) {
            if *total > Decimal::ZERO {
                interes_ganado += pago.monto * (*total - *principal) / *total;
            }
        }
        *recuperado_por_cobrador
            .entry(pago.registrado_por)
            .or_default() += pago.monto;
    }

    let mut comisiones: Vec<ComisionCobrador> = recuperado_por_cobrador
        .into_iter()
        .map(|(usuario_id, recuperado)| ComisionCobrador {
            usuario_id: usuario_id.to_hex(),
            recuperado: redondear(recuperado),
            comision: redondear(recuperado * TASA_COMISION_COBRADOR / dec!(100)),
        })
        .collect();
    comisiones.sort_by(|a, b| a.usuario_id.cmp(&b.usuario_id));
    let total_comisiones: Decimal = comisiones.iter().map(|c| c.comision).sum();

    let ganancia_neta =
        capital_recuperado + interes_ganado + mora_estimada - capital_invertido - total_gastos;

    Ok(ReporteRango {
        desde,
        hasta,
        capital_invertido: redondear(capital_invertido),
        capital_recuperado: redondear(capital_recuperado),
        saldo_pendiente_total: redondear(saldo_pendiente_total),
        capital_vencido: redondear(capital_vencido),
        interes_ganado: redondear(interes_ganado),
        mora_estimada: redondear(no_negativo(mora_estimada)),
        total_gastos: redondear(total_gastos),
        comisiones,
        total_comisiones: redondear(total_comisiones),
        ganancia_neta: redondear(ganancia_neta),
    })
}
