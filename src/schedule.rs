// schedule.rs
// Financial core: installment schedule derivation and outstanding-balance
// arithmetic. Pure functions only; persistence lives in `state`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ApiError;
use crate::models::TipoPago;
use crate::money::{no_negativo, redondear};

/// Derived schedule of a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cronograma {
    pub total_a_pagar: Decimal,
    pub valor_cuota: Decimal,
    pub fecha_fin: NaiveDate,
}

/// Days per installment for each payment frequency. The business-day
/// variants count 1 but advance through `avanzar_dias_habiles`.
pub fn dias_por_tipo(tipo: TipoPago) -> i64 {
    match tipo {
        TipoPago::Diario | TipoPago::LunesAViernes | TipoPago::LunesASabado => 1,
        TipoPago::Semanal => 7,
        TipoPago::Catorcenal => 14,
        TipoPago::Quincenal => 15,
        TipoPago::Mensual | TipoPago::FinDeMes => 30,
        TipoPago::Trimestral => 90,
        TipoPago::Cuatrimestral => 120,
        TipoPago::Semestral => 180,
        TipoPago::Anual => 365,
    }
}

/// `monto * (1 + interes/100)`, rounded to 2 decimals.
pub fn total_a_pagar(monto: Decimal, interes: Decimal) -> Decimal {
    redondear(monto * (dec!(1) + interes / dec!(100)))
}

/// Outstanding balance: total payable minus the sum of payments, floored
/// at zero. Never cached on the loan document.
pub fn saldo_pendiente(total_a_pagar: Decimal, pagos: &[Decimal]) -> Decimal {
    let pagado: Decimal = pagos.iter().copied().sum();
    no_negativo(redondear(total_a_pagar - pagado))
}

fn es_dia_habil(fecha: NaiveDate, tipo: TipoPago) -> bool {
    match fecha.weekday() {
        Weekday::Sun => false,
        Weekday::Sat => tipo != TipoPago::LunesAViernes,
        _ => true,
    }
}

/// Advances `dias` working days from `desde`, skipping Sundays (and
/// Saturdays for LUNES_A_VIERNES). Single source of truth for both the
/// schedule end date and the days-late count.
pub fn avanzar_dias_habiles(desde: NaiveDate, dias: i64, tipo: TipoPago) -> NaiveDate {
    let mut fecha = desde;
    let mut restantes = dias;
    while restantes > 0 {
        fecha += Duration::days(1);
        if es_dia_habil(fecha, tipo) {
            restantes -= 1;
        }
    }
    fecha
}

/// Days late at `hoy` for a loan that ended at `fecha_fin`. Business-day
/// frequencies count only working days; the rest count calendar days.
pub fn dias_de_atraso(tipo: TipoPago, fecha_fin: NaiveDate, hoy: NaiveDate) -> i64 {
    if hoy <= fecha_fin {
        return 0;
    }
    match tipo {
        TipoPago::LunesAViernes | TipoPago::LunesASabado => {
            let mut fecha = fecha_fin;
            let mut dias = 0;
            while fecha < hoy {
                fecha += Duration::days(1);
                if es_dia_habil(fecha, tipo) {
                    dias += 1;
                }
            }
            dias
        }
        _ => (hoy - fecha_fin).num_days(),
    }
}

/// Derives total payable, per-installment value and end date for a loan.
pub fn calcular_cronograma(
    monto: Decimal,
    interes: Decimal,
    cuotas: i32,
    tipo: TipoPago,
    fecha_inicio: NaiveDate,
) -> Result<Cronograma, ApiError> {
    if monto <= Decimal::ZERO {
        return Err(ApiError::Validacion(
            "el monto del préstamo debe ser mayor que cero".into(),
        ));
    }
    if interes < Decimal::ZERO {
        return Err(ApiError::Validacion(
            "el interés no puede ser negativo".into(),
        ));
    }
    if cuotas <= 0 {
        return Err(ApiError::Validacion(
            "el número de cuotas debe ser mayor que cero".into(),
        ));
    }

    let total = total_a_pagar(monto, interes);
    let valor_cuota = redondear(total / Decimal::from(cuotas));

    let fecha_fin = match tipo {
        TipoPago::LunesAViernes | TipoPago::LunesASabado => {
            avanzar_dias_habiles(fecha_inicio, cuotas as i64, tipo)
        }
        _ => fecha_inicio + Duration::days(dias_por_tipo(tipo) * cuotas as i64),
    };

    Ok(Cronograma {
        total_a_pagar: total,
        valor_cuota,
        fecha_fin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fecha(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cronograma_basico() {
        let c = calcular_cronograma(
            dec!(1_000_000),
            dec!(20),
            10,
            TipoPago::Diario,
            fecha(2025, 3, 3),
        )
        .unwrap();
        assert_eq!(c.total_a_pagar, dec!(1_200_000));
        assert_eq!(c.valor_cuota, dec!(120_000));
        assert_eq!(c.fecha_fin, fecha(2025, 3, 13));
    }

    #[test]
    fn valor_cuota_por_cuotas_reconstruye_el_total() {
        let c = calcular_cronograma(
            dec!(750_000),
            dec!(15),
            12,
            TipoPago::Semanal,
            fecha(2025, 1, 6),
        )
        .unwrap();
        let reconstruido = c.valor_cuota * dec!(12);
        let diferencia = (reconstruido - c.total_a_pagar).abs();
        // tolerancia de redondeo: medio centavo por cuota
        assert!(diferencia <= dec!(0.06), "diferencia {diferencia}");
    }

    #[test]
    fn fecha_fin_por_frecuencia_fija() {
        let c = calcular_cronograma(
            dec!(500_000),
            dec!(10),
            4,
            TipoPago::Quincenal,
            fecha(2025, 2, 1),
        )
        .unwrap();
        assert_eq!(c.fecha_fin, fecha(2025, 2, 1) + Duration::days(60));
    }

    #[test]
    fn lunes_a_viernes_salta_fines_de_semana() {
        // 2025-03-07 es viernes; 5 días hábiles terminan el viernes siguiente.
        let fin = avanzar_dias_habiles(fecha(2025, 3, 7), 5, TipoPago::LunesAViernes);
        assert_eq!(fin, fecha(2025, 3, 14));

        // LUNES_A_SABADO solo salta domingos.
        let fin = avanzar_dias_habiles(fecha(2025, 3, 7), 5, TipoPago::LunesASabado);
        assert_eq!(fin, fecha(2025, 3, 13));
    }

    #[test]
    fn atraso_comparte_el_mismo_calendario() {
        // fin un viernes; el lunes siguiente hay 1 día hábil de atraso L-V.
        let fin = fecha(2025, 3, 7);
        assert_eq!(
            dias_de_atraso(TipoPago::LunesAViernes, fin, fecha(2025, 3, 10)),
            1
        );
        assert_eq!(
            dias_de_atraso(TipoPago::LunesASabado, fin, fecha(2025, 3, 10)),
            2
        );
        assert_eq!(dias_de_atraso(TipoPago::Diario, fin, fecha(2025, 3, 10)), 3);
        assert_eq!(dias_de_atraso(TipoPago::Diario, fin, fecha(2025, 3, 7)), 0);
    }

    #[test]
    fn cronograma_rechaza_entradas_invalidas() {
        let inicio = fecha(2025, 1, 1);
        assert!(calcular_cronograma(dec!(0), dec!(10), 5, TipoPago::Diario, inicio).is_err());
        assert!(calcular_cronograma(dec!(-100), dec!(10), 5, TipoPago::Diario, inicio).is_err());
        assert!(calcular_cronograma(dec!(100), dec!(-1), 5, TipoPago::Diario, inicio).is_err());
        assert!(calcular_cronograma(dec!(100), dec!(10), 0, TipoPago::Diario, inicio).is_err());
    }

    #[test]
    fn saldo_pendiente_nunca_negativo() {
        let total = dec!(1_200_000);
        assert_eq!(saldo_pendiente(total, &[]), total);
        assert_eq!(saldo_pendiente(total, &[dec!(500_000)]), dec!(700_000));
        assert_eq!(
            saldo_pendiente(total, &[dec!(500_000), dec!(700_000)]),
            Decimal::ZERO
        );
        assert_eq!(
            saldo_pendiente(total, &[dec!(900_000), dec!(900_000)]),
            Decimal::ZERO
        );
    }
}
