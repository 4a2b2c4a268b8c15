// money.rs
// Fixed-point helpers for currency amounts. Everything monetary is a
// rust_decimal::Decimal; f64 never touches money.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::ApiError;

/// Sanity ceiling for any single amount entered by a user.
pub const MONTO_MAXIMO: Decimal = dec!(1_000_000_000_000);

/// Rounds to 2 decimal places, midpoint away from zero.
pub fn redondear(monto: Decimal) -> Decimal {
    monto.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors an amount at zero.
pub fn no_negativo(monto: Decimal) -> Decimal {
    monto.max(Decimal::ZERO)
}

/// Parses a user-supplied amount. Amounts travel as strings in request
/// bodies so they never pass through f64.
pub fn parse_monto(valor: &str, etiqueta: &str) -> Result<Decimal, ApiError> {
    valor
        .trim()
        .parse::<Decimal>()
        .map(redondear)
        .map_err(|_| ApiError::Validacion(format!("{etiqueta} debe ser numérico")))
}

/// Validates an amount destined for a payment, expense or cash movement:
/// strictly positive and under the sanity ceiling.
pub fn validar_monto_positivo(monto: Decimal, etiqueta: &str) -> Result<(), ApiError> {
    if monto <= Decimal::ZERO {
        return Err(ApiError::Validacion(format!(
            "{etiqueta} debe ser mayor que cero"
        )));
    }
    if monto > MONTO_MAXIMO {
        return Err(ApiError::Validacion(format!(
            "{etiqueta} excede el monto máximo permitido"
        )));
    }
    Ok(())
}
