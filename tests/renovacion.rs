// Renewal engine: the outstanding balance nets against the new principal
// and carries forward as a discount payment on the new loan.

use rust_decimal_macros::dec;

use cobranzas::error::ApiError;
use cobranzas::models::{EstadoPrestamo, Rol, TipoPago};
use cobranzas::state::{
    TerminosPrestamo, crear_cliente, crear_prestamo, get_prestamo_por_id, hoy,
    listar_pagos_de_prestamo, registrar_pago, renovar_prestamo, saldo_de_prestamo,
};

#[path = "common/mod.rs"]
mod common;

use common::usuario_con_permisos;

#[tokio::test]
async fn renovacion_traslada_el_saldo_como_descuento() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let staff = usuario_con_permisos(
        &state,
        "sup@test",
        Rol::Supervisor,
        &["pagos.crear", "prestamos.renovar"],
    )
    .await;

    let cliente = crear_cliente(&state, "doc-renov", "Cliente", "Calle 2", "555-1111", &staff)
        .await
        .unwrap();
    // total 600,000; tras pagar 300,000 queda saldo 300,000
    let viejo = crear_prestamo(
        &state,
        &cliente,
        &TerminosPrestamo {
            monto: dec!(500_000),
            interes: dec!(20),
            cuotas: 10,
            tipo_pago: TipoPago::Semanal,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap();
    registrar_pago(&state, &viejo, dec!(300_000), None, &staff, Rol::Supervisor)
        .await
        .unwrap();

    let resultado = renovar_prestamo(
        &state,
        &viejo,
        &TerminosPrestamo {
            monto: dec!(1_000_000),
            interes: dec!(20),
            cuotas: 10,
            tipo_pago: TipoPago::Semanal,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap();

    assert_eq!(resultado.principal_efectivo, dec!(700_000));
    assert_eq!(resultado.descuento_aplicado, dec!(300_000));
    assert_eq!(resultado.prestamo_anterior, viejo);

    // el préstamo viejo queda RENOVADO con la nota de traslado
    let anterior = get_prestamo_por_id(&state, &viejo).await.unwrap().unwrap();
    assert_eq!(anterior.estado, EstadoPrestamo::Renovado);
    assert!(anterior.observaciones.unwrap().contains("Renovado"));

    // el nuevo arranca con exactamente un pago sintético por el saldo viejo
    let pagos = listar_pagos_de_prestamo(&state, &resultado.prestamo_nuevo)
        .await
        .unwrap();
    assert_eq!(pagos.len(), 1);
    assert_eq!(pagos[0].monto, dec!(300_000));
    assert!(pagos[0]
        .observaciones
        .as_deref()
        .unwrap()
        .contains("renovación"));

    // re-derivar el saldo del nuevo refleja el crédito de inmediato:
    // total 1,200,000 - 300,000 = 900,000
    let nuevo = get_prestamo_por_id(&state, &resultado.prestamo_nuevo)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saldo_de_prestamo(&state, &nuevo).await.unwrap(), dec!(900_000));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn renovacion_rechazada_si_no_supera_el_saldo() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let staff = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["prestamos.renovar"])
        .await;

    let cliente = crear_cliente(&state, "doc-corto", "Cliente", "Calle 3", "555-2222", &staff)
        .await
        .unwrap();
    // sin pagos: saldo = 500,000 * 1.0 = 500,000
    let viejo = crear_prestamo(
        &state,
        &cliente,
        &TerminosPrestamo {
            monto: dec!(500_000),
            interes: dec!(0),
            cuotas: 5,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap();

    let err = renovar_prestamo(
        &state,
        &viejo,
        &TerminosPrestamo {
            monto: dec!(500_000),
            interes: dec!(10),
            cuotas: 5,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validacion(_)));

    // nada cambió: el viejo sigue activo y sin pagos fantasma
    let anterior = get_prestamo_por_id(&state, &viejo).await.unwrap().unwrap();
    assert_eq!(anterior.estado, EstadoPrestamo::Activo);
    assert!(listar_pagos_de_prestamo(&state, &viejo)
        .await
        .unwrap()
        .is_empty());

    // una renovación válida deja al viejo RENOVADO; renovarlo otra vez falla
    let resultado = renovar_prestamo(
        &state,
        &viejo,
        &TerminosPrestamo {
            monto: dec!(800_000),
            interes: dec!(10),
            cuotas: 5,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap();
    assert_eq!(resultado.principal_efectivo, dec!(300_000));

    let err = renovar_prestamo(
        &state,
        &viejo,
        &TerminosPrestamo {
            monto: dec!(2_000_000),
            interes: dec!(10),
            cuotas: 5,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        &staff,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validacion(_)));

    common::teardown(Some(ctx)).await;
}
