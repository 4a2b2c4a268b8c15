// Ledger arithmetic over the loan/payment core: balances derive from the
// stored history, overpayment is rejected, and the day-closed gate only
// blocks collectors.

use bson::oid::ObjectId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cobranzas::error::ApiError;
use cobranzas::models::{EstadoPrestamo, Rol, TipoPago};
use cobranzas::state::{
    AppState, TerminosPrestamo, cancelar_prestamo, cerrar_dia, crear_cliente, crear_prestamo,
    fecha_como_str, get_prestamo_por_id, hoy, listar_pagos_de_prestamo,
    listar_transferencias_de_prestamo, registrar_gasto, registrar_pago, registrar_transferencia,
    saldo_de_prestamo,
};

#[path = "common/mod.rs"]
mod common;

use common::usuario_con_permisos;

async fn prestamo_de_prueba(
    state: &AppState,
    staff: &ObjectId,
    monto: Decimal,
    interes: Decimal,
    cuotas: i32,
) -> ObjectId {
    let cliente = crear_cliente(
        state,
        &format!("doc-{}", ObjectId::new().to_hex()),
        "Cliente de prueba",
        "Calle 1",
        "555-0000",
        staff,
    )
    .await
    .unwrap();
    crear_prestamo(
        state,
        &cliente,
        &TerminosPrestamo {
            monto,
            interes,
            cuotas,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        staff,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn saldo_decrece_exactamente_con_cada_pago() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let staff = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["pagos.crear"]).await;

    // principal 1,000,000 al 20% en 10 cuotas -> total 1,200,000
    let prestamo_id = prestamo_de_prueba(&state, &staff, dec!(1_000_000), dec!(20), 10).await;
    let prestamo = get_prestamo_por_id(&state, &prestamo_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prestamo.valor_cuota, dec!(120_000));
    assert_eq!(
        saldo_de_prestamo(&state, &prestamo).await.unwrap(),
        dec!(1_200_000)
    );

    let saldo = registrar_pago(&state, &prestamo_id, dec!(500_000), None, &staff, Rol::Supervisor)
        .await
        .unwrap();
    assert_eq!(saldo, dec!(700_000));

    // un pago por encima del saldo se rechaza
    let err = registrar_pago(&state, &prestamo_id, dec!(800_000), None, &staff, Rol::Supervisor)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validacion(_)));
    assert!(err.to_string().contains("excede el saldo"));

    // el saldo exacto sí, y deja el préstamo en cero
    let saldo = registrar_pago(&state, &prestamo_id, dec!(700_000), None, &staff, Rol::Supervisor)
        .await
        .unwrap();
    assert_eq!(saldo, Decimal::ZERO);

    // ya pagado: cualquier pago adicional se rechaza
    let err = registrar_pago(&state, &prestamo_id, dec!(1), None, &staff, Rol::Supervisor)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ya está pagado"));

    // y ahora puede cancelarse
    cancelar_prestamo(&state, &prestamo_id).await.unwrap();
    let prestamo = get_prestamo_por_id(&state, &prestamo_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prestamo.estado, EstadoPrestamo::Cancelado);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn pagos_invalidos_se_rechazan() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let staff = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["pagos.crear"]).await;
    let prestamo_id = prestamo_de_prueba(&state, &staff, dec!(100_000), dec!(10), 5).await;

    for monto in [dec!(0), dec!(-50)] {
        let err = registrar_pago(&state, &prestamo_id, monto, None, &staff, Rol::Supervisor)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validacion(_)));
    }

    // techo de sanidad
    let err = registrar_pago(
        &state,
        &prestamo_id,
        dec!(2_000_000_000_000),
        None,
        &staff,
        Rol::Supervisor,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validacion(_)));

    // préstamo inexistente
    let err = registrar_pago(
        &state,
        &ObjectId::new(),
        dec!(100),
        None,
        &staff,
        Rol::Supervisor,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NoEncontrado(_)));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn dia_cerrado_bloquea_solo_a_cobradores() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let supervisor =
        usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["pagos.crear"]).await;
    let cobrador = usuario_con_permisos(
        &state,
        "cob@test",
        Rol::Cobrador,
        &["pagos.crear", "gastos.crear"],
    )
    .await;
    let prestamo_id = prestamo_de_prueba(&state, &supervisor, dec!(200_000), dec!(10), 4).await;

    cerrar_dia(&state, &fecha_como_str(hoy()), &supervisor)
        .await
        .unwrap();

    // cobrador bloqueado para pagos y gastos
    let err = registrar_pago(&state, &prestamo_id, dec!(1_000), None, &cobrador, Rol::Cobrador)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Prohibido(_)));
    let err = registrar_gasto(&state, &cobrador, Rol::Cobrador, "Gasolina", dec!(500))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Prohibido(_)));

    // supervisor y administrador siguen operando el mismo día
    registrar_pago(
        &state,
        &prestamo_id,
        dec!(1_000),
        None,
        &supervisor,
        Rol::Supervisor,
    )
    .await
    .unwrap();
    registrar_gasto(&state, &supervisor, Rol::Supervisor, "Papelería", dec!(300))
        .await
        .unwrap();

    // cierre duplicado del mismo día
    let err = cerrar_dia(&state, &fecha_como_str(hoy()), &supervisor)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflicto(_)));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn transferencias_no_reducen_el_saldo() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let staff = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["pagos.crear"]).await;
    let prestamo_id = prestamo_de_prueba(&state, &staff, dec!(100_000), dec!(20), 10).await;

    registrar_transferencia(&state, &prestamo_id, dec!(50_000), "Banco Uno", "REF-1", &staff)
        .await
        .unwrap();

    let prestamo = get_prestamo_por_id(&state, &prestamo_id)
        .await
        .unwrap()
        .unwrap();
    // la evidencia queda en su propio libro; el saldo no cambia
    assert_eq!(
        saldo_de_prestamo(&state, &prestamo).await.unwrap(),
        dec!(120_000)
    );
    assert_eq!(
        listar_transferencias_de_prestamo(&state, &prestamo_id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        listar_pagos_de_prestamo(&state, &prestamo_id)
            .await
            .unwrap()
            .is_empty()
    );

    common::teardown(Some(ctx)).await;
}
