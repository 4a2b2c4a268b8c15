// Reporting aggregator over a seeded fixture, audit trail writes, and the
// soft-delete rule for borrowers with loans on file.

use chrono::Duration;
use rust_decimal_macros::dec;

use cobranzas::models::{Rol, TipoPago};
use cobranzas::state::{
    TerminosPrestamo, crear_cliente, crear_prestamo, eliminar_cliente, get_cliente_por_id,
    hoy, listar_auditoria, registrar_eliminacion, registrar_gasto, registrar_pago, reporte_rango,
};

#[path = "common/mod.rs"]
mod common;

use common::usuario_con_permisos;

#[tokio::test]
async fn reporte_deriva_metricas_del_rango() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let supervisor =
        usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &["pagos.crear"]).await;
    let cobrador = usuario_con_permisos(&state, "cob@test", Rol::Cobrador, &["pagos.crear"]).await;

    let cliente = crear_cliente(&state, "doc-rep", "Cliente", "Calle 4", "555-3333", &supervisor)
        .await
        .unwrap();

    // préstamo vigente: total 1,200,000
    let vigente = crear_prestamo(
        &state,
        &cliente,
        &TerminosPrestamo {
            monto: dec!(1_000_000),
            interes: dec!(20),
            cuotas: 10,
            tipo_pago: TipoPago::Semanal,
            fecha_inicio: hoy(),
        },
        &supervisor,
    )
    .await
    .unwrap();

    // préstamo vencido hace 30 días, sin pagos: total 100,000
    crear_prestamo(
        &state,
        &cliente,
        &TerminosPrestamo {
            monto: dec!(100_000),
            interes: dec!(0),
            cuotas: 10,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy() - Duration::days(40),
        },
        &supervisor,
    )
    .await
    .unwrap();

    // el cobrador recupera 600,000 hoy
    registrar_pago(&state, &vigente, dec!(600_000), None, &cobrador, Rol::Cobrador)
        .await
        .unwrap();
    registrar_gasto(&state, &supervisor, Rol::Supervisor, "Papelería", dec!(50_000))
        .await
        .unwrap();

    let reporte = reporte_rango(&state, hoy() - Duration::days(60), hoy())
        .await
        .unwrap();

    assert_eq!(reporte.capital_invertido, dec!(1_100_000));
    assert_eq!(reporte.capital_recuperado, dec!(600_000));
    // saldos: 600,000 del vigente + 100,000 del vencido
    assert_eq!(reporte.saldo_pendiente_total, dec!(700_000));
    assert_eq!(reporte.capital_vencido, dec!(100_000));
    // interés prorrateado: 600,000 * 200,000/1,200,000 = 100,000
    assert_eq!(reporte.interes_ganado, dec!(100_000));
    // mora: 100,000 * 5% * 30/30 días
    assert_eq!(reporte.mora_estimada, dec!(5_000));
    assert_eq!(reporte.total_gastos, dec!(50_000));

    // comisión del cobrador: 10% de lo recuperado
    let comision = reporte
        .comisiones
        .iter()
        .find(|c| c.usuario_id == cobrador.to_hex())
        .unwrap();
    assert_eq!(comision.recuperado, dec!(600_000));
    assert_eq!(comision.comision, dec!(60_000));

    // neta = 600,000 + 100,000 + 5,000 - 1,100,000 - 50,000
    assert_eq!(reporte.ganancia_neta, dec!(-445_000));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn auditoria_conserva_el_snapshot_de_lo_eliminado() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let supervisor = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &[]).await;

    registrar_eliminacion(
        &state,
        &supervisor,
        "Gasto",
        "abc123",
        serde_json::json!({ "concepto": "Gasolina", "monto": "500" }),
        "10.0.0.8",
        "Mozilla/5.0",
    )
    .await
    .unwrap();

    let registros = listar_auditoria(&state).await.unwrap();
    assert_eq!(registros.len(), 1);
    let registro = &registros[0];
    assert_eq!(registro.usuario_id, supervisor);
    assert_eq!(registro.tipo_entidad, "Gasto");
    assert_eq!(registro.entidad_id, "abc123");
    assert_eq!(registro.detalles["concepto"], "Gasolina");
    assert_eq!(registro.ip, "10.0.0.8");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn cliente_con_prestamos_solo_se_desactiva() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let supervisor = usuario_con_permisos(&state, "sup@test", Rol::Supervisor, &[]).await;

    let con_prestamo = crear_cliente(&state, "doc-a", "Con préstamo", "", "", &supervisor)
        .await
        .unwrap();
    crear_prestamo(
        &state,
        &con_prestamo,
        &TerminosPrestamo {
            monto: dec!(10_000),
            interes: dec!(10),
            cuotas: 4,
            tipo_pago: TipoPago::Diario,
            fecha_inicio: hoy(),
        },
        &supervisor,
    )
    .await
    .unwrap();
    let sin_prestamo = crear_cliente(&state, "doc-b", "Sin préstamo", "", "", &supervisor)
        .await
        .unwrap();

    let (_, eliminado) = eliminar_cliente(&state, &con_prestamo).await.unwrap();
    assert!(!eliminado);
    let cliente = get_cliente_por_id(&state, &con_prestamo)
        .await
        .unwrap()
        .unwrap();
    assert!(!cliente.activo);

    let (_, eliminado) = eliminar_cliente(&state, &sin_prestamo).await.unwrap();
    assert!(eliminado);
    assert!(get_cliente_por_id(&state, &sin_prestamo)
        .await
        .unwrap()
        .is_none());

    common::teardown(Some(ctx)).await;
}
