// routes/mod.rs
// Route handlers and the router assembly shared by the binary and tests.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::session::require_session;
use crate::state::AppState;

mod helpers;

pub mod auditoria;
pub mod caja;
pub mod cierres;
pub mod clientes;
pub mod dispositivos;
pub mod gastos;
pub mod login;
pub mod logout;
pub mod pagos;
pub mod prestamos;
pub mod reportes;
pub mod susu;
pub mod usuarios;

pub use login::login;
pub use logout::logout;

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route(
            "/clientes",
            get(clientes::clientes_index).post(clientes::clientes_create),
        )
        .route("/clientes/{id}", get(clientes::clientes_show))
        .route("/clientes/{id}/update", post(clientes::clientes_update))
        .route("/clientes/{id}/delete", post(clientes::clientes_delete))
        .route(
            "/prestamos",
            get(prestamos::prestamos_index).post(prestamos::prestamos_create),
        )
        .route("/prestamos/{id}", get(prestamos::prestamos_show))
        .route("/prestamos/{id}/renovar", post(prestamos::prestamos_renovar))
        .route(
            "/prestamos/{id}/cancelar",
            post(prestamos::prestamos_cancelar),
        )
        .route(
            "/prestamos/{id}/pagos",
            get(pagos::pagos_index).post(pagos::pagos_create),
        )
        .route(
            "/prestamos/{id}/transferencias",
            get(pagos::transferencias_index).post(pagos::transferencias_create),
        )
        .route("/pagos/{id}/modificado", post(pagos::pagos_marcar_modificado))
        .route("/pagos/{id}/delete", post(pagos::pagos_delete))
        .route(
            "/gastos",
            get(gastos::gastos_index).post(gastos::gastos_create),
        )
        .route("/gastos/{id}/delete", post(gastos::gastos_delete))
        .route("/caja/movimientos", post(caja::movimientos_create))
        .route(
            "/caja/movimientos/{cobrador_id}",
            get(caja::movimientos_index),
        )
        .route("/caja/saldo/{cobrador_id}", get(caja::saldo_show))
        .route("/susu", get(susu::susu_index).post(susu::susu_create))
        .route("/susu/{id}", get(susu::susu_show))
        .route("/susu/{id}/pagos", post(susu::susu_pago_create))
        .route("/reportes", get(reportes::reporte_show))
        .route(
            "/cierres",
            get(cierres::cierres_index).post(cierres::cierres_create),
        )
        .route(
            "/usuarios",
            get(usuarios::usuarios_index).post(usuarios::usuarios_create),
        )
        .route("/usuarios/{id}/update", post(usuarios::usuarios_update))
        .route("/usuarios/{id}/delete", post(usuarios::usuarios_delete))
        .route("/usuarios/{id}/permisos", post(usuarios::usuarios_permisos))
        .route(
            "/usuarios/{id}/permisos/defaults",
            post(usuarios::usuarios_permisos_defaults),
        )
        .route("/dispositivos", get(dispositivos::dispositivos_index))
        .route(
            "/dispositivos/{id}/aprobar",
            post(dispositivos::dispositivos_aprobar),
        )
        .route(
            "/dispositivos/{id}/rechazar",
            post(dispositivos::dispositivos_rechazar),
        )
        .route("/auditoria", get(auditoria::auditoria_index))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}
