// End-to-end auth flow over the router: login, device gate, session cookie,
// and permission-gated handlers.

use axum::{
    body::Body,
    http::{Request, StatusCode, header::SET_COOKIE},
};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

use cobranzas::models::{EstadoDispositivo, Rol};
use cobranzas::routes;
use cobranzas::state::{cambiar_estado_dispositivo, crear_usuario, listar_dispositivos};

#[path = "common/mod.rs"]
mod common;

use common::usuario_con_permisos;

fn login_request(email: &str, clave: &str, device_id: Option<&str>) -> Request<Body> {
    let cuerpo = match device_id {
        Some(device) => serde_json::json!({ "email": email, "clave": clave, "device_id": device }),
        None => serde_json::json!({ "email": email, "clave": clave }),
    };
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(cuerpo.to_string()))
        .unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .into_iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .expect("login sin cookie de sesión")
        .to_string()
}

#[tokio::test]
async fn login_sesion_y_permisos() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = Arc::new(ctx.state.clone());

    crear_usuario(
        &state,
        "admin@test",
        "clave-admin",
        "Admin",
        Rol::Administrador,
        None,
        None,
    )
    .await
    .unwrap();

    let app = routes::router(state.clone());

    // clave incorrecta
    let response = app
        .clone()
        .oneshot(login_request("admin@test", "otra", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // el administrador entra sin gate de dispositivo
    let response = app
        .clone()
        .oneshot(login_request("admin@test", "clave-admin", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    // sin sesión: 401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/clientes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // con sesión de administrador: pasa cualquier permiso
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/clientes")
                .header("cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn dispositivo_pendiente_bloquea_el_login() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = Arc::new(ctx.state.clone());
    usuario_con_permisos(&state, "cob@test", Rol::Cobrador, &[]).await;

    let app = routes::router(state.clone());

    // primer intento registra el dispositivo y lo deja pendiente
    let response = app
        .clone()
        .oneshot(login_request("cob@test", "secreto", Some("tablet-01")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let dispositivos = listar_dispositivos(&state).await.unwrap();
    assert_eq!(dispositivos.len(), 1);
    assert_eq!(dispositivos[0].estado, EstadoDispositivo::Pendiente);

    // aprobado por un administrador, el mismo dispositivo ya entra
    cambiar_estado_dispositivo(&state, &dispositivos[0].id.unwrap(), EstadoDispositivo::Aprobado)
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(login_request("cob@test", "secreto", Some("tablet-01")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    // cobrador sin permisos: la sesión vale pero el permiso no
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/clientes")
                .header("cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    common::teardown(Some(ctx)).await;
}
