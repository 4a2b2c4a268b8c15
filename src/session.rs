// session.rs
// Session middleware to protect routes and extractor to access session data.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bson::oid::ObjectId;
use futures::future::BoxFuture;

use crate::auth::Capacidades;
use crate::models::Rol;
use crate::state::{AppState, UsuarioActual, buscar_usuario_por_sesion, registrar_actividad};

pub const SESSION_COOKIE_NAME: &str = "session";
pub const DEVICE_COOKIE_NAME: &str = "device_id";

#[derive(Clone)]
pub struct SessionData {
    pub usuario: UsuarioActual,
    pub capacidades: Capacidades,
    pub token: String,
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let tokens = extract_cookies(request.headers(), SESSION_COOKIE_NAME);
    if tokens.is_empty() {
        return Err(unauthorized_response());
    }

    // Try all cookies with the session name until one is valid
    let mut found = None;
    for token in tokens {
        match buscar_usuario_por_sesion(&state, &token).await {
            Ok(Some(usuario)) => {
                found = Some((usuario, token));
                break;
            }
            Ok(None) => continue,
            Err(_) => {
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "session lookup failed").into_response(),
                );
            }
        }
    }

    let Some((usuario, token)) = found else {
        return Err(unauthorized_response());
    };

    // Accumulate active time and evaluate the capability set once per request.
    let tiempo_agotado = registrar_actividad(&state, &usuario, &token)
        .await
        .unwrap_or(false);
    let capacidades = Capacidades::nueva(usuario.rol, &usuario.permisos, tiempo_agotado);

    request.extensions_mut().insert(SessionData {
        usuario,
        capacidades,
        token,
    });
    Ok(next.run(request).await)
}

pub struct Actor(pub SessionData);

impl Actor {
    pub fn usuario(&self) -> &UsuarioActual {
        &self.0.usuario
    }

    pub fn usuario_id(&self) -> &ObjectId {
        &self.0.usuario.id
    }

    pub fn rol(&self) -> Rol {
        self.0.usuario.rol
    }

    pub fn capacidades(&self) -> &Capacidades {
        &self.0.capacidades
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn is_admin(&self) -> bool {
        self.0.usuario.rol.is_admin()
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(unauthorized_response);

        Box::pin(async move {
            match data {
                Ok(session) => Ok(Actor(session)),
                Err(resp) => Err(resp),
            }
        })
    }
}

fn unauthorized_response() -> Response {
    (StatusCode::UNAUTHORIZED, "no autorizado").into_response()
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}
