// main.rs
// Server wiring: initializes logging and MongoDB-backed state, builds the
// router, and serves on BIND_ADDR (default :8080).

use std::{env, net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use tokio::net::TcpListener;

use cobranzas::{routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let state = Arc::new(state::init_state().await?);
    let app = routes::router(state);

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()?;
    log::info!("escuchando en http://{addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
