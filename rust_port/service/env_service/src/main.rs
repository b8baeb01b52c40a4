use std::net::SocketAddr;

use arctic_dash_env::register_default_env as register_arctic_dash;
use env_service::make_app;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    // Pre-register environments for /envs and factory-based init
    register_arctic_dash();
    let app = make_app();

    let addr: SocketAddr = std::env::var("ARCTIC_DASH_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("environment service listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
