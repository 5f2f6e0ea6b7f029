// Local identifier generator for development: GET /generate?prefix=<prefix>

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use event_directory::{config::Config, infrastructure::local_generator_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_directory=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.generator.listen_port));

    let app = local_generator_router().layer(TraceLayer::new_for_http());

    info!("Identifier generator listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
