// Event Directory Server

use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use event_directory::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_directory=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config).await?;
    let addr = app_state.config.server_address();
    info!("Media resolves under {}", app_state.config.cdn_uri);

    let app = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Event directory listening on http://{}", addr);
    info!("  GET    /health");
    info!("  GET    /api/v1/events                     - Recommended events");
    info!("  POST   /api/v1/events                     - Create event");
    info!("  GET    /api/v1/events/{{id}}                - Get event");
    info!("  PATCH  /api/v1/events/{{id}}                - Update event");
    info!("  DELETE /api/v1/events/{{id}}                - Delete event");
    info!("  POST   /api/v1/venues                     - Create venue");
    info!("  GET    /api/v1/venues/{{id}}/events         - Events hosted at a venue");
    info!("  POST   /api/v1/users                      - Create user");
    info!("  PUT    /api/v1/users/{{handle}}/follows/{{target}} - Follow a user");
    info!("  PUT    /api/v1/users/{{handle}}/likes/{{target}}   - Like an event or venue");
    info!("  GET    /api/v1/media/{{id}}                 - Resolve a media identifier");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
