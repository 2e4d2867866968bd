mod misc;

use std::time::Duration;

use anyhow::Result;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use misc::health_routes;

/// Serves the liveness endpoints until the listener fails.
pub async fn serve(port: u16) -> Result<()> {
    let app = health_routes()
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(format!(":::{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
