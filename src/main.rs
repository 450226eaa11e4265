use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use medicard_core::{CoreConfig, DEFAULT_DATA_DIR};

/// Main entry point for the MediCard application
///
/// Starts the REST server (default port 3000) serving the scan-to-identify
/// endpoints with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `MEDICARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDICARD_DATA_DIR`: Directory for patient data storage
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medicard=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDICARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting MediCard REST on {}", rest_addr);

    let data_dir = std::env::var("MEDICARD_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!(
            "Patient data directory does not exist: {}",
            data_path.display()
        );
    }

    let cfg = Arc::new(CoreConfig::new(data_path.to_path_buf())?);
    let app = router(AppState { cfg });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
