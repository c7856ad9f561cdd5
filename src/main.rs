use std::error::Error;
use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use video_seo::config::Config;
use video_seo::db::init_db;
use video_seo::{build_app, with_metrics, InnerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_seo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(strategy = ?config.strategy, site_url = %config.site_url, "Configuration loaded");

    let db = init_db(&config.database).await?;
    let address = format!("{}:{}", config.server.host, config.server.port);

    let state = InnerState::new(db, config)?;
    let app = with_metrics(build_app(state));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::debug!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
