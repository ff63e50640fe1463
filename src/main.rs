use anyhow::Result;

use catalogd::config::{Cli, Config};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard =
        catalogd::logging::init(cli.config.log_format, cli.config.log_dir.as_deref())?;
    run_server(cli.config).await
}

async fn run_server(config: Config) -> Result<()> {
    let catalogs = catalogd::service::Catalogs::from_config(&config)?;

    let app = catalogd::http::build_router(catalogs)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!(
        bind = %config.bind,
        book_id_seed = config.book_id_seed,
        todo_id_seed = config.todo_id_seed,
        "starting catalogd"
    );
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("catalogd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
