use clap::Parser;
use ip_pool_monitor::db;
use ip_pool_monitor::monitor::{Monitor, SeaOrmRegistry};
use ip_pool_monitor::server::config::ServerConfig;
use ip_pool_monitor::version::VERSION;
use ip_pool_monitor::web::create_axum_router;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "monitor.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting IP pool monitor, version: {}", VERSION);

    // --- Database Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.clone());
    opt.max_connections(10);
    let db_conn = Database::connect(opt).await?;
    db::initialize_schema(&db_conn).await?;

    // --- Monitor Setup ---
    let registry = Arc::new(SeaOrmRegistry::new(db_conn));
    let prober = server_config.build_prober();
    info!(backend = ?server_config.probe_backend, "Probe backend selected.");
    let monitor = Arc::new(
        Monitor::start(registry, prober, server_config.monitor_settings()).await?,
    );

    // --- HTTP Server ---
    let app = create_axum_router(monitor.clone());
    let listener = tokio::net::TcpListener::bind(&server_config.listen_address).await?;
    info!("HTTP server listening on {}", server_config.listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown().await;
    info!("IP pool monitor stopped.");
    Ok(())
}
