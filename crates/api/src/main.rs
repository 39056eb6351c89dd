//! Gateway entry point: broker, workers and HTTP server in one process.

use api::Config;
use api::config::DATABASE_RETRY_DELAY;
use broker::InMemoryBroker;
use sqlx::PgPool;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workers::{InMemoryStockLedger, PostgresStockLedger};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Connects to Postgres, retrying a fixed number of times.
async fn connect_with_retry(url: &str, attempts: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match PgPool::connect(url).await {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, error = %e, "database not ready, retrying");
                attempt += 1;
                tokio::time::sleep(DATABASE_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Start the broker and the workers behind it
    let broker = InMemoryBroker::new();
    let backend = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url, config.database_connect_attempts)
                .await
                .expect("failed to connect to database");
            let ledger = PostgresStockLedger::new(pool);
            ledger
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using postgres stock ledger");
            api::start_workers(broker.clone(), ledger).await
        }
        None => {
            tracing::info!("DATABASE_URL not set, using seeded in-memory stock ledger");
            api::start_workers(broker.clone(), InMemoryStockLedger::seeded()).await
        }
    }
    .expect("failed to start workers");

    // 4. Build the application
    let addr = config.addr();
    let state = api::create_default_state(broker, config);
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    tracing::info!(%addr, "starting order gateway");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    backend.abort();
    tracing::info!("server shut down gracefully");
}
