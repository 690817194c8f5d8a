use folio_core::links::LinkResolver;
use folio_events::search::build_search_index;
use folio_events::{EmailConfig, EmailDelivery, SearchConfig, TaskContext, TaskRunner, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_worker=debug,folio_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        site_address = %config.site_address,
        "Loaded worker configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = folio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    folio_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Collaborators ---
    let resolver =
        LinkResolver::new(&config.site_address).expect("SITE_ADDRESS must form a valid pattern");
    let search = build_search_index(SearchConfig::from_env())
        .expect("Failed to build search index client");
    let email = EmailConfig::from_env().map(EmailDelivery::new);
    if email.is_none() {
        tracing::warn!("SMTP_HOST not set, update digests will not be sent");
    }

    let runner = TaskRunner::new(TaskContext {
        pool,
        search,
        email,
        resolver,
        config,
    });
    if let Err(e) = runner.seed_recurring_tasks().await {
        tracing::error!(error = %e, "Failed to seed recurring tasks");
    }

    // --- Run until signalled ---
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    runner.run(cancel).await;
    tracing::info!("Worker shut down");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, stopping task runner"),
        () = terminate => tracing::info!("Received SIGTERM, stopping task runner"),
    }
}
