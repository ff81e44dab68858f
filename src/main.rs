use anyhow::Context;
use rusty_library_api::{
    adapters::{
        memory,
        mock::NotificationGateway as MockNotificationGateway,
        postgres::{PostgresBookRepository, PostgresLoanRepository},
        smtp::SmtpNotificationGateway,
    },
    api::{handlers::AppState, router::create_router},
    application::{
        catalog::CatalogDependencies,
        loan::{ServiceDependencies, spawn_overdue_sweep},
    },
    config::{AppConfig, StorageBackend},
    ports::{BookRepository, LoanRepository, NotificationGateway},
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "rusty_library_api={},tower_http=debug",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting library API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize stores
    let (book_repository, loan_repository): (Arc<dyn BookRepository>, Arc<dyn LoanRepository>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect(&config.database.url)
                    .await
                    .context("Failed to connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;

                tracing::info!("Connected to database");
                let books: Arc<dyn BookRepository> =
                    Arc::new(PostgresBookRepository::new(pool.clone()));
                let loans: Arc<dyn LoanRepository> = Arc::new(PostgresLoanRepository::new(pool));
                (books, loans)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                let (books, loans) = memory::repositories();
                let books: Arc<dyn BookRepository> = books;
                let loans: Arc<dyn LoanRepository> = loans;
                (books, loans)
            }
        };

    // Initialize notification gateway
    let notification_gateway: Arc<dyn NotificationGateway> = if config.smtp.enabled {
        Arc::new(SmtpNotificationGateway::new(
            config.smtp.clone(),
            config.overdue.message.clone(),
        ))
    } else {
        tracing::info!("SMTP disabled; overdue notifications are only logged");
        Arc::new(MockNotificationGateway::new())
    };

    let catalog = CatalogDependencies {
        book_repository: book_repository.clone(),
    };
    let loans = ServiceDependencies {
        book_repository,
        loan_repository,
        notification_gateway,
    };

    // Start overdue sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = spawn_overdue_sweep(loans.clone(), config.overdue.sweep_settings(), shutdown_rx);

    // Create router
    let app = create_router(Arc::new(AppState { catalog, loans }));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    shutdown_tx.send(true).ok();
    sweep.await.ok();

    Ok(())
}
