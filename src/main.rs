//! Ledger Bot - chat-driven income and expense recording
//!
//! A Rust backend implementing a per-user dialogue state machine that
//! walks users through recording a transaction with buttons and text.

mod api;
mod callback;
mod catalog;
mod config;
mod db;
mod presenter;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::{BotConfig, SessionBackend};
use db::Database;
use presenter::BroadcastPresenter;
use runtime::{
    DatabaseStorage, Dispatcher, InMemorySessionStore, ProductionDispatcher, SessionStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Outbound messages buffered per stream before a slow reader starts lagging
const OUTBOUND_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_bot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration; a bad value or catalog is fatal
    let config = BotConfig::from_env()?;
    let catalog = Arc::new(config.catalog()?);
    tracing::info!(
        income = catalog.labels(state_machine::OperationType::Income).len(),
        expense = catalog.labels(state_machine::OperationType::Expense).len(),
        "Category catalog loaded"
    );

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    let storage = DatabaseStorage::new(db);

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::Sqlite => Arc::new(storage.clone()),
    };
    tracing::info!(backend = ?config.session_backend, "Session store ready");

    let dispatcher: ProductionDispatcher = Dispatcher::new(
        catalog,
        sessions,
        BroadcastPresenter::new(OUTBOUND_CAPACITY),
        storage,
    )
    .with_retry_policy(config.retry_policy());

    let app = create_router(AppState::new(dispatcher)).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Ledger bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
