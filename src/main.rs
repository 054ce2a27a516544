use std::env;
use std::sync::Arc;

use taskdeck::memory::{MemoryAccountStore, MemorySessionStore, MemoryTaskStore};
use taskdeck::middleware::{AppState, PasswordHasher, TaskdeckConfig};
use taskdeck::password::BcryptHasher;
use taskdeck::{seed, web};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskdeck=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let config = TaskdeckConfig::from_env().map_err(|e| e.to_string())?;
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let accounts = Arc::new(MemoryAccountStore::default());
    let tasks = Arc::new(MemoryTaskStore::default());
    let sessions = Arc::new(MemorySessionStore::default());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::default());

    let today = OffsetDateTime::now_utc().date();
    seed::seed_demo_account(&*accounts, &*tasks, &*hasher, today)
        .await
        .map_err(|e| format!("seeding failed: {e}"))?;

    let state = AppState::new(config, accounts, tasks, sessions, hasher);
    let app = web::router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("taskdeck listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
