mod assembly;
mod auth;
mod config;
mod database;
mod entities;
mod error;
mod router;
mod routes;
mod storage;
mod util;

use axum_login::tower_sessions::ExpiredDeletion;
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, storage::FileStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (db, pool) = database::setup_database(&config.database_url).await?;
    if let Some(admin) = &config.bootstrap_admin {
        database::seed_admin(&db, admin).await?;
    }

    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let storage = FileStorage::init(&config.storage_dir).await?;
    let bind_addr = config.bind_addr.clone();
    let app = router::create_router(db, config, storage, session_store);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(router::shutdown_signal(deletion_task.abort_handle()))
        .await?;

    // The task is aborted on shutdown; a cancelled join is expected.
    match deletion_task.await {
        Ok(result) => result?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
