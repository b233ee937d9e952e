use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kirim_admin::build_admin_router;
use kirim_store::ServerStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kirim-admin", about = "Admin API for gateway server records")]
struct AdminArgs {
    /// Listen address for the admin API.
    #[arg(long, env = "KIRIM_ADMIN_BIND", default_value = "127.0.0.1:8787")]
    bind: String,

    /// Path to the SQLite database file.
    #[arg(long, env = "KIRIM_ADMIN_DB", default_value = "kirim.db")]
    db_path: PathBuf,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = AdminArgs::parse();

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("invalid --bind '{}': expected host:port", args.bind))?;
    let store = Arc::new(
        ServerStore::new(&args.db_path)
            .with_context(|| format!("failed to open store at '{}'", args.db_path.display()))?,
    );

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind admin api on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve admin api listen address")?;
    info!(addr = %local_addr, db = %args.db_path.display(), "admin api listening");

    let app = build_admin_router(store);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("admin api server exited unexpectedly")?;
    Ok(())
}
