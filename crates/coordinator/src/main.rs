use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use innofund_common::config::{load_from_file, Config};
use innofund_coordinator::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_from_file(&path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading config from {path}"))?,
        None => Config::default(),
    };
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState::from_config(config).context("wiring backend state")?);

    // the pending queue must drain even if every client goes away
    tokio::spawn(state.reconciler.clone().run_retry_loop());

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "coordinator listening");
    axum::serve(listener, app).await?;
    Ok(())
}
