#![windows_subsystem = "windows"]
use std::sync::Arc;

use lexicon_core::config::CoreConfig;
use lexicon_core::events::CoreEvent;
use lexicon_core::logging;
use lexicon_core::protocol::{self, Bridge};
use tokio::io::{self, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match CoreConfig::load(&CoreConfig::default_path()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[lexicon] {e}; falling back to defaults");
            CoreConfig::default()
        }
    };

    logging::init(&config.logging);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<CoreEvent>();

    let bridge = match Bridge::start(&config, Arc::new(event_tx)).await {
        Ok(b) => b,
        Err(e) => {
            error!("failed to start: {e}");
            let line = serde_json::json!({ "id": null, "status": "error", "message": e.to_string() }).to_string();
            let mut stdout = io::stdout();
            let _ = stdout.write_all(format!("{line}\n").as_bytes()).await;
            let _ = stdout.flush().await;
            std::process::exit(1);
        }
    };

    info!("lexicon-core ready (store: {})", config.store_path.display());

    protocol::serve(bridge, event_rx, BufReader::new(io::stdin()), io::stdout()).await;

    info!("stdin closed, shutting down");
}
