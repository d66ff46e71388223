//! Serve command implementation - line-delimited JSON over stdio
//!
//! Each stdin line is either a protocol request, answered with one JSON
//! line on stdout, or a file event that schedules a rebuild:
//!
//! ```json
//! {"command": "getUpstream", "nodeId": "view:daily_orders"}
//! {"event": "changed", "path": "models/orders.sql"}
//! ```

use anyhow::{Context, Result};
use lg_analysis::{AnalysisError, LineageService, Response};
use lg_core::{Config, FileChange, FileEvent, RebuildScheduler, SnapshotStore};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::cli::{GlobalArgs, ServeArgs};
use crate::commands::common::open_workspace;

/// Pending file events before the reader waits on the scheduler
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
struct EventLine {
    event: FileChange,
    path: PathBuf,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = open_workspace(global)?;
    let builder = workspace.load().context("Failed to index workspace")?;
    let graph = builder.build();
    for diagnostic in graph.diagnostics() {
        log::warn!("{}", diagnostic);
    }

    let config = workspace.config.clone();
    let store = Arc::new(SnapshotStore::new(graph));
    let mut scheduler = RebuildScheduler::new(workspace, builder, Arc::clone(&store));
    if let Some(ms) = args.debounce_ms {
        scheduler = scheduler.with_debounce(Duration::from_millis(ms));
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let rebuilds = tokio::spawn(scheduler.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    log::info!("Serving lineage requests on stdin");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, shutting down");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        if let Some(response) = handle_line(&line, &store, &config, &tx).await {
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    drop(tx);
    rebuilds.await.context("Rebuild task panicked")?;
    Ok(())
}

/// Handle one input line; returns the response line for requests.
///
/// Requests are answered against the snapshot published at the time the
/// line is read. Blank lines and forwarded events produce no output.
pub(crate) async fn handle_line(
    line: &str,
    store: &SnapshotStore,
    config: &Config,
    events: &mpsc::Sender<FileEvent>,
) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match parse_event(line) {
        Some(Ok(event)) => {
            log::debug!("File {:?}: {}", event.change, event.path.display());
            if events.send(event).await.is_err() {
                log::warn!("Rebuild scheduler stopped; event dropped");
            }
            return None;
        }
        Some(Err(err)) => {
            let response = Response::from(err);
            return serde_json::to_string(&response).ok();
        }
        None => {}
    }

    let snapshot = store.current();
    Some(LineageService::new(&snapshot, config).handle_json(line))
}

/// `None` when the line is not an event at all
fn parse_event(line: &str) -> Option<Result<FileEvent, AnalysisError>> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("event")?;
    let parsed = serde_json::from_value::<EventLine>(value)
        .map(|e| FileEvent {
            path: e.path,
            change: e.event,
        })
        .map_err(|e| AnalysisError::InvalidRequest {
            message: format!("malformed file event: {e}"),
        });
    Some(parsed)
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod tests;
