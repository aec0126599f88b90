use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{event_line, internal_error, request_id, Bridge};
use crate::events::CoreEvent;

/// Answers one request per input line until the input closes, then waits
/// for in-flight requests and their events to be written before returning.
///
/// `events` must be fed only by the bridge's own sink: the forwarder stops
/// once the bridge is dropped and its sender with it.
pub async fn serve<R, W>(bridge: Bridge, events: UnboundedReceiver<CoreEvent>, input: R, output: W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    // every output line goes through one writer so lines never interleave
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_lines(output, out_rx));
    let forwarder = tokio::spawn(forward_events(events, out_tx.clone()));

    let bridge = Arc::new(bridge);
    let mut in_flight = JoinSet::new();
    let mut lines = input.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                warn!("input read failed: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let bridge = bridge.clone();
        let out = out_tx.clone();

        in_flight.spawn(async move {
            let id = request_id(&line);
            // nested task so a panicking handler still gets an answer
            let handled = tokio::spawn(async move { bridge.handle(&line).await }).await;

            let response = match handled {
                Ok(resp) => resp,
                Err(_) => internal_error(id),
            };

            let _ = out.send(response);
        });

        while in_flight.try_join_next().is_some() {}
    }

    info!("input closed; waiting for {} in-flight requests", in_flight.len());
    while in_flight.join_next().await.is_some() {}

    drop(bridge);
    if forwarder.await.is_err() {
        warn!("event forwarder stopped abnormally");
    }

    drop(out_tx);
    if writer.await.is_err() {
        warn!("output writer stopped abnormally");
    }
    debug!("all responses flushed");
}

async fn write_lines<W>(mut output: W, mut lines: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        if output.write_all(line.as_bytes()).await.is_err() || output.write_all(b"\n").await.is_err() {
            break;
        }
        let _ = output.flush().await;
    }
    let _ = output.shutdown().await;
}

async fn forward_events(mut events: UnboundedReceiver<CoreEvent>, out: mpsc::UnboundedSender<String>) {
    while let Some(event) = events.recv().await {
        if out.send(event_line(&event)).is_err() {
            break;
        }
    }
}
