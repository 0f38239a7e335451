//! Server-Sent Events support

use crate::runtime::{RunSnapshot, SseEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
///
/// The receiver must be subscribed before `snapshot` is taken. A step that
/// lands in between is already part of the snapshot, so its broadcast copy
/// is dropped; every step reaches the client exactly once.
pub fn sse_stream(
    snapshot: RunSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let seen_run = snapshot.run_id.clone();
    let seen_steps = snapshot.steps.len();

    // Init first so a late subscriber sees steps already produced
    let init = futures::stream::once(async move {
        Ok(sse_event_to_axum(SseEvent::Init { snapshot }))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(SseEvent::Step { ref run_id, index, .. })
            if seen_run.as_deref() == Some(run_id.as_str()) && index < seen_steps =>
        {
            None
        }
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(e) => {
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "snapshot": snapshot
            }),
        ),
        SseEvent::RunStarted { run_id, query } => (
            "run_started",
            json!({
                "type": "run_started",
                "run_id": run_id,
                "query": query
            }),
        ),
        SseEvent::StateChange { run_id, state } => (
            "state_change",
            json!({
                "type": "state_change",
                "run_id": run_id,
                "state": state
            }),
        ),
        SseEvent::Step {
            run_id,
            index,
            step,
        } => (
            "step",
            json!({
                "type": "step",
                "run_id": run_id,
                "index": index,
                "step": step
            }),
        ),
        SseEvent::Error { run_id, message } => (
            "error",
            json!({
                "type": "error",
                "run_id": run_id,
                "message": message
            }),
        ),
        SseEvent::RunDone {
            run_id,
            state,
            steps,
        } => (
            "run_done",
            json!({
                "type": "run_done",
                "run_id": run_id,
                "state": state,
                "steps": steps
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
