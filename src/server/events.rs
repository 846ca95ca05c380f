//! Server-sent event stream for one analysis run
//!
//! Bridges the orchestrator's notification channel to the HTTP response.

use crate::analysis::AnalysisEvent;
use axum::{
    http::{header::CACHE_CONTROL, HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures_util::StreamExt;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Notifications buffered between the pipeline and a slow client
pub const EVENT_BUFFER: usize = 32;

/// Convert a pipeline notification to its SSE frame
pub fn to_sse_event(event: &AnalysisEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(event.payload().to_string())
}

/// Stream every notification from `rx` until the pipeline drops its sender
pub fn sse_response(rx: mpsc::Receiver<AnalysisEvent>) -> Response {
    let stream = ReceiverStream::new(rx).map(|event| {
        if event.is_terminal() {
            log::debug!("Streaming final '{}' notification", event.name());
        } else {
            log::trace!("Streaming '{}' notification", event.name());
        }
        Ok::<Event, Infallible>(to_sse_event(&event))
    });

    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response();

    // Keep proxies from buffering the stream
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}
