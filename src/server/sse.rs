//! Server-sent events framing for slide streams.
//!
//! Wire format, matching what the bundled frontends consume:
//!
//! ```text
//! data: {"type":"title","title":...}
//!
//! event: done
//! data: [DONE]
//!
//! event: error
//! data: {"error":"Generation failed","detail":...}
//! ```
//!
//! The `done` event closes a successful stream; an `error` event closes a
//! failed one, with no `done` after it.

use std::convert::Infallible;

use axum::http::{HeaderName, HeaderValue, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::stream::SlideStream;

pub(super) fn slide_sse_response(slides: SlideStream) -> Response {
    let events = async_stream::stream! {
        let mut slides = slides;
        while let Some(item) = slides.next().await {
            match item {
                Ok(slide) => match serde_json::to_string(&slide) {
                    Ok(json) => yield Ok::<_, Infallible>(Event::default().data(json)),
                    Err(err) => {
                        yield Ok(error_event(&err.to_string()));
                        return;
                    }
                },
                Err(err) => {
                    yield Ok(error_event(&err.to_string()));
                    return;
                }
            }
        }
        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    let headers = [
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        ),
    ];

    (
        headers,
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn error_event(detail: &str) -> Event {
    let payload = serde_json::json!({
        "error": "Generation failed",
        "detail": detail,
    });
    Event::default().event("error").data(payload.to_string())
}
