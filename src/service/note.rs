//! Note ingestion handler.
//!
//! `POST /note/{system}/{subsystem}?title=...` stores the request body as a
//! `notes` point tagged with the path segments.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ApiError;
use crate::now_nanos;
use crate::server::ServerState;
use crate::storage::{FieldValue, Point};

/// Measurement notes are written to.
pub const NOTES_MEASUREMENT: &str = "notes";

#[derive(Debug, Default, Deserialize)]
pub struct NoteParams {
    #[serde(default)]
    pub title: String,
}

/// Build the point for one note.
pub fn note_point(
    system: String,
    subsystem: String,
    title: String,
    text: String,
    timestamp_ns: i64,
) -> Result<Point, ApiError> {
    let tags = BTreeMap::from([
        ("system".to_string(), system),
        ("subsystem".to_string(), subsystem),
    ]);
    let fields = BTreeMap::from([
        ("title".to_string(), FieldValue::String(title)),
        ("text".to_string(), FieldValue::String(text)),
    ]);
    Ok(Point::new(NOTES_MEASUREMENT, tags, fields, timestamp_ns)?)
}

/// Handle POST /note/{system}/{subsystem}.
#[tracing::instrument(skip(state, params, body))]
pub async fn handle_post_note(
    State(state): State<Arc<ServerState>>,
    Path((system, subsystem)): Path<(String, String)>,
    Query(params): Query<NoteParams>,
    body: String,
) -> Result<&'static str, ApiError> {
    let point = note_point(system, subsystem, params.title, body, now_nanos())?;
    state.store.add_point(point).await.map_err(ApiError::Write)?;
    Ok("OK")
}
