//! # Feed Cursor
//!
//! Opaque keyset cursors for the social feed. A cursor names the last post a
//! client has seen by `(created_at, id)`; the next page starts strictly after
//! it in newest-first order.

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

const MAX_CURSOR_LEN: usize = 512;
const MAX_DECODED_LEN: usize = 256;

/// Position in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl FeedCursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }
}

/// Encode a cursor as an opaque, URL-safe string
pub fn encode_cursor(cursor: &FeedCursor) -> String {
    let json = serde_json::json!({
        "created_at": cursor.created_at,
        "id": cursor.id,
    });
    URL_SAFE_NO_PAD.encode(json.to_string().as_bytes())
}

fn invalid(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
}

/// Decode a cursor produced by [`encode_cursor`]
pub fn decode_cursor(cursor: &str) -> Result<FeedCursor, ApiError> {
    if cursor.is_empty() {
        return Err(invalid("cursor cannot be empty"));
    }

    if cursor.len() > MAX_CURSOR_LEN {
        return Err(invalid("cursor is too long"));
    }

    if !cursor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("cursor contains invalid characters"));
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| invalid("cursor is not valid base64"))?;

    if decoded.len() > MAX_DECODED_LEN {
        return Err(invalid("decoded cursor is too large"));
    }

    let json =
        String::from_utf8(decoded).map_err(|_| invalid("cursor contains invalid UTF-8 data"))?;

    let cursor: FeedCursor =
        serde_json::from_str(&json).map_err(|_| invalid("cursor contains invalid JSON structure"))?;

    if cursor.id.is_nil() {
        return Err(invalid("cursor contains invalid ID"));
    }

    Ok(cursor)
}
