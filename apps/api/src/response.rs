//! # Response Envelope
//!
//! Every endpoint answers with the same JSON shape:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Items retrieved successfully",
//!   "data": { ... },
//!   "pagination": { "currentPage": 1, "totalPages": 3, ... }
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use restyle_core::{PageInfo, Paged};

/// The uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

impl<T: Serialize> Envelope<T> {
    fn new(success: bool, message: impl Into<String>) -> Self {
        Envelope {
            success,
            message: message.into(),
            data: None,
            errors: None,
            pagination: None,
        }
    }

    /// A failure envelope (no data).
    pub fn failure(message: impl Into<String>) -> Envelope<T> {
        Envelope::new(false, message)
    }
}

/// 200 with data.
pub fn success<T: Serialize>(message: &str, data: T) -> Response {
    let mut envelope = Envelope::new(true, message);
    envelope.data = Some(data);
    (StatusCode::OK, Json(envelope)).into_response()
}

/// 201 with data.
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    let mut envelope = Envelope::new(true, message);
    envelope.data = Some(data);
    (StatusCode::CREATED, Json(envelope)).into_response()
}

/// 200 without data.
pub fn success_empty(message: &str) -> Response {
    (StatusCode::OK, Json(Envelope::<()>::new(true, message))).into_response()
}

/// 200 with a page of rows and pagination metadata.
pub fn paginated<T: Serialize>(message: &str, page: Paged<T>) -> Response {
    let mut envelope = Envelope::new(true, message);
    envelope.data = Some(page.rows);
    envelope.pagination = Some(page.pagination);
    (StatusCode::OK, Json(envelope)).into_response()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let mut envelope = Envelope::new(true, "ok");
        envelope.data = Some(vec![1, 2, 3]);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        // Unset fields are omitted entirely
        assert!(json.get("errors").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_failure_envelope() {
        let envelope = Envelope::<()>::failure("broken");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }
}
