//! Uniform response envelope shared by every route.
//!
//! All responses, success or failure, serialize as
//! `{ success, message?, data?, error? }` alongside the HTTP status.

use axum::{http::StatusCode, response::Response, Json};
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn error(error: String) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error),
        }
    }
}

/// 200 OK with a data payload and no message.
pub fn ok(data: Value) -> Response {
    with_status(StatusCode::OK, "", Some(data))
}

/// 200 OK with a message, optionally carrying data.
pub fn message(message: &str, data: Option<Value>) -> Response {
    with_status(StatusCode::OK, message, data)
}

/// 201 Created with a message and the created entity.
pub fn created(message: &str, data: Value) -> Response {
    with_status(StatusCode::CREATED, message, Some(data))
}

pub fn with_status(status: StatusCode, message: &str, data: Option<Value>) -> Response {
    let body = Envelope {
        success: true,
        message: if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        },
        data,
        error: None,
    };
    (status, Json(body)).into_response()
}
