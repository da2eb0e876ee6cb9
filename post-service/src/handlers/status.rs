use axum::{response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub const STATUS_MESSAGE: &str = "LinkGate API is running!!";

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": STATUS_MESSAGE }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
