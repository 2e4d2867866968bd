use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub type AppSuccess = GenericResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl GenericResponse {
    pub fn new(status: StatusCode, message: &str, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

impl IntoResponse for GenericResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json::from(self)).into_response()
    }
}
