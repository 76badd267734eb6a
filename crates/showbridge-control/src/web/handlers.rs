//! HTTP request handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use showbridge_core::RuntimeState;

use super::server::AppState;
use crate::hub::HubPhase;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Bridge status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub phase: HubPhase,
    pub clients: usize,
    pub executors: usize,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

fn unavailable<T>(e: impl std::fmt::Display) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error(e.to_string())),
    )
}

/// GET /api/status - Hub phase and counters
pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let status = state.hub.status().await.map_err(unavailable)?;
    Ok(Json(ApiResponse::success(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        phase: status.phase,
        clients: status.clients,
        executors: status.executors,
    })))
}

/// GET /api/executors - Executor runtime state
pub async fn get_executors(State(state): State<AppState>) -> ApiResult<RuntimeState> {
    let executors = state.hub.executors().await.map_err(unavailable)?;
    Ok(Json(ApiResponse::success(executors)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("Hub stopped".to_string());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("Hub stopped".to_string()));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_status_serialization() {
        let response = ApiResponse::success(StatusResponse {
            version: "0.2.0".to_string(),
            uptime_seconds: 12,
            phase: HubPhase::ShuttingDown,
            clients: 2,
            executors: 40,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["phase"], "shutting-down");
        assert_eq!(json["data"]["clients"], 2);
    }
}
