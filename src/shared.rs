use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConfigError;
use crate::connection::{ConnectionRegistry, InMemoryConnectionRegistry};
use crate::room::repository::{InMemoryRoomRepository, RoomRepository, RoomStoreError};
use crate::websockets::{ConnectionManager, EventRouter, InMemoryConnectionManager};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub router: Arc<EventRouter>,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let router = Arc::new(EventRouter::new(
            Arc::clone(&room_repository),
            Arc::clone(&registry),
            Arc::clone(&connection_manager),
        ));

        Self {
            room_repository,
            registry,
            connection_manager,
            router,
        }
    }

    /// Process-lifetime state with every store held in memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryConnectionRegistry::new()),
            Arc::new(InMemoryConnectionManager::new()),
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Room store error: {0}")]
    Store(#[from] RoomStoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Room store error: {}", e),
            ),
            AppError::Config(_) | AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
