// Library crate for the buzzer game server
// This file exposes the public API for integration tests

pub mod buzz;
pub mod config;
pub mod connection;
pub mod room;
pub mod shared;
pub mod websockets;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use connection::{ConnectionRegistry, InMemoryConnectionRegistry, Role};
pub use room::{models::RoomModel, repository::RoomRepository};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, EventRouter, MessageHandler, MessageType, WebSocketMessage,
};

/// Builds the HTTP router with the room status routes and the WebSocket endpoint
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Buzzer server is running" }))
        .route("/rooms", get(room::list_rooms))
        .route("/rooms/:room_id", get(room::get_room))
        .route("/ws", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
