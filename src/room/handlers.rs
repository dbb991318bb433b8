use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::RoomResponse;
use crate::shared::{AppError, AppState};

/// HTTP handler for looking up a room
///
/// GET /rooms/:room_id
/// Lets clients check a room code before opening a WebSocket
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_repository
        .get_room(&room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    info!(
        room_id = %room.id,
        member_count = room.get_member_count(),
        "Room looked up"
    );

    Ok(Json(RoomResponse::from(&room)))
}

/// HTTP handler for listing open rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let mut rooms: Vec<RoomResponse> = state
        .room_repository
        .list_rooms()
        .await?
        .iter()
        .map(RoomResponse::from)
        .collect();
    rooms.sort_by(|a, b| a.id.cmp(&b.id));

    info!(room_count = rooms.len(), "Rooms listed");

    Ok(Json(rooms))
}
