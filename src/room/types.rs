use serde::{Deserialize, Serialize};

use super::models::{RoomModel, RoundState};

/// Public view of a room for the status endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub has_admin: bool,
    pub member_count: usize,
    pub state: RoundState,
    pub eliminated_count: usize,
}

impl From<&RoomModel> for RoomResponse {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            has_admin: room.admin_connection.is_some(),
            member_count: room.get_member_count(),
            state: room.round_state(),
            eliminated_count: room.eliminated.len(),
        }
    }
}
