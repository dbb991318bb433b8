use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::models::RoomModel;
use crate::buzz::{engine, BuzzOutcome, RelaunchOutcome, ResetOutcome};

/// Attempts at generating a pet name ID before falling back to a UUID suffix
const MAX_ID_ATTEMPTS: usize = 32;

#[derive(Debug, Error)]
pub enum RoomStoreError {
    #[error("Room store lock poisoned")]
    LockPoisoned,
}

/// Result of adding a member or assigning an admin
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Successfully joined the room, returns updated room data
    Success(RoomModel),
    /// Room does not exist
    RoomNotFound,
}

/// Result of removing a member or clearing the admin
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    /// Room still exists, returns updated room data
    Success(RoomModel),
    /// Room was deleted because nobody is left
    RoomDeleted,
    /// Room does not exist
    RoomNotFound,
}

/// Result of a buzz arbitration operation on a room
#[derive(Debug, Clone)]
pub enum ArbitrationResult<T> {
    /// The operation ran against the room; `room` is the state afterwards
    Applied { room: RoomModel, outcome: T },
    /// Room does not exist
    RoomNotFound,
}

/// Trait for room store operations
///
/// Every method is atomic with respect to every other method on the same store.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Creates a room with a fresh, collision-free ID and `admin_connection` as admin
    async fn create_room(&self, admin_connection: &str) -> Result<RoomModel, RoomStoreError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomStoreError>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomStoreError>;
    async fn room_count(&self) -> Result<usize, RoomStoreError>;

    /// Inserts or overwrites a member entry
    async fn add_member(
        &self,
        room_id: &str,
        connection_id: &str,
        user_name: &str,
    ) -> Result<JoinRoomResult, RoomStoreError>;

    /// Removes a member, deleting the room if it is left empty
    async fn remove_member(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<LeaveRoomResult, RoomStoreError>;

    /// Assigns or reassigns the admin role
    async fn set_admin(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<JoinRoomResult, RoomStoreError>;

    /// Unsets the admin only if `connection_id` holds it, deleting the room if it is left empty
    async fn clear_admin_if_matches(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<LeaveRoomResult, RoomStoreError>;

    /// Unconditional removal, returns whether a room was removed
    async fn delete_room(&self, room_id: &str) -> Result<bool, RoomStoreError>;

    async fn try_buzz(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<ArbitrationResult<BuzzOutcome>, RoomStoreError>;

    async fn relaunch(
        &self,
        room_id: &str,
    ) -> Result<ArbitrationResult<RelaunchOutcome>, RoomStoreError>;

    async fn reset(&self, room_id: &str) -> Result<ArbitrationResult<ResetOutcome>, RoomStoreError>;
}

/// In-memory implementation of RoomRepository
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, RoomModel>>, RoomStoreError> {
        self.rooms.lock().map_err(|_| RoomStoreError::LockPoisoned)
    }

    fn unused_id(rooms: &HashMap<String, RoomModel>) -> String {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = RoomModel::generate_id();
            if !rooms.contains_key(&candidate) {
                return candidate;
            }
        }

        warn!("Pet name space exhausted, falling back to UUID room ID");
        loop {
            let candidate = format!("{}-{}", RoomModel::generate_id(), Uuid::new_v4());
            if !rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Drops the room if it no longer has a member or an admin
    fn leave_result(rooms: &mut HashMap<String, RoomModel>, room_id: &str) -> LeaveRoomResult {
        match rooms.get(room_id) {
            Some(room) if room.is_empty() => {
                rooms.remove(room_id);
                info!(room_id = %room_id, "Room is now empty, deleting");
                LeaveRoomResult::RoomDeleted
            }
            Some(room) => LeaveRoomResult::Success(room.clone()),
            None => LeaveRoomResult::RoomNotFound,
        }
    }

    fn arbitrate<T>(
        &self,
        room_id: &str,
        op: impl FnOnce(&mut RoomModel) -> T,
    ) -> Result<ArbitrationResult<T>, RoomStoreError> {
        let mut rooms = self.lock()?;
        let Some(room) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Arbitration against missing room");
            return Ok(ArbitrationResult::RoomNotFound);
        };

        let outcome = op(room);
        Ok(ArbitrationResult::Applied {
            room: room.clone(),
            outcome,
        })
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn create_room(&self, admin_connection: &str) -> Result<RoomModel, RoomStoreError> {
        let mut rooms = self.lock()?;
        let room_id = Self::unused_id(&rooms);
        let room = RoomModel::new(room_id.clone(), admin_connection.to_string());
        rooms.insert(room_id.clone(), room.clone());

        info!(room_id = %room_id, admin = %admin_connection, "Room created in memory");
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomStoreError> {
        let rooms = self.lock()?;
        let room = rooms.get(room_id).cloned();

        if room.is_none() {
            debug!(room_id = %room_id, "Room not found in memory");
        }

        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomStoreError> {
        let rooms = self.lock()?;
        Ok(rooms.values().cloned().collect())
    }

    async fn room_count(&self) -> Result<usize, RoomStoreError> {
        Ok(self.lock()?.len())
    }

    #[instrument(skip(self))]
    async fn add_member(
        &self,
        room_id: &str,
        connection_id: &str,
        user_name: &str,
    ) -> Result<JoinRoomResult, RoomStoreError> {
        let mut rooms = self.lock()?;
        let Some(room) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(JoinRoomResult::RoomNotFound);
        };

        room.members
            .insert(connection_id.to_string(), user_name.to_string());

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            user_name = %user_name,
            member_count = room.get_member_count(),
            "Member added to room"
        );

        Ok(JoinRoomResult::Success(room.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_member(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<LeaveRoomResult, RoomStoreError> {
        let mut rooms = self.lock()?;
        let Some(room) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(LeaveRoomResult::RoomNotFound);
        };

        if room.members.remove(connection_id).is_some() {
            info!(
                room_id = %room_id,
                connection_id = %connection_id,
                member_count = room.get_member_count(),
                "Member removed from room"
            );
        }

        Ok(Self::leave_result(&mut rooms, room_id))
    }

    #[instrument(skip(self))]
    async fn set_admin(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<JoinRoomResult, RoomStoreError> {
        let mut rooms = self.lock()?;
        let Some(room) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(JoinRoomResult::RoomNotFound);
        };

        let previous = room.admin_connection.replace(connection_id.to_string());
        info!(
            room_id = %room_id,
            admin = %connection_id,
            previous_admin = ?previous,
            "Room admin assigned"
        );

        Ok(JoinRoomResult::Success(room.clone()))
    }

    #[instrument(skip(self))]
    async fn clear_admin_if_matches(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<LeaveRoomResult, RoomStoreError> {
        let mut rooms = self.lock()?;
        let Some(room) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(LeaveRoomResult::RoomNotFound);
        };

        if room.is_admin(connection_id) {
            room.admin_connection = None;
            info!(room_id = %room_id, connection_id = %connection_id, "Room admin cleared");
        } else {
            debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Connection is not the current admin, keeping admin"
            );
        }

        Ok(Self::leave_result(&mut rooms, room_id))
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: &str) -> Result<bool, RoomStoreError> {
        let removed = self.lock()?.remove(room_id).is_some();
        if removed {
            info!(room_id = %room_id, "Room deleted");
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn try_buzz(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<ArbitrationResult<BuzzOutcome>, RoomStoreError> {
        self.arbitrate(room_id, |room| engine::buzz(room, connection_id))
    }

    #[instrument(skip(self))]
    async fn relaunch(
        &self,
        room_id: &str,
    ) -> Result<ArbitrationResult<RelaunchOutcome>, RoomStoreError> {
        self.arbitrate(room_id, engine::relaunch)
    }

    #[instrument(skip(self))]
    async fn reset(&self, room_id: &str) -> Result<ArbitrationResult<ResetOutcome>, RoomStoreError> {
        self.arbitrate(room_id, engine::reset)
    }
}
