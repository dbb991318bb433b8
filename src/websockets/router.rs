use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    buzz::{BuzzOutcome, RelaunchOutcome},
    connection::{Binding, ConnectionRegistry, Role},
    room::repository::{
        ArbitrationResult, JoinRoomResult, LeaveRoomResult, RoomRepository, RoomStoreError,
    },
};

use super::{
    broadcast::MessageBroadcaster,
    connection_manager::ConnectionManager,
    messages::{
        ClientCommand, JoinRoomPayload, LeaveRoomPayload, MessageError, MessageType,
        WebSocketMessage,
    },
    socket::MessageHandler,
};

const ROOM_NOT_FOUND: &str = "Room not found";

/// Errors that end the processing of a single command
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Room store error: {0}")]
    Store(#[from] RoomStoreError),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a connection is leaving its room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Departure {
    /// Explicit LEAVE_ROOM, or switching to another room
    Leave,
    /// Socket closed
    Disconnect,
}

/// Dispatches client commands to the room store and buzz arbitration, and
/// decides which connections hear about the result.
///
/// Commands and disconnects are processed one at a time, so the mutation and
/// the notifications of one command complete before the next command starts.
pub struct EventRouter {
    room_repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    connection_manager: Arc<dyn ConnectionManager>,
    gate: Mutex<()>,
}

impl EventRouter {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            room_repository,
            registry,
            connection_manager,
            gate: Mutex::new(()),
        }
    }

    /// Processes one decoded command from `connection_id`
    pub async fn handle_command(
        &self,
        connection_id: &str,
        request_id: Option<u64>,
        command: ClientCommand,
    ) {
        let _guard = self.gate.lock().await;

        let result = match command {
            ClientCommand::CreateRoom => self.create_room(connection_id, request_id).await,
            ClientCommand::JoinRoom(payload) => {
                self.join_room(connection_id, request_id, payload).await
            }
            ClientCommand::Buzz => self.buzz(connection_id).await,
            ClientCommand::Relaunch => self.relaunch(connection_id).await,
            ClientCommand::Reset => self.reset(connection_id).await,
            ClientCommand::LeaveRoom(payload) => self.leave_room(connection_id, payload).await,
        };

        if let Err(e) = result {
            warn!(connection_id = %connection_id, error = %e, "Command failed");
        }
    }

    /// Cleans up after a closed socket. Safe to call for unbound connections.
    pub async fn handle_disconnect(&self, connection_id: &str) {
        let _guard = self.gate.lock().await;

        let Some(binding) = self.registry.unbind(connection_id).await else {
            debug!(connection_id = %connection_id, "Disconnected connection had no room");
            return;
        };

        if let Err(e) = self
            .detach(connection_id, &binding, Departure::Disconnect)
            .await
        {
            warn!(connection_id = %connection_id, error = %e, "Disconnect cleanup failed");
        }
    }

    #[instrument(skip(self))]
    async fn create_room(
        &self,
        connection_id: &str,
        request_id: Option<u64>,
    ) -> Result<(), RouterError> {
        let previous = self.registry.lookup(connection_id).await;

        let room = self.room_repository.create_room(connection_id).await?;
        self.registry
            .bind(connection_id, &room.id, Role::Admin, "")
            .await;

        if let Some(previous) = previous {
            self.detach(connection_id, &previous, Departure::Leave).await?;
        }

        info!(room_id = %room.id, admin = %connection_id, "Room created");

        self.reply(
            connection_id,
            &WebSocketMessage::room_created(request_id, room.id)?,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn join_room(
        &self,
        connection_id: &str,
        request_id: Option<u64>,
        payload: JoinRoomPayload,
    ) -> Result<(), RouterError> {
        let JoinRoomPayload {
            room_id,
            user_name,
            user_type,
        } = payload;

        if self.room_repository.get_room(&room_id).await?.is_none() {
            info!(room_id = %room_id, connection_id = %connection_id, "Join rejected, room not found");
            return self
                .reply(
                    connection_id,
                    &WebSocketMessage::join_failed(request_id, ROOM_NOT_FOUND)?,
                )
                .await;
        }

        let previous = self.registry.lookup(connection_id).await;

        let joined = match user_type {
            Role::Member => {
                self.room_repository
                    .add_member(&room_id, connection_id, &user_name)
                    .await?
            }
            Role::Admin => self.room_repository.set_admin(&room_id, connection_id).await?,
        };

        let room = match joined {
            JoinRoomResult::Success(room) => room,
            JoinRoomResult::RoomNotFound => {
                return self
                    .reply(
                        connection_id,
                        &WebSocketMessage::join_failed(request_id, ROOM_NOT_FOUND)?,
                    )
                    .await;
            }
        };

        self.registry
            .bind(connection_id, &room_id, user_type, &user_name)
            .await;

        if let Some(previous) = previous {
            if previous.room_id != room_id || previous.role != user_type {
                self.detach(connection_id, &previous, Departure::Leave).await?;
            }
        }

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            user_name = %user_name,
            role = %user_type,
            "Joined room"
        );

        match user_type {
            Role::Member => {
                if let Some(admin) = room.admin_connection.as_deref() {
                    if admin != connection_id {
                        self.reply(
                            admin,
                            &WebSocketMessage::user_connected(
                                connection_id.to_string(),
                                user_name.clone(),
                            )?,
                        )
                        .await?;
                    }
                }
                self.reply(connection_id, &WebSocketMessage::join_succeeded(request_id, None)?)
                    .await
            }
            Role::Admin => {
                // Re-read so the list reflects any cleanup of this connection's old membership
                let user_list = self
                    .room_repository
                    .get_room(&room_id)
                    .await?
                    .map(|room| room.member_list())
                    .unwrap_or_default();
                self.reply(
                    connection_id,
                    &WebSocketMessage::join_succeeded(request_id, Some(user_list))?,
                )
                .await
            }
        }
    }

    #[instrument(skip(self))]
    async fn leave_room(
        &self,
        connection_id: &str,
        payload: LeaveRoomPayload,
    ) -> Result<(), RouterError> {
        let Some(binding) = self.registry.lookup(connection_id).await else {
            debug!(connection_id = %connection_id, "Leave from unbound connection ignored");
            return Ok(());
        };

        if let Some(room_id) = payload.room_id.as_deref() {
            if room_id != binding.room_id {
                debug!(
                    connection_id = %connection_id,
                    requested_room = %room_id,
                    bound_room = %binding.room_id,
                    "Leave for a room the connection is not in ignored"
                );
                return Ok(());
            }
        }

        self.registry.unbind(connection_id).await;
        self.detach(connection_id, &binding, Departure::Leave).await
    }

    async fn buzz(&self, connection_id: &str) -> Result<(), RouterError> {
        let binding = match self.registry.lookup(connection_id).await {
            Some(binding) if binding.role == Role::Member => binding,
            _ => {
                debug!(connection_id = %connection_id, "Buzz from non-member connection ignored");
                return Ok(());
            }
        };

        let (room, outcome) = match self
            .room_repository
            .try_buzz(&binding.room_id, connection_id)
            .await?
        {
            ArbitrationResult::Applied { room, outcome } => (room, outcome),
            ArbitrationResult::RoomNotFound => return Ok(()),
        };

        let BuzzOutcome::Accepted { user_name } = outcome else {
            return Ok(());
        };

        info!(
            room_id = %room.id,
            connection_id = %connection_id,
            user_name = %user_name,
            "Buzz accepted"
        );

        if let Some(admin) = room.admin_connection.as_deref() {
            self.reply(
                admin,
                &WebSocketMessage::has_buzzed(connection_id.to_string(), user_name)?,
            )
            .await?;
        }
        self.broadcast(&room.broadcast_targets(), &WebSocketMessage::disable())
            .await?;
        self.reply(connection_id, &WebSocketMessage::you_buzzed())
            .await
    }

    async fn relaunch(&self, connection_id: &str) -> Result<(), RouterError> {
        let Some(room_id) = self.administered_room(connection_id).await? else {
            return Ok(());
        };

        let (room, outcome) = match self.room_repository.relaunch(&room_id).await? {
            ArbitrationResult::Applied { room, outcome } => (room, outcome),
            ArbitrationResult::RoomNotFound => return Ok(()),
        };

        let RelaunchOutcome::Reopened {
            eliminated_connection,
            eliminated,
        } = outcome
        else {
            return Ok(());
        };

        info!(
            room_id = %room_id,
            eliminated = %eliminated_connection,
            eliminated_count = eliminated.len(),
            "Round relaunched"
        );

        self.broadcast(&room.broadcast_targets(), &WebSocketMessage::enable())
            .await?;
        self.broadcast(&eliminated, &WebSocketMessage::disable())
            .await
    }

    async fn reset(&self, connection_id: &str) -> Result<(), RouterError> {
        let Some(room_id) = self.administered_room(connection_id).await? else {
            return Ok(());
        };

        let (room, outcome) = match self.room_repository.reset(&room_id).await? {
            ArbitrationResult::Applied { room, outcome } => (room, outcome),
            ArbitrationResult::RoomNotFound => return Ok(()),
        };

        info!(
            room_id = %room_id,
            previous_state = ?outcome.previous_state,
            cleared_eliminations = outcome.cleared_eliminations,
            "Game reset"
        );

        self.broadcast(&room.broadcast_targets(), &WebSocketMessage::enable())
            .await
    }

    /// Room ID if `connection_id` is the current admin of the room it is bound to
    async fn administered_room(&self, connection_id: &str) -> Result<Option<String>, RouterError> {
        let binding = match self.registry.lookup(connection_id).await {
            Some(binding) if binding.role == Role::Admin => binding,
            _ => {
                debug!(connection_id = %connection_id, "Admin command from non-admin ignored");
                return Ok(None);
            }
        };

        let is_current_admin = self
            .room_repository
            .get_room(&binding.room_id)
            .await?
            .is_some_and(|room| room.is_admin(connection_id));

        if !is_current_admin {
            debug!(
                connection_id = %connection_id,
                room_id = %binding.room_id,
                "Admin command from superseded admin ignored"
            );
            return Ok(None);
        }

        Ok(Some(binding.room_id))
    }

    /// Removes `connection_id` from the room described by `binding` and notifies whoever needs to know.
    /// The registry binding must already have been dropped or replaced by the caller.
    async fn detach(
        &self,
        connection_id: &str,
        binding: &Binding,
        departure: Departure,
    ) -> Result<(), RouterError> {
        match binding.role {
            Role::Admin => {
                let result = self
                    .room_repository
                    .clear_admin_if_matches(&binding.room_id, connection_id)
                    .await?;
                if matches!(result, LeaveRoomResult::RoomDeleted) {
                    info!(room_id = %binding.room_id, "Room closed after admin left");
                }
                Ok(())
            }
            Role::Member => {
                let room = match self
                    .room_repository
                    .remove_member(&binding.room_id, connection_id)
                    .await?
                {
                    LeaveRoomResult::Success(room) => room,
                    LeaveRoomResult::RoomDeleted => {
                        info!(room_id = %binding.room_id, "Room closed after last member left");
                        return Ok(());
                    }
                    LeaveRoomResult::RoomNotFound => return Ok(()),
                };

                info!(
                    room_id = %room.id,
                    connection_id = %connection_id,
                    departure = ?departure,
                    "Member left room"
                );

                let message = WebSocketMessage::user_disconnected(
                    connection_id.to_string(),
                    binding.user_name.clone(),
                )?;
                match departure {
                    Departure::Leave => self.broadcast(&room.broadcast_targets(), &message).await,
                    Departure::Disconnect => match room.admin_connection.as_deref() {
                        Some(admin) => self.reply(admin, &message).await,
                        None => Ok(()),
                    },
                }
            }
        }
    }

    async fn reject_join(
        &self,
        connection_id: &str,
        request_id: Option<u64>,
        error: &MessageError,
    ) -> Result<(), RouterError> {
        let ack = WebSocketMessage::join_failed(request_id, error.to_string())?;
        self.reply(connection_id, &ack).await
    }

    async fn reply(&self, connection_id: &str, message: &WebSocketMessage) -> Result<(), RouterError> {
        MessageBroadcaster::send_to_connection(&self.connection_manager, connection_id, message)
            .await?;
        Ok(())
    }

    async fn broadcast(
        &self,
        connection_ids: &[String],
        message: &WebSocketMessage,
    ) -> Result<(), RouterError> {
        MessageBroadcaster::broadcast_to_connections(
            &self.connection_manager,
            connection_ids,
            message,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for EventRouter {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(connection_id = %connection_id, message = %message, "Received message");

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                return;
            }
        };

        match ClientCommand::from_message(&ws_message) {
            Ok(command) => {
                self.handle_command(connection_id, ws_message.request_id, command)
                    .await
            }
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    message_type = ?ws_message.message_type,
                    error = %e,
                    "Rejected WebSocket message"
                );

                // A join callback must still resolve on the client
                if ws_message.message_type == MessageType::JoinRoom
                    && ws_message.request_id.is_some()
                {
                    if let Err(e) = self.reject_join(connection_id, ws_message.request_id, &e).await {
                        warn!(connection_id = %connection_id, error = %e, "Failed to send ACK");
                    }
                }
            }
        }
    }
}
