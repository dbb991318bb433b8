#![allow(dead_code)] // Not every helper is used by every test binary

use serde_json::json;

use buzzer::websockets::{MessageHandler, MessageType, WebSocketMessage};

use super::assertions::MessageAssertion;
use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a WebSocket message exactly as a client frame would arrive
    pub async fn send_message(&self, connection_id: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.send_raw(connection_id, &message_json).await;
    }

    pub async fn send_raw(&self, connection_id: &str, raw: &str) {
        self.router
            .handle_message(connection_id, raw.to_string())
            .await;
    }

    /// Simulate the socket closing
    pub async fn disconnect(&self, connection_id: &str) {
        self.router.handle_disconnect(connection_id).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Create a room and return its ID from the ACK
    pub async fn create_room(&self, connection_id: &str) -> String {
        self.send_message(
            connection_id,
            WebSocketMessage::new(MessageType::CreateRoom, json!({})).with_request_id(Some(1)),
        )
        .await;

        MessageAssertion::for_connections(self, vec![connection_id])
            .received_message_type(MessageType::Ack)
            .await
            .room_id()
    }

    pub async fn join_room(&self, connection_id: &str, room_id: &str, user_name: &str, user_type: &str) {
        self.send_message(
            connection_id,
            WebSocketMessage::new(
                MessageType::JoinRoom,
                json!({ "room_id": room_id, "user_name": user_name, "user_type": user_type }),
            )
            .with_request_id(Some(2)),
        )
        .await;
    }

    pub async fn send_buzz(&self, connection_id: &str) {
        self.send_message(connection_id, WebSocketMessage::new(MessageType::Buzz, json!({})))
            .await;
    }

    pub async fn send_relaunch(&self, connection_id: &str) {
        self.send_message(
            connection_id,
            WebSocketMessage::new(MessageType::Relaunch, json!({})),
        )
        .await;
    }

    pub async fn send_reset(&self, connection_id: &str) {
        self.send_message(connection_id, WebSocketMessage::new(MessageType::Reset, json!({})))
            .await;
    }

    pub async fn send_leave(&self, connection_id: &str, room_id: &str) {
        self.send_message(
            connection_id,
            WebSocketMessage::new(MessageType::LeaveRoom, json!({ "room_id": room_id })),
        )
        .await;
    }
}
