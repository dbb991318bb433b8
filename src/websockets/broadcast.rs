use std::sync::Arc;

use super::{connection_manager::ConnectionManager, messages::WebSocketMessage};

pub struct MessageBroadcaster;

impl MessageBroadcaster {
    /// Serializes once and delivers to a single connection
    pub async fn send_to_connection(
        connection_manager: &Arc<dyn ConnectionManager>,
        connection_id: &str,
        message: &WebSocketMessage,
    ) -> Result<(), serde_json::Error> {
        let message_json = serde_json::to_string(message)?;
        connection_manager
            .send_to_connection(connection_id, &message_json)
            .await;
        Ok(())
    }

    /// Serializes once and delivers to every listed connection
    pub async fn broadcast_to_connections(
        connection_manager: &Arc<dyn ConnectionManager>,
        connection_ids: &[String],
        message: &WebSocketMessage,
    ) -> Result<(), serde_json::Error> {
        if connection_ids.is_empty() {
            return Ok(());
        }

        let message_json = serde_json::to_string(message)?;
        connection_manager
            .send_to_connections(connection_ids, &message_json)
            .await;
        Ok(())
    }
}
