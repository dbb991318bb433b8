//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use buzzer::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every member joined by the setup builder
    pub fn for_all_users(setup: &'a TestSetup) -> Self {
        let connections = setup.users.iter().map(|u| u.0.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for the room admin
    pub fn for_admin(setup: &'a TestSetup) -> Self {
        Self {
            setup,
            connections: vec![setup.admin.as_str()],
        }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that connections received a specific message type next (consumes the message from queue)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            assert!(
                message.is_some(),
                "{} should have received {:?}",
                connection,
                expected_type
            );

            let msg: WebSocketMessage = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        // Broadcasts carry the same payload to everyone
        if messages.len() > 1 {
            let first_payload = &messages[0].payload;
            for (i, msg) in messages.iter().enumerate().skip(1) {
                assert_eq!(
                    &msg.payload, first_payload,
                    "{} payload differs from {}",
                    self.connections[i], self.connections[0]
                );
            }
        }

        MessageContent {
            payload: messages[0].payload.clone(),
            request_id: messages[0].request_id,
        }
    }

    /// Assert that connections have no unread messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Count how many unread messages of a type a connection has (non-consuming)
    pub async fn count_message_type(&self, connection: &str, msg_type: MessageType) -> usize {
        let messages = self
            .setup
            .mock_conn_manager
            .get_messages_for(connection)
            .await;
        messages
            .iter()
            .filter_map(|msg_str| serde_json::from_str::<WebSocketMessage>(msg_str).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }

    /// Assert that connections received exactly this sequence of message types (consumes them)
    pub async fn received_exactly(self, expected_types: Vec<MessageType>) {
        for connection in &self.connections {
            let mut actual = vec![];
            while let Some(raw) = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await
            {
                let msg: WebSocketMessage = serde_json::from_str(&raw)
                    .unwrap_or_else(|e| panic!("Failed to parse message for {}: {}", connection, e));
                actual.push(msg.message_type);
            }

            assert_eq!(
                actual, expected_types,
                "{} received unexpected message sequence",
                connection
            );
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: serde_json::Value,
    request_id: Option<u64>,
}

impl MessageContent {
    pub fn with_request_id(self, expected: u64) -> Self {
        assert_eq!(self.request_id, Some(expected));
        self
    }

    pub fn with_connection_id(self, expected: &str) -> Self {
        assert_eq!(self.payload["connection_id"], expected);
        self
    }

    pub fn with_user_name(self, expected: &str) -> Self {
        assert_eq!(self.payload["user_name"], expected);
        self
    }

    pub fn with_success(self, expected: bool) -> Self {
        assert_eq!(self.payload["success"], expected);
        self
    }

    pub fn with_error(self, expected: &str) -> Self {
        assert_eq!(self.payload["error"], expected);
        self
    }

    pub fn without_user_list(self) -> Self {
        assert!(self.payload.get("user_list").is_none());
        self
    }

    /// Display names in the ACK user list, in the order sent
    pub fn user_list_names(&self) -> Vec<String> {
        self.payload["user_list"]
            .as_array()
            .expect("ACK should carry a user_list")
            .iter()
            .map(|entry| entry["user_name"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn room_id(&self) -> String {
        self.payload["room_id"]
            .as_str()
            .expect("ACK should carry a room_id")
            .to_string()
    }

    pub fn error_message(&self) -> Option<String> {
        self.payload["error"].as_str().map(str::to_string)
    }
}
