#![allow(dead_code)] // Not every helper is used by every test binary

use std::sync::Arc;

use buzzer::{
    connection::InMemoryConnectionRegistry,
    room::repository::InMemoryRoomRepository,
    websockets::{EventRouter, MessageType},
};

use super::assertions::MessageAssertion;
use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub room_repository: Arc<InMemoryRoomRepository>,
    pub registry: Arc<InMemoryConnectionRegistry>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub router: Arc<EventRouter>,
    /// Room created by the builder's admin, if any
    pub room_id: String,
    pub admin: String,
    /// (connection id, display name) of members joined by the builder
    pub users: Vec<(String, String)>,
}

pub struct TestSetupBuilder {
    admin: String,
    users: Vec<(String, String)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            admin: "admin".to_string(),
            users: vec![],
        }
    }

    pub fn with_users(mut self, users: Vec<(&str, &str)>) -> Self {
        self.users = users
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        self
    }

    pub fn with_alice_and_bob(self) -> Self {
        self.with_users(vec![("alice", "Alice"), ("bob", "Bob")])
    }

    pub fn with_three_users(self) -> Self {
        self.with_users(vec![("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")])
    }

    /// Builds the stores and router without creating any room
    pub fn build_empty() -> TestSetup {
        let room_repository = Arc::new(InMemoryRoomRepository::new());
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let router = Arc::new(EventRouter::new(
            room_repository.clone(),
            registry.clone(),
            mock_conn_manager.clone(),
        ));

        TestSetup {
            room_repository,
            registry,
            mock_conn_manager,
            router,
            room_id: String::new(),
            admin: String::new(),
            users: vec![],
        }
    }

    /// Creates a room as the admin, joins every user and clears recorded frames
    pub async fn build(self) -> TestSetup {
        let mut setup = Self::build_empty();

        setup.room_id = setup.create_room(&self.admin).await;
        setup.admin = self.admin;

        for (connection_id, name) in &self.users {
            setup
                .join_room(connection_id, &setup.room_id.clone(), name, "user")
                .await;
            MessageAssertion::for_connections(&setup, vec![connection_id.as_str()])
                .received_message_type(MessageType::Ack)
                .await
                .with_success(true);
        }
        setup.users = self.users;

        setup.clear_messages().await;
        setup
    }
}
