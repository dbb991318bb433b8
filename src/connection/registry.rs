use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Role a connection plays inside its room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Role {
    #[serde(rename = "admin")]
    #[strum(serialize = "admin")]
    Admin,
    #[serde(rename = "user", alias = "member")]
    #[strum(to_string = "user", serialize = "member")]
    Member,
}

/// Where a live connection currently belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_id: String,
    pub role: Role,
    pub user_name: String,
}

/// Reverse index from live connections to their room membership
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Records the connection's room and role, replacing any previous binding
    async fn bind(&self, connection_id: &str, room_id: &str, role: Role, user_name: &str);

    /// Removes and returns the binding. Unbinding twice is a no-op.
    async fn unbind(&self, connection_id: &str) -> Option<Binding>;

    async fn lookup(&self, connection_id: &str) -> Option<Binding>;

    async fn len(&self) -> usize;
}

/// In-memory implementation of ConnectionRegistry
pub struct InMemoryConnectionRegistry {
    // connection id -> binding
    bindings: Arc<RwLock<HashMap<String, Binding>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn bind(&self, connection_id: &str, room_id: &str, role: Role, user_name: &str) {
        let binding = Binding {
            room_id: room_id.to_string(),
            role,
            user_name: user_name.to_string(),
        };

        let previous = self
            .bindings
            .write()
            .await
            .insert(connection_id.to_string(), binding);

        info!(
            connection_id = %connection_id,
            room_id = %room_id,
            role = %role,
            replaced = previous.is_some(),
            "Connection bound to room"
        );
    }

    async fn unbind(&self, connection_id: &str) -> Option<Binding> {
        let removed = self.bindings.write().await.remove(connection_id);
        match &removed {
            Some(binding) => debug!(
                connection_id = %connection_id,
                room_id = %binding.room_id,
                "Connection unbound"
            ),
            None => debug!(connection_id = %connection_id, "Connection was not bound"),
        }
        removed
    }

    async fn lookup(&self, connection_id: &str) -> Option<Binding> {
        self.bindings.read().await.get(connection_id).cloned()
    }

    async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_bind_and_lookup() {
        let registry = InMemoryConnectionRegistry::new();

        registry.bind("c1", "room-1", Role::Member, "Alice").await;

        let binding = registry.lookup("c1").await.unwrap();
        assert_eq!(binding.room_id, "room-1");
        assert_eq!(binding.role, Role::Member);
        assert_eq!(binding.user_name, "Alice");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unbind_is_idempotent() {
        let registry = InMemoryConnectionRegistry::new();
        registry.bind("c1", "room-1", Role::Admin, "").await;

        let first = registry.unbind("c1").await;
        let second = registry.unbind("c1").await;

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_rebind_replaces_previous_binding() {
        let registry = InMemoryConnectionRegistry::new();
        registry.bind("c1", "room-1", Role::Member, "Alice").await;
        registry.bind("c1", "room-2", Role::Admin, "Alice").await;

        let binding = registry.lookup("c1").await.unwrap();
        assert_eq!(binding.room_id, "room-2");
        assert_eq!(binding.role, Role::Admin);
        assert_eq!(registry.len().await, 1);
    }

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("user", Role::Member)]
    #[case("member", Role::Member)]
    fn test_role_parsing(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::from_str(raw).unwrap(), expected);

        let from_json: Role = serde_json::from_str(&format!("\"{}\"", raw)).unwrap();
        assert_eq!(from_json, expected);
    }

    #[test]
    fn test_role_display_matches_wire_format() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Member.to_string(), "user");
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"user\"");
    }
}
