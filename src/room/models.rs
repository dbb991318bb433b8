use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Round state derived from whether somebody has already buzzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    /// Nobody has buzzed yet, eligible members may buzz
    Open,
    /// A buzz was accepted, everyone is locked out until relaunch or reset
    Locked,
}

/// A member entry as reported to admins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub connection_id: String,
    pub user_name: String,
}

/// In-memory model of a buzzer room
#[derive(Debug, Clone)]
pub struct RoomModel {
    pub id: String,                         // Random pet name generated ID
    pub admin_connection: Option<String>,   // Connection currently acting as admin
    pub members: HashMap<String, String>,   // connection id -> display name
    pub first_buzzer: Option<String>,       // Connection whose buzz won the current round
    pub eliminated: HashSet<String>,        // Connections barred until the next reset
}

impl RoomModel {
    /// Creates a fresh room administered by `admin_connection`
    pub fn new(id: String, admin_connection: String) -> Self {
        Self {
            id,
            admin_connection: Some(admin_connection),
            members: HashMap::new(),
            first_buzzer: None,
            eliminated: HashSet::new(),
        }
    }

    /// Generates a candidate room ID. Uniqueness is enforced by the repository.
    pub fn generate_id() -> String {
        petname::Petnames::default().generate_one(2, "-")
    }

    pub fn round_state(&self) -> RoundState {
        if self.first_buzzer.is_some() {
            RoundState::Locked
        } else {
            RoundState::Open
        }
    }

    /// A room with no members and no admin must not be kept around
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.admin_connection.is_none()
    }

    pub fn has_member(&self, connection_id: &str) -> bool {
        self.members.contains_key(connection_id)
    }

    pub fn is_admin(&self, connection_id: &str) -> bool {
        self.admin_connection.as_deref() == Some(connection_id)
    }

    pub fn is_eliminated(&self, connection_id: &str) -> bool {
        self.eliminated.contains(connection_id)
    }

    pub fn member_name(&self, connection_id: &str) -> Option<&str> {
        self.members.get(connection_id).map(String::as_str)
    }

    pub fn get_member_count(&self) -> usize {
        self.members.len()
    }

    /// Members sorted by display name so admin views are stable
    pub fn member_list(&self) -> Vec<MemberInfo> {
        let mut list: Vec<MemberInfo> = self
            .members
            .iter()
            .map(|(connection_id, user_name)| MemberInfo {
                connection_id: connection_id.clone(),
                user_name: user_name.clone(),
            })
            .collect();
        list.sort_by(|a, b| {
            a.user_name
                .cmp(&b.user_name)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        list
    }

    /// Every connection that receives room-wide broadcasts: members plus the admin
    pub fn broadcast_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.members.keys().cloned().collect();
        if let Some(admin) = &self.admin_connection {
            if !self.members.contains_key(admin) {
                targets.push(admin.clone());
            }
        }
        targets
    }
}
