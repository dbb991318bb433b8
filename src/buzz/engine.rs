//! Round arbitration for a single room.
//!
//! These functions only touch the [`RoomModel`] they are given. Callers are
//! responsible for holding whatever lock guards that room so that two buzzes
//! can never observe the same `Open` state.

use tracing::debug;

use crate::room::models::{RoomModel, RoundState};

/// Result of a buzz attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// This connection won the round
    Accepted { user_name: String },
    /// Someone else already holds the round
    AlreadyLocked,
    /// The connection was eliminated earlier in this game
    Eliminated,
    /// The connection is not a member of the room
    NotMember,
}

impl BuzzOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BuzzOutcome::Accepted { .. })
    }
}

/// Result of a relaunch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaunchOutcome {
    /// The signaler was eliminated and the round is open again
    Reopened {
        eliminated_connection: String,
        /// Eliminated connections still in the room, to be disabled individually
        eliminated: Vec<String>,
    },
    /// Nothing to relaunch
    AlreadyOpen,
}

/// Result of a reset request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub previous_state: RoundState,
    pub cleared_eliminations: usize,
}

/// Attempts to claim the round for `connection_id`.
///
/// Only the first eligible buzz while the room is `Open` is honored.
pub fn buzz(room: &mut RoomModel, connection_id: &str) -> BuzzOutcome {
    let Some(user_name) = room.member_name(connection_id).map(str::to_string) else {
        debug!(room_id = %room.id, connection_id = %connection_id, "Buzz from non-member ignored");
        return BuzzOutcome::NotMember;
    };

    if room.is_eliminated(connection_id) {
        debug!(room_id = %room.id, connection_id = %connection_id, "Buzz from eliminated member ignored");
        return BuzzOutcome::Eliminated;
    }

    if room.round_state() == RoundState::Locked {
        debug!(room_id = %room.id, connection_id = %connection_id, "Buzz while locked ignored");
        return BuzzOutcome::AlreadyLocked;
    }

    room.first_buzzer = Some(connection_id.to_string());
    BuzzOutcome::Accepted { user_name }
}

/// Eliminates the current signaler and reopens the round.
pub fn relaunch(room: &mut RoomModel) -> RelaunchOutcome {
    let Some(signaler) = room.first_buzzer.take() else {
        debug!(room_id = %room.id, "Relaunch while open ignored");
        return RelaunchOutcome::AlreadyOpen;
    };

    room.eliminated.insert(signaler.clone());

    // Departed connections may be playing elsewhere by now
    let mut eliminated: Vec<String> = room
        .eliminated
        .iter()
        .filter(|connection_id| room.has_member(connection_id))
        .cloned()
        .collect();
    eliminated.sort();

    RelaunchOutcome::Reopened {
        eliminated_connection: signaler,
        eliminated,
    }
}

/// Starts a fresh game in the same room. Always succeeds.
pub fn reset(room: &mut RoomModel) -> ResetOutcome {
    let previous_state = room.round_state();
    let cleared_eliminations = room.eliminated.len();

    room.eliminated.clear();
    room.first_buzzer = None;

    ResetOutcome {
        previous_state,
        cleared_eliminations,
    }
}
