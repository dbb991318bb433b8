// Public API - what other modules can use
pub use handlers::{get_room, list_rooms};
pub use models::{MemberInfo, RoomModel, RoundState};
pub use repository::{InMemoryRoomRepository, RoomRepository};
pub use types::RoomResponse;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod types;
