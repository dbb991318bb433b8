// Public API
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::websocket_handler;
pub use messages::{ClientCommand, MessageError, MessageType, WebSocketMessage};
pub use router::{EventRouter, RouterError};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod broadcast;
mod connection_manager;
mod handler;
pub mod messages;
mod router;
mod socket;
