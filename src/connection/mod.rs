// Public API - what other modules can use
pub use registry::{Binding, ConnectionRegistry, InMemoryConnectionRegistry, Role};

// Internal modules
pub mod registry;
