// Server module entry
// Listener setup, per-connection serving and shutdown handling

pub mod connection;
pub mod listener;
pub mod serve;
pub mod signal;

// Re-export commonly used items
pub use listener::create_listener;
pub use serve::serve;
pub use signal::shutdown_signal;
