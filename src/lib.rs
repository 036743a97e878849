pub mod server;
pub mod transcript;
pub mod types;
pub mod watcher;
pub mod websocket;
