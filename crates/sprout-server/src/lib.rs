//! Development and preview servers for sprout applications.
//!
//! The development server rebuilds on source changes and pushes reload
//! notices to connected browsers over a WebSocket.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{spa_router, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{HmrHub, HmrMessage};
