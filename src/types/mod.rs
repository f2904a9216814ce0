//! Wire types for the OpenCode server.

pub mod event;
pub mod message;
pub mod session;
pub mod todo;
pub mod tui;
