//! Rust client for the OpenCode server.
//!
//! - `http` feature: REST API for sessions, messages and the TUI, behind
//!   [`Client`].
//! - `sse` feature: the `/global/event` push stream, see
//!   [`sse::StreamSession`].
//!
//! ```no_run
//! # async fn run() -> opencode_client::Result<()> {
//! use futures::StreamExt;
//! use opencode_client::Client;
//!
//! let client = Client::builder().base_url("http://127.0.0.1:4096").build()?;
//! let session = client.event_stream()?;
//! let mut events = session.events(None)?;
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("{} {}", event.directory, event.payload.event_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;

#[cfg(feature = "http")]
pub mod client;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "sse")]
pub mod sse;

#[cfg(feature = "http")]
pub use client::{Client, ClientBuilder, ClientOptions};
pub use error::{ConnectionErrorKind, OpencodeError, Result};
#[cfg(feature = "sse")]
pub use sse::{GlobalEvents, SseOptions, StreamSession, StreamState, StreamStats};
pub use types::event::{EventKind, GlobalEvent, OpenCodeEvent};
