//! Consumer for the `/global/event` push stream.
//!
//! The pipeline is split into small pieces that can be tested on their own:
//!
//! - [`lines`]: bytes to text lines.
//! - [`frame`]: lines to frame payloads.
//! - [`decode`]: payloads to [`GlobalEvent`](crate::types::event::GlobalEvent).
//! - [`session`]: connection, cancellation and lifecycle.

pub mod decode;
pub mod frame;
pub mod lines;
pub mod session;

pub use decode::{DecodeError, DiagnosticSink, TracingSink, decode_global_event};
pub use frame::{FrameAssembler, FrameOutcome};
pub use lines::LineReader;
pub use session::{GlobalEvents, SseOptions, StreamSession, StreamState, StreamStats};
