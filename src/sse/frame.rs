//! Groups event-stream lines into complete payloads.
//!
//! Framing rules:
//!
//! - `data: <payload>` sets the pending payload. A second `data:` line before
//!   the terminator replaces the first.
//! - A whitespace-only line completes the pending payload, if any.
//! - A payload of exactly `[DONE]` ends the stream at once; it is never
//!   emitted.
//! - Every other line (`event:`, `id:`, `:` comments, ...) is ignored.
//! - A payload still pending when the input ends is dropped.

/// Prefix of a payload-carrying line, including the single space.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that signals the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Result of feeding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Line consumed, nothing to emit yet.
    Pending,
    /// A frame was terminated; here is its payload.
    Emit(String),
    /// The sentinel was seen; no further lines should be read.
    Done,
}

/// Pure transition function of the assembler.
///
/// Takes the current pending payload and the next line, returns the new
/// pending payload and what (if anything) to hand downstream.
pub fn step(pending: Option<String>, line: &str) -> (Option<String>, FrameOutcome) {
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        if payload == DONE_SENTINEL {
            return (None, FrameOutcome::Done);
        }
        return (Some(payload.to_string()), FrameOutcome::Pending);
    }

    if line.trim().is_empty() {
        return match pending {
            Some(payload) => (None, FrameOutcome::Emit(payload)),
            None => (None, FrameOutcome::Pending),
        };
    }

    (pending, FrameOutcome::Pending)
}

/// Stateful wrapper over [`step`] holding at most one in-progress frame.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending: Option<String>,
    done: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. After [`FrameOutcome::Done`] every further line is
    /// answered with `Done` again.
    pub fn push_line(&mut self, line: &str) -> FrameOutcome {
        if self.done {
            return FrameOutcome::Done;
        }
        let (pending, outcome) = step(self.pending.take(), line);
        self.pending = pending;
        if outcome == FrameOutcome::Done {
            self.done = true;
        }
        outcome
    }

    /// Whether a `data:` line is waiting for its terminator.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// End of input. Returns the discarded unterminated payload, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.pending.take()
    }
}
