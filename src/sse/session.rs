//! One streaming connection to `/global/event`.
//!
//! A [`StreamSession`] owns its own transport, a cancellation token and the
//! state machine
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Completed | Stopped | Failed
//!             \-> Failed | Stopped
//! ```
//!
//! [`StreamSession::events`] hands out a lazy, pull-driven [`GlobalEvents`]
//! stream. Nothing touches the network until it is first polled, and each
//! poll performs at most one read.

use super::decode::{DiagnosticSink, TracingSink, decode_global_event};
use super::frame::{FrameAssembler, FrameOutcome};
use super::lines::{DEFAULT_MAX_LINE_LEN, LineReader};
use crate::error::{ConnectionErrorKind, OpencodeError, Result};
use crate::http::DIRECTORY_HEADER;
use crate::types::event::GlobalEvent;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Path of the push-event endpoint.
pub const GLOBAL_EVENT_PATH: &str = "/global/event";

type ByteStream = BoxStream<'static, reqwest::Result<bytes::Bytes>>;

/// Options for a [`StreamSession`].
#[derive(Clone, Copy, Debug)]
pub struct SseOptions {
    /// Deadline for receiving response headers, and for reading the body
    /// of a non-success response (default: 30s). `None` waits
    /// indefinitely. Once streaming, no timeout applies.
    pub connect_timeout: Option<Duration>,
    /// Maximum number of error-body bytes kept in an
    /// [`OpencodeError::Api`] (default: 64 KiB).
    pub error_body_limit: usize,
    /// Lines longer than this are truncated (default: 16 MiB).
    pub max_line_len: usize,
}

impl Default for SseOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(30)),
            error_body_limit: 64 * 1024,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Lifecycle of a [`StreamSession`].
///
/// A session stopped or closed before its first poll goes straight from
/// `Idle` to `Stopped`; it never connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, not consumed yet.
    Idle,
    /// Waiting for response headers.
    Connecting,
    /// Reading the event body.
    Streaming,
    /// `[DONE]` or end of body.
    Completed,
    /// Cancelled by the caller.
    Stopped,
    /// Connect error, API error or lost connection.
    Failed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

/// Snapshot of stream diagnostics counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Complete frames received from the server.
    pub frames_in: u64,
    /// Events handed to the consumer.
    pub events_out: u64,
    /// Frames dropped because their payload did not decode.
    pub parse_errors: u64,
}

#[derive(Debug, Default)]
struct SharedStreamStats {
    frames_in: AtomicU64,
    events_out: AtomicU64,
    parse_errors: AtomicU64,
}

impl SharedStreamStats {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            events_out: self.events_out.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

struct Shared {
    state: Mutex<StreamState>,
    stats: SharedStreamStats,
    cancel: CancellationToken,
    consumed: AtomicBool,
    closed: AtomicBool,
    /// Open body reader while no read is in flight.
    reader: Mutex<Option<LineReader<ByteStream>>>,
}

impl Shared {
    fn state(&self) -> StreamState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` unless a terminal state was already reached.
    fn transition(&self, next: StreamState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_terminal() {
            return false;
        }
        *state = next;
        true
    }

    /// Park the reader between reads, or drop it if cancellation already
    /// fired.
    fn park_reader(&self, reader: LineReader<ByteStream>, cancelled: bool) {
        let mut slot = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        if !cancelled && !self.cancel.is_cancelled() {
            *slot = Some(reader);
        }
    }

    fn take_reader(&self) -> Option<LineReader<ByteStream>> {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Owner of one `/global/event` connection.
///
/// Safe to share across tasks (e.g. in an `Arc`): [`Self::stop`] and
/// [`Self::close`] may be called from any task while another one iterates.
/// Dropping the session stops its stream.
pub struct StreamSession {
    http: reqwest::Client,
    url: String,
    directory: Option<String>,
    options: SseOptions,
    sink: Arc<dyn DiagnosticSink>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("url", &self.url)
            .field("directory", &self.directory)
            .field("options", &self.options)
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Create a session for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be built.
    pub fn new(base_url: &str, directory: Option<String>, options: SseOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(limit) = options.connect_timeout {
            builder = builder.connect_timeout(limit);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), GLOBAL_EVENT_PATH),
            directory,
            options,
            sink: Arc::new(TracingSink),
            shared: Arc::new(Shared {
                state: Mutex::new(StreamState::Idle),
                stats: SharedStreamStats::default(),
                cancel: CancellationToken::new(),
                consumed: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                reader: Mutex::new(None),
            }),
        })
    }

    /// Replace the sink receiving decode failures (default: [`TracingSink`]).
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Full URL of the event endpoint.
    pub fn endpoint(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    pub fn stats(&self) -> StreamStats {
        self.shared.stats.snapshot()
    }

    /// The lazy event sequence.
    ///
    /// `cancel` is an optional external token; firing it or calling
    /// [`Self::stop`] ends the sequence without an error. A session can be
    /// consumed once.
    ///
    /// # Errors
    ///
    /// Returns [`OpencodeError::State`] if the session was already consumed
    /// or has been closed.
    pub fn events(&self, cancel: Option<CancellationToken>) -> Result<GlobalEvents> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(OpencodeError::State(
                "event stream session is closed".into(),
            ));
        }
        if self.shared.consumed.swap(true, Ordering::SeqCst) {
            return Err(OpencodeError::State(
                "event stream session was already consumed".into(),
            ));
        }

        let driver = Driver {
            http: self.http.clone(),
            url: self.url.clone(),
            directory: self.directory.clone(),
            options: self.options,
            sink: Arc::clone(&self.sink),
            shared: Arc::clone(&self.shared),
            external: cancel,
            streaming: false,
            frames: FrameAssembler::new(),
            finished: false,
        };

        let inner = stream::unfold(driver, |mut driver| async move {
            let item = driver.next().await?;
            Some((item, driver))
        })
        .fuse()
        .boxed();

        Ok(GlobalEvents {
            inner,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Request cancellation of the running sequence. Idempotent.
    pub fn stop(&self) {
        self.shared.cancel.cancel();
    }

    /// Tear the session down: cancel, release the connection and refuse
    /// further [`Self::events`] calls. Idempotent.
    ///
    /// Between polls the connection is dropped here. A read that is in
    /// flight releases it as soon as it is polled again, or when the
    /// [`GlobalEvents`] is dropped.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("SSE session closed endpoint={}", self.url);
        }
        self.shared.cancel.cancel();
        drop(self.shared.take_reader());
        self.shared.transition(StreamState::Stopped);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Events of one [`StreamSession`].
///
/// Yields decoded events in wire order, then ends either cleanly (`None`)
/// or with exactly one error followed by `None`.
pub struct GlobalEvents {
    inner: BoxStream<'static, Result<GlobalEvent>>,
    shared: Arc<Shared>,
}

impl GlobalEvents {
    /// Receive the next event.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<GlobalEvent>> {
        self.inner.next().await
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    pub fn stats(&self) -> StreamStats {
        self.shared.stats.snapshot()
    }
}

impl Stream for GlobalEvents {
    type Item = Result<GlobalEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

async fn cancelled(internal: &CancellationToken, external: Option<&CancellationToken>) {
    match external {
        Some(external) => {
            tokio::select! {
                () = internal.cancelled() => {}
                () = external.cancelled() => {}
            }
        }
        None => internal.cancelled().await,
    }
}

struct Driver {
    http: reqwest::Client,
    url: String,
    directory: Option<String>,
    options: SseOptions,
    sink: Arc<dyn DiagnosticSink>,
    shared: Arc<Shared>,
    external: Option<CancellationToken>,
    /// Headers received; the reader lives in `shared.reader` between reads.
    streaming: bool,
    frames: FrameAssembler,
    finished: bool,
}

impl Driver {
    fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
            || self
                .external
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }

    fn finish(&mut self, state: StreamState) {
        self.finished = true;
        drop(self.shared.take_reader());
        self.shared.transition(state);
    }

    async fn next(&mut self) -> Option<Result<GlobalEvent>> {
        if self.finished {
            return None;
        }

        if !self.streaming {
            if self.is_cancelled() {
                self.finish(StreamState::Stopped);
                return None;
            }
            match self.connect().await {
                Ok(Some(reader)) => {
                    self.streaming = true;
                    self.shared.park_reader(reader, self.is_cancelled());
                }
                Ok(None) => {
                    tracing::debug!("SSE connect cancelled endpoint={}", self.url);
                    self.finish(StreamState::Stopped);
                    return None;
                }
                Err(err) => {
                    tracing::warn!(
                        "SSE connect failed endpoint={} directory={:?}: {}",
                        self.url,
                        self.directory,
                        err
                    );
                    self.finish(StreamState::Failed);
                    return Some(Err(err));
                }
            }
        }

        loop {
            // Empty slot: closed from another task between polls.
            let Some(mut reader) = self.shared.take_reader() else {
                tracing::debug!("SSE stream closed endpoint={}", self.url);
                self.finish(StreamState::Stopped);
                return None;
            };

            let read = tokio::select! {
                biased;
                () = cancelled(&self.shared.cancel, self.external.as_ref()) => None,
                line = reader.next_line() => Some(line),
            };

            if let Some(Some(Ok(_))) = &read {
                self.shared.park_reader(reader, self.is_cancelled());
            } else {
                drop(reader);
            }

            match read {
                None => {
                    tracing::debug!("SSE stream stopped endpoint={}", self.url);
                    self.finish(StreamState::Stopped);
                    return None;
                }
                Some(None) => {
                    if let Some(dangling) = self.frames.finish() {
                        tracing::debug!(
                            "SSE stream ended mid-frame endpoint={}, dropping: {}",
                            self.url,
                            dangling
                        );
                    }
                    tracing::debug!("SSE stream ended endpoint={}", self.url);
                    self.finish(StreamState::Completed);
                    return None;
                }
                Some(Some(Err(e))) => {
                    tracing::warn!("SSE connection lost endpoint={}: {}", self.url, e);
                    let err = OpencodeError::connection(
                        ConnectionErrorKind::Lost,
                        &self.url,
                        format!("stream read failed: {e}"),
                        Some(e),
                    );
                    self.finish(StreamState::Failed);
                    return Some(Err(err));
                }
                Some(Some(Ok(line))) => match self.frames.push_line(&line) {
                    FrameOutcome::Pending => {}
                    FrameOutcome::Done => {
                        tracing::debug!("SSE stream received [DONE] endpoint={}", self.url);
                        self.finish(StreamState::Completed);
                        return None;
                    }
                    FrameOutcome::Emit(payload) => {
                        self.shared.stats.frames_in.fetch_add(1, Ordering::Relaxed);
                        match decode_global_event(&payload) {
                            Ok(event) => {
                                self.shared.stats.events_out.fetch_add(1, Ordering::Relaxed);
                                return Some(Ok(event));
                            }
                            Err(err) => {
                                self.shared.stats.parse_errors.fetch_add(1, Ordering::Relaxed);
                                self.sink.on_decode_error(&self.url, &err);
                            }
                        }
                    }
                },
            }
        }
    }

    /// Send the request and wait for headers.
    ///
    /// `Ok(None)` means cancellation won the race.
    async fn connect(&mut self) -> Result<Option<LineReader<ByteStream>>> {
        self.shared.transition(StreamState::Connecting);
        tracing::debug!(
            "SSE connecting endpoint={} directory={:?}",
            self.url,
            self.directory
        );

        let mut req = self.http.get(&self.url).header(ACCEPT, "text/event-stream");
        if let Some(dir) = &self.directory {
            req = req.header(DIRECTORY_HEADER, dir);
        }

        let send = req.send();
        let limit = self.options.connect_timeout;
        let deadline = limit.map(|limit| Instant::now() + limit);
        let headers = async move {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, send).await.ok(),
                None => Some(send.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancelled(&self.shared.cancel, self.external.as_ref()) => return Ok(None),
            outcome = headers => outcome,
        };

        let response = match outcome {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                return Err(match OpencodeError::from_send(&self.url, e) {
                    OpencodeError::Http(e) => OpencodeError::connection(
                        ConnectionErrorKind::Failed,
                        &self.url,
                        format!("failed to connect: {e}"),
                        Some(e),
                    ),
                    other => other,
                });
            }
            None => {
                return Err(OpencodeError::connection(
                    ConnectionErrorKind::Timeout,
                    &self.url,
                    format!(
                        "no response headers within {:?}",
                        limit.unwrap_or_default()
                    ),
                    None,
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let read = read_bounded(response, self.options.error_body_limit, deadline);
            let body = tokio::select! {
                biased;
                () = cancelled(&self.shared.cancel, self.external.as_ref()) => return Ok(None),
                body = read => body,
            };
            return Err(OpencodeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        self.shared.transition(StreamState::Streaming);
        tracing::debug!(
            "SSE connection opened endpoint={} directory={:?}",
            self.url,
            self.directory
        );
        Ok(Some(LineReader::with_max_line_len(
            response.bytes_stream().boxed(),
            self.options.max_line_len,
        )))
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.shared.take_reader());
            self.shared.transition(StreamState::Stopped);
        }
    }
}

/// Read at most `limit` bytes of an error body, stopping early at
/// `deadline` with whatever arrived so far.
async fn read_bounded(
    mut response: reqwest::Response,
    limit: usize,
    deadline: Option<Instant>,
) -> String {
    let mut body = Vec::new();
    while body.len() < limit {
        let chunk = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, response.chunk()).await {
                Ok(chunk) => chunk,
                Err(_) => {
                    tracing::debug!("Error body not complete before deadline, keeping {} bytes", body.len());
                    break;
                }
            },
            None => response.chunk().await,
        };
        match chunk {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Failed to read error body: {}", e);
                break;
            }
        }
    }
    body.truncate(limit);
    String::from_utf8_lossy(&body).into_owned()
}
