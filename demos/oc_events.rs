//! Example: Print every event from `/global/event` until Ctrl-C.
//!
//! Run with: cargo run --example oc_events --features full -- [base_url]
//!
//! Set `RUST_LOG=opencode_client=debug` to see connection logs.

use futures::StreamExt;
use opencode_client::types::event::{EventKind, FileEditedData, SessionStatusData, TodoUpdatedData};
use opencode_client::{Client, GlobalEvent};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn describe(event: &GlobalEvent) -> String {
    let payload = &event.payload;
    match payload.kind() {
        EventKind::SessionStatus => match payload.data_as::<SessionStatusData>() {
            Ok(data) => format!(
                "session {} is {}",
                data.session_id,
                data.status_name().unwrap_or("?")
            ),
            Err(_) => payload.event_type.clone(),
        },
        EventKind::TodoUpdated => match payload.data_as::<TodoUpdatedData>() {
            Ok(data) => {
                let open = data.todos.iter().filter(|t| !t.is_closed()).count();
                format!("session {}: {} todos, {} open", data.session_id, data.todos.len(), open)
            }
            Err(_) => payload.event_type.clone(),
        },
        EventKind::FileEdited => match payload.data_as::<FileEditedData>() {
            Ok(data) => format!("edited {}", data.path),
            Err(_) => payload.event_type.clone(),
        },
        _ => match payload.session_id() {
            Some(id) => format!("{} (session {})", payload.event_type, id),
            None => payload.event_type.clone(),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut builder = Client::builder();
    if let Some(url) = std::env::args().nth(1) {
        builder = builder.base_url(url);
    }
    let client = builder.build()?;

    let session = client.event_stream()?;
    println!("Listening on {} (Ctrl-C to stop)", session.endpoint());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut events = session.events(Some(cancel))?;
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => println!("[{}] {}", event.directory, describe(&event)),
            Err(err) => {
                eprintln!("stream failed: {}", err);
                break;
            }
        }
    }

    let stats = session.stats();
    println!(
        "Stream {:?}: {} frames, {} events, {} undecodable",
        session.state(),
        stats.frames_in,
        stats.events_out,
        stats.parse_errors
    );
    Ok(())
}
