//! Example: Interactive chat over the event stream.
//!
//! Run with: cargo run --example oc_chat --features full -- [base_url]
//!
//! Prompts are sent fire-and-forget; progress and replies are read from
//! `/global/event`. Commands: `/todos`, `/abort`, `/history`, `/quit`.

use futures::StreamExt;
use opencode_client::types::event::{EventKind, SessionStatusData};
use opencode_client::{Client, GlobalEvents};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

async fn print_events(mut events: GlobalEvents, session_id: String) {
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                eprintln!("\n[event stream failed: {}]", err);
                return;
            }
        };
        let payload = &event.payload;
        if payload.session_id() != Some(session_id.as_str()) {
            continue;
        }
        match payload.kind() {
            EventKind::SessionStatus => {
                if let Ok(status) = payload.data_as::<SessionStatusData>() {
                    println!("[status: {}]", status.status_name().unwrap_or("?"));
                }
            }
            EventKind::SessionIdle => println!("[idle]"),
            EventKind::SessionError => println!("[session error: {}]", payload.data),
            EventKind::MessageUpdated | EventKind::MessagePartUpdated => {
                tracing::debug!("{} {}", payload.event_type, payload.data);
            }
            _ => println!("[{}]", payload.event_type),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut builder = Client::builder();
    if let Some(url) = std::env::args().nth(1) {
        builder = builder.base_url(url);
    }
    let client = builder.build()?;

    let session = client.create_session(Some("oc_chat")).await?;
    println!("Created session: {}", session.id);

    // Subscribe before the first prompt so no early events are missed.
    let stream = client.event_stream()?;
    let printer = tokio::spawn(print_events(stream.events(None)?, session.id.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type a prompt, or /quit to exit.");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/abort" => {
                let aborted = client.sessions().abort(&session.id).await?;
                println!("[aborted: {}]", aborted);
            }
            "/todos" => {
                for todo in client.sessions().todos(&session.id).await? {
                    println!("  [{:?}] {} ({:?})", todo.status, todo.content, todo.priority);
                }
            }
            "/history" => {
                for message in client.messages().list(&session.id, Some(10)).await? {
                    println!("{}: {}", message.role(), message.text());
                }
            }
            text => {
                if let Err(err) = client.send_text_async(&session.id, text).await {
                    eprintln!("[send failed: {}]", err);
                }
            }
        }
    }

    stream.close();
    let _ = printer.await;

    let deleted = client.sessions().delete(&session.id).await?;
    println!("Deleted session {}: {}", session.id, deleted);
    Ok(())
}
