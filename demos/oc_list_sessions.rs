//! Example: List all OpenCode sessions for a directory.
//!
//! Run with: cargo run --example oc_list_sessions -- [base_url] [directory]
//!
//! Expects a server at `http://127.0.0.1:4096` unless a URL is given.

use opencode_client::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut builder = Client::builder();
    if let Some(url) = args.next() {
        builder = builder.base_url(url);
    }
    if let Some(dir) = args.next() {
        builder = builder.directory(dir);
    }
    let client = builder.build()?;

    let sessions = client.sessions().list().await?;

    if sessions.is_empty() {
        println!("[]");
        return Ok(());
    }

    // Output as JSON for parsing
    let json = serde_json::to_string(&sessions)?;
    println!("{}", json);

    Ok(())
}
