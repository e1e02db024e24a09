mod catalog;
mod config;
mod filter;
mod generate;
mod ipc;
mod prompt;
mod records;
mod tabular;
mod taxonomy;
mod worksheet;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lesson-planner sidecar: newline-delimited JSON requests on stdin, replies
/// and generation events on stdout, logs on stderr.
#[derive(Parser, Debug)]
#[command(name = "artplannerd", version)]
struct Cli {
    /// JSON config file
    #[arg(long, env = "ARTPLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Load the reference catalog before reading requests
    #[arg(long)]
    preload: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ARTPLANNER_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = config::Config::load(cli.config.as_deref()).context("failed to load config")?;
    let fetcher = tabular::HttpFetcher::new(config.fetch_timeout())
        .context("failed to build source fetcher")?;
    let backend = generate::HttpBackend::new(config.generate_url.clone(), config.generate_timeout())
        .context("failed to build generation client")?;
    info!(generate_url = %config.generate_url, "starting");

    let outbox = ipc::Outbox::stdout();
    let mut state = ipc::AppState::new(config, Arc::new(fetcher), Arc::new(backend), outbox.clone());

    if cli.preload {
        let resp = ipc::handle_request(
            &mut state,
            ipc::Request {
                id: "preload".to_string(),
                method: "catalog.load".to_string(),
                params: json!({}),
            },
        );
        if resp.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            // The form is unusable without reference data.
            anyhow::bail!("catalog preload failed: {}", resp["error"]);
        }
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                outbox.send(&json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                }));
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        outbox.send(&resp);
    }
    Ok(())
}
