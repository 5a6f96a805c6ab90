//! `ocap-worker` -- replay harness for the recorder.
//!
//! Reads newline-delimited JSON invocations from stdin, one per line:
//!
//! ```text
//! {"command": ":NEW:SOLDIER:", "args": ["0", "42", "Alpha", ...]}
//! ```
//!
//! Each is dispatched in order; non-empty responses are printed to stdout.
//! At end of input every queue is drained and the process exits.
//!
//! Configuration comes from the environment, see [`RecorderConfig::from_env`].

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocap_events::Event;
use ocap_worker::{LogFormat, Recorder, RecorderConfig};

const DEFAULT_LOG_FILTER: &str = "ocap_worker=info,ocap_events=info,ocap_storage=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = RecorderConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    let recorder = Recorder::start(config)
        .await
        .context("failed to start recorder")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping malformed invocation");
                continue;
            }
        };

        match recorder.dispatch(&event.command, event.args).await {
            Ok(response) if !response.is_empty() => println!("{response}"),
            Ok(_) => {}
            Err(e) => tracing::warn!(line = line_no, command = %event.command, error = %e, "Dispatch failed"),
        }
    }

    tracing::info!(lines = line_no, "End of input");
    recorder.shutdown().await.context("failed to close backend")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
