//! Drupal Connect CLI entry point.
//!
//! This binary is the composition root for the whole workspace.
//! Responsibilities:
//!
//! 1. **Parse configuration**: load `drupal.toml` (or `--config`) and apply
//!    command-line overrides.
//! 2. **Wire observability**: configure `tracing-subscriber` with a text or
//!    JSON layer on stderr and, with `--otlp-endpoint`, an OpenTelemetry OTLP
//!    exporter. All spans emitted by the transports flow through it.
//! 3. **Construct services**: seed a [`connector::ServiceCore`] from the
//!    configuration, install a file-backed session store, and install the
//!    selected transport adapter.
//! 4. **Dispatch**: run `call`, `login`, `logout`, or `config`.
//!
//! Wiring errors (an unset service slot) and API errors (a
//! [`connector::DrupalError`]) both end the process with a non-zero status;
//! the printed error tells them apart.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let telemetry = telemetry::init(cli.log_format, cli.otlp_endpoint.as_deref())?;
    let result = commands::run(cli).await;
    telemetry.shutdown();
    result
}
