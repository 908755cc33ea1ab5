use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use transports::TransportKind;

#[derive(Debug, Parser)]
#[command(
    name = "drupal-call",
    about = "Call a Drupal site through a pluggable HTTP transport",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./drupal.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL relative paths are resolved against
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// HTTP transport: reqwest, fetch, or hyper
    #[arg(short, long, global = true)]
    pub transport: Option<TransportKind>,

    /// File holding session state (saved credentials)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Export spans to this OTLP/gRPC collector endpoint
    #[arg(long, global = true)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Issue a request and print the decoded JSON body
    Call(CallArgs),
    /// Save basic-auth credentials to the session
    Login(LoginArgs),
    /// Clear the session
    Logout,
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// HTTP method, e.g. GET or POST
    pub method: String,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// Extra header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Basic-auth username for this call only (overrides the session)
    #[arg(short, long, requires = "password")]
    pub username: Option<String>,

    #[arg(short, long, requires = "username")]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub password: String,
}
