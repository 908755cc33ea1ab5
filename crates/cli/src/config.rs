//! CLI configuration: `drupal.toml` merged with command-line overrides.
//!
//! The resolved [`Settings`] become the initial [`ConfigRecord`] of the
//! [`connector::ServiceCore`]; from then on every component reads them back
//! through the config service.

use std::path::{Path, PathBuf};

use anyhow::Context;
use connector::{ConfigRecord, Headers, StorageAdapter, StorageValue, BASE_URL_KEY};
use serde::Deserialize;
use serde_json::{Map, Value};
use transports::TransportKind;

use crate::cli::Cli;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "drupal.toml";
pub const DEFAULT_SESSION_FILE: &str = ".drupal-session.json";

pub const TRANSPORT_KEY: &str = "transport";
pub const HEADERS_KEY: &str = "headers";
pub const SESSION_FILE_KEY: &str = "sessionFile";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub transport: Option<TransportKind>,
    pub headers: Headers,
    pub session_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration file")
    }

    /// Reads `explicit`, or [`DEFAULT_CONFIG_FILE`] when present.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Effective settings after applying command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: Option<String>,
    pub transport: TransportKind,
    pub headers: Headers,
    pub session_file: PathBuf,
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone().or(file.base_url),
            transport: cli.transport.or(file.transport).unwrap_or_default(),
            headers: file.headers,
            session_file: cli
                .session_file
                .clone()
                .or(file.session_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let file = FileConfig::load(cli.config.as_deref())?;
        Ok(Self::resolve(file, cli))
    }

    /// The record the service core's config storage is seeded with.
    pub fn to_config_record(&self) -> ConfigRecord {
        let mut record = ConfigRecord::new();
        if let Some(url) = &self.base_url {
            record.insert(BASE_URL_KEY.into(), url.as_str().into());
        }
        record.insert(TRANSPORT_KEY.into(), self.transport.as_str().into());
        if !self.headers.is_empty() {
            let headers: Map<String, Value> = self
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            record.insert(HEADERS_KEY.into(), StorageValue::Record(headers));
        }
        record.insert(
            SESSION_FILE_KEY.into(),
            self.session_file.display().to_string().into(),
        );
        record
    }
}

/// Reads the default-header record back out of a config service.
///
/// Non-string header values are skipped.
pub fn headers_from_config(config: &dyn StorageAdapter) -> Headers {
    config
        .get_item(HEADERS_KEY)
        .and_then(|value| value.as_record().cloned())
        .map(|record| {
            record
                .into_iter()
                .filter_map(|(name, value)| match value {
                    Value::String(s) => Some((name, s)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reads the transport kind back out of a config service.
pub fn transport_from_config(config: &dyn StorageAdapter) -> anyhow::Result<TransportKind> {
    match config.get_item(TRANSPORT_KEY) {
        Some(StorageValue::String(name)) => Ok(name.parse()?),
        Some(other) => anyhow::bail!("config key '{TRANSPORT_KEY}' must be a string, got {other}"),
        None => Ok(TransportKind::default()),
    }
}
