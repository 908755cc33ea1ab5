//! Subcommand handlers and service wiring.

use std::sync::Arc;

use anyhow::{bail, Context};
use connector::{BasicAuth, CallOptions, ServiceCore, StorageAdapter, StorageValue};
use serde_json::{json, Map, Value};
use storage::FileStorage;
use tracing::info;

use crate::cli::{CallArgs, Cli, Command, LoginArgs};
use crate::config::{headers_from_config, transport_from_config, Settings};

/// Session key holding saved basic-auth credentials.
pub const AUTH_KEY: &str = "auth";

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli)?;
    let core = build_core(&settings)?;

    match cli.command {
        Command::Call(args) => call(&core, args).await,
        Command::Login(args) => login(&core, args),
        Command::Logout => logout(&core),
        Command::Config => show_config(&core, &settings),
    }
}

/// Wires the session store and transport from what the config service holds.
pub fn build_core(settings: &Settings) -> anyhow::Result<ServiceCore> {
    let mut core = ServiceCore::new(settings.to_config_record());

    let session = FileStorage::open(&settings.session_file)
        .with_context(|| format!("cannot open session file {}", settings.session_file.display()))?;
    core.set_session_service(Arc::new(session));

    let config = core.config_service()?;
    let kind = transport_from_config(config.as_ref())?;
    let transport = kind.build(core.base_url()?.as_deref());
    transport.add_default_headers(headers_from_config(config.as_ref()));
    core.set_transport_service(transport);

    info!(transport = %kind, "service core wired");
    Ok(core)
}

async fn call(core: &ServiceCore, args: CallArgs) -> anyhow::Result<()> {
    let transport = core.transport_service()?;

    let mut options = CallOptions::new();
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        options = options.with_header(name, value);
    }
    if let Some(data) = &args.data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        options = options.with_body(body);
    }
    options.auth = match (args.username, args.password) {
        (Some(username), Some(password)) => Some(BasicAuth::new(username, password)),
        _ => saved_auth(core.session_service()?.as_ref()),
    };

    let body = transport.call(&args.method, &args.path, options).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn login(core: &ServiceCore, args: LoginArgs) -> anyhow::Result<()> {
    let session = core.session_service()?;
    let mut record = Map::new();
    record.insert("username".into(), Value::String(args.username));
    record.insert("password".into(), Value::String(args.password));
    if !session.set_item(AUTH_KEY, Some(StorageValue::Record(record))) {
        bail!("session storage rejected the credentials");
    }
    println!("credentials saved");
    Ok(())
}

fn logout(core: &ServiceCore) -> anyhow::Result<()> {
    if !core.session_service()?.clear() {
        bail!("session storage could not be cleared");
    }
    println!("session cleared");
    Ok(())
}

fn show_config(core: &ServiceCore, settings: &Settings) -> anyhow::Result<()> {
    let config = core.config_service()?;
    let effective: Map<String, Value> = settings
        .to_config_record()
        .into_keys()
        .filter_map(|key| config.get_item(&key).map(|value| (key, value.to_json())))
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!(effective))?);
    Ok(())
}

/// Reads credentials saved by `login`, if any.
pub fn saved_auth(session: &dyn StorageAdapter) -> Option<BasicAuth> {
    let value = session.get_item(AUTH_KEY)?;
    let record = value.as_record()?;
    let username = record.get("username")?.as_str()?;
    let password = record.get("password")?.as_str()?;
    Some(BasicAuth::new(username, password))
}

/// Splits `Name: value` into its parts.
pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header '{raw}' must look like 'Name: value'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header '{raw}' has an empty name");
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector::{MemoryStorage, BASE_URL_KEY};
    use std::path::PathBuf;
    use transports::TransportKind;

    fn settings(session_file: PathBuf) -> Settings {
        Settings {
            base_url: Some("http://example.com".into()),
            transport: TransportKind::Fetch,
            headers: [("X-Site".to_owned(), "main".to_owned())].into(),
            session_file,
        }
    }

    #[test]
    fn parses_headers() {
        assert_eq!(
            parse_header("X-Site:  main ").unwrap(),
            ("X-Site".to_owned(), "main".to_owned())
        );
        assert_eq!(
            parse_header("Accept: a:b").unwrap(),
            ("Accept".to_owned(), "a:b".to_owned())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn saved_auth_requires_both_fields() {
        let session = MemoryStorage::new();
        assert_eq!(saved_auth(&session), None);

        let mut record = Map::new();
        record.insert("username".into(), Value::String("admin".into()));
        session.set_item(AUTH_KEY, Some(StorageValue::Record(record.clone())));
        assert_eq!(saved_auth(&session), None);

        record.insert("password".into(), Value::String("secret".into()));
        session.set_item(AUTH_KEY, Some(StorageValue::Record(record)));
        assert_eq!(saved_auth(&session), Some(BasicAuth::new("admin", "secret")));
    }

    #[tokio::test]
    async fn build_core_wires_every_slot() {
        let dir = tempfile::tempdir().unwrap();
        let core = build_core(&settings(dir.path().join("session.json"))).unwrap();

        let transport = core.transport_service().unwrap();
        assert_eq!(transport.name(), "Fetch");
        assert_eq!(
            transport.default_headers().get("X-Site").map(String::as_str),
            Some("main")
        );
        assert_eq!(
            core.config_service().unwrap().get_item(BASE_URL_KEY),
            Some(StorageValue::from("http://example.com"))
        );
        assert!(core.session_service().is_ok());
    }

    #[tokio::test]
    async fn login_and_logout_round_trip_through_the_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let core = build_core(&settings(path.clone())).unwrap();
        login(
            &core,
            LoginArgs {
                username: "admin".into(),
                password: "secret".into(),
            },
        )
        .unwrap();

        let reopened = build_core(&settings(path.clone())).unwrap();
        assert_eq!(
            saved_auth(reopened.session_service().unwrap().as_ref()),
            Some(BasicAuth::new("admin", "secret"))
        );

        logout(&reopened).unwrap();
        let after = build_core(&settings(path)).unwrap();
        assert_eq!(saved_auth(after.session_service().unwrap().as_ref()), None);
    }
}
