//! # zkconf
//!
//! Command-line access to configuration stored in ZooKeeper.
//!
//! ## Commands
//! ```text
//! zkconf fetch <name>                     print a configuration as JSON
//! zkconf register <parent> <name> <json>  create or overwrite a sub-configuration
//! zkconf remove <name>                    delete a configuration subtree
//! ```
//!
//! Settings come from `provider.toml` and `ZKCONF_*` variables; set
//! `ZKCONF_CONFIG` to point at a specific file.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show per-operation traces
//! - Default: `info,zkconf=info`

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zkconf_core::{payload, Configuration};
use zkconf_provider::{
    ConfigurationProvider, ProviderSettings, SharedSession, StoreConfigurationProvider,
};
use zkconf_store::ZkStore;

static SESSION: SharedSession<ZkStore> = SharedSession::new();

const USAGE: &str = "usage: zkconf fetch <name> | register <parent> <name> <json> | remove <name>";

/// Parsed command line.
enum Command {
    Fetch { name: String },
    Register { parent: String, name: String, json: String },
    Remove { name: String },
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        match args {
            [cmd, name] if cmd == "fetch" => Ok(Command::Fetch { name: name.clone() }),
            [cmd, parent, name, json] if cmd == "register" => Ok(Command::Register {
                parent: parent.clone(),
                name: name.clone(),
                json: json.clone(),
            }),
            [cmd, name] if cmd == "remove" => Ok(Command::Remove { name: name.clone() }),
            _ => bail!(USAGE),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config_path = std::env::var("ZKCONF_CONFIG").ok().map(PathBuf::from);
    let settings = ProviderSettings::load(config_path).context("loading provider settings")?;
    info!(endpoint = %settings.endpoint(), root = %settings.root_path, "Settings loaded");

    let provider = StoreConfigurationProvider::new(&SESSION, &settings, ZkStore::new)
        .await
        .context("opening store session")?;

    let result = run(&provider, command).await;

    SESSION.shutdown().await.context("closing store session")?;
    result
}

async fn run(provider: &StoreConfigurationProvider<ZkStore>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Fetch { name } => {
            let config = provider.fetch(&name, true).await?;
            let rendered = serde_json::to_string_pretty(&Value::Object(payload::to_attributes(&config)))?;
            println!("{}", rendered);
        }
        Command::Register { parent, name, json } => {
            let attributes: Map<String, Value> =
                serde_json::from_str(&json).context("payload must be a JSON object")?;
            let parent = Configuration::new(parent);
            let mut sub = Configuration::with_data(name.clone(), attributes);
            provider.register(&parent, &mut sub, &name).await?;
            if let Some(data) = sub.provider_data() {
                info!(path = %data.path, "Registered");
            }
        }
        Command::Remove { name } => {
            let config = Configuration::new(name);
            provider.remove(&config).await?;
            info!(name = %config.name(), "Removed");
        }
    }
    Ok(())
}
