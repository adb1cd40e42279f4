//! Burnbox CLI - store and retrieve one-time secrets.
//!
//! Secrets live in a local SQLite database by default. Every command
//! presents engine failures through [`PublicOutcome`], so the output never
//! reveals whether a key existed or which passphrase check failed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use burnbox_common::{Error as EngineError, PublicOutcome};
use burnbox_engine::{CreateSecretRequest, EngineConfig, SecretEngine};
use burnbox_storage::create_default_registry;

/// Environment variable consulted before prompting for a passphrase.
const PASSPHRASE_ENV: &str = "BURNBOX_PASSPHRASE";

#[derive(Parser)]
#[command(name = "burnbox")]
#[command(about = "Burnbox - passphrase-protected one-time secrets")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, env = "BURNBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend: "sqlite" or "memory".
    #[arg(long, default_value = "sqlite")]
    store: String,

    /// SQLite database path.
    #[arg(long, env = "BURNBOX_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a secret and print its retrieval key.
    Create {
        /// Read the secret from this file instead of stdin.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Time to live in seconds. Omit for no expiry.
        #[arg(short, long)]
        ttl: Option<i64>,
    },

    /// Print a secret once, then destroy access to it.
    Retrieve {
        /// Retrieval key printed by `create`.
        key: String,
    },

    /// Write a configuration file with default values.
    InitConfig {
        /// Destination path.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::InitConfig { path } => cmd_init_config(path),
        Commands::Create { file, ttl } => {
            let engine = open_engine(&cli)?;
            cmd_create(&engine, file.as_deref(), *ttl).await
        }
        Commands::Retrieve { key } => {
            let engine = open_engine(&cli)?;
            cmd_retrieve(&engine, key).await
        }
    }
}

/// Build an engine from the global options.
fn open_engine(cli: &Cli) -> Result<SecretEngine> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let store_config = match cli.store.as_str() {
        "sqlite" => {
            let db = match &cli.db {
                Some(db) => db.clone(),
                None => default_db_path()?,
            };
            serde_json::json!({ "path": db.to_string_lossy() })
        }
        _ => serde_json::Value::Null,
    };

    let registry = create_default_registry()?;
    if !registry.has_store(&cli.store) {
        let mut known = registry.stores();
        known.sort();
        anyhow::bail!(
            "Unknown store '{}' (available: {})",
            cli.store,
            known.join(", ")
        );
    }

    let store = registry
        .resolve(&cli.store, store_config)
        .context("Failed to open secret store")?;
    debug!(store = store.name(), "Store ready");

    Ok(SecretEngine::new(store, config))
}

/// `<data dir>/burnbox/secrets.db`, creating the directory if needed.
fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Could not determine a data directory; pass --db")?
        .join("burnbox");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join("secrets.db"))
}

/// Read the passphrase from the environment, or prompt for it.
fn read_passphrase(confirm: bool) -> Result<Zeroizing<String>> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(Zeroizing::new(passphrase));
    }

    let passphrase = Zeroizing::new(
        rpassword::prompt_password("Passphrase: ").context("Failed to read passphrase")?,
    );
    if confirm {
        let again = Zeroizing::new(
            rpassword::prompt_password("Confirm passphrase: ")
                .context("Failed to read passphrase")?,
        );
        if *passphrase != *again {
            anyhow::bail!("Passphrases do not match");
        }
    }
    Ok(passphrase)
}

/// Log the precise error, surface only the public outcome.
fn present(err: EngineError) -> anyhow::Error {
    let outcome = err.public_outcome();
    match outcome {
        PublicOutcome::Internal => tracing::error!(error = %err, "Engine failure"),
        _ => debug!(error = %err, "Request rejected"),
    }
    anyhow::anyhow!(outcome.message())
}

async fn cmd_create(engine: &SecretEngine, file: Option<&Path>, ttl: Option<i64>) -> Result<()> {
    let mut secret = Zeroizing::new(String::new());
    match file {
        Some(path) => {
            *secret = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_string(&mut secret)
                .context("Failed to read secret from stdin")?;
        }
    }

    let passphrase = read_passphrase(true)?;

    let request = CreateSecretRequest {
        secret: secret.to_string(),
        passphrase: passphrase.to_string(),
        ttl,
    };
    let response = engine
        .create_from_request(&request)
        .await
        .map_err(present)?;

    info!("Secret stored; it can be read once");
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn cmd_retrieve(engine: &SecretEngine, key: &str) -> Result<()> {
    let passphrase = read_passphrase(false)?;

    let response = engine
        .retrieve_text(key, &passphrase)
        .await
        .map_err(present)?;

    print!("{}", response.secret);
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    EngineConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_create() {
        let cli = Cli::try_parse_from(["burnbox", "--db", "/tmp/x.db", "create", "--ttl", "60"])
            .unwrap();
        assert_eq!(cli.store, "sqlite");
        assert!(matches!(
            cli.command,
            Commands::Create {
                ttl: Some(60),
                file: None
            }
        ));
    }

    #[test]
    fn test_cli_parses_retrieve() {
        let cli = Cli::try_parse_from(["burnbox", "--store", "memory", "retrieve", "abc_DEF-1"])
            .unwrap();
        match cli.command {
            Commands::Retrieve { key } => assert_eq!(key, "abc_DEF-1"),
            _ => panic!("expected retrieve"),
        }
    }

    #[test]
    fn test_present_hides_detail() {
        let message = present(EngineError::Expired).to_string();
        assert_eq!(message, present(EngineError::NotFound).to_string());
        assert_eq!(message, "secret is unavailable");
    }

    #[test]
    fn test_open_engine_rejects_unknown_store() {
        let cli = Cli::try_parse_from(["burnbox", "--store", "s3", "retrieve", "k"]).unwrap();
        let message = open_engine(&cli).err().unwrap().to_string();
        assert!(message.contains("Unknown store 's3'"));
        assert!(message.contains("memory, sqlite"));
    }

    #[test]
    fn test_open_engine_with_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("cli.db");
        let cli = Cli::try_parse_from([
            "burnbox",
            "--db",
            db.to_str().unwrap(),
            "retrieve",
            "k",
        ])
        .unwrap();

        let engine = open_engine(&cli).unwrap();
        assert_eq!(engine.store().name(), "sqlite");
        assert!(db.exists());
    }
}
