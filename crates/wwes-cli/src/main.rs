//! wwes - corporation wallet and asset snapshots.
//!
//! Fetches wallets, shareholders and assets with the first working key
//! pair, prints a report and stores a snapshot of the run.

use std::io::{self, BufRead};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wwes_core::auth::CredentialStore;
use wwes_core::{
    corp, report, Config, EveApi, FetchError, HttpTransport, Resolver, ResponseCache,
    SnapshotStore,
};

const USAGE: &str = "\
Usage: wwes [OPTIONS]

Options:
  --no-save            Do not write a snapshot of this run
  --offline <CORP>     Print the most recent snapshot of CORP without fetching
  --store-key <KEYID>  Read a verification code from stdin into the keychain
  --forget-key <KEYID> Remove a verification code from the keychain
  --init               Write a default config file
  --help               Show this message";

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wwes.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_key_id(value: Option<&str>) -> Result<i64> {
    value
        .context("Missing key ID")?
        .trim()
        .parse()
        .context("Key ID must be a number")
}

/// Errors reported as a plain message and a failing exit status.
fn exit_code_for(e: &anyhow::Error) -> Option<ExitCode> {
    e.downcast_ref::<FetchError>().map(|_| ExitCode::FAILURE)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let has = |flag: &str| args.iter().any(|a| a == flag);

    if has("--help") {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load()?;
    let _guard = init_tracing(&config);

    if has("--init") {
        config.save()?;
        println!("Wrote {}", Config::config_path()?.display());
        return Ok(ExitCode::SUCCESS);
    }
    if has("--store-key") {
        let key_id = parse_key_id(flag_value(&args, "--store-key"))?;
        let mut v_code = String::new();
        io::stdin().lock().read_line(&mut v_code)?;
        CredentialStore::store(key_id, v_code.trim())?;
        println!("Stored verification code for key {}", key_id);
        return Ok(ExitCode::SUCCESS);
    }
    if has("--forget-key") {
        let key_id = parse_key_id(flag_value(&args, "--forget-key"))?;
        CredentialStore::delete(key_id)?;
        println!("Removed verification code for key {}", key_id);
        return Ok(ExitCode::SUCCESS);
    }

    let store = SnapshotStore::new(config.snapshot_dir()?);

    if has("--offline") {
        let corp_name = flag_value(&args, "--offline").context("Missing corporation name")?;
        let Some(stored) = store.load_latest(corp_name)? else {
            bail!("No snapshot of \"{}\" found", corp_name);
        };
        println!("Snapshot from {}", stored.summary.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let (snapshot, resolver) = stored.restore();
        print!("{}", report::render(&snapshot, &resolver));
        return Ok(ExitCode::SUCCESS);
    }

    info!("wwes starting");
    let keys = config.key_pairs()?;
    if keys.is_empty() {
        bail!("No key pairs configured (see {})", Config::config_path()?.display());
    }

    let cache = ResponseCache::new(config.cache_dir())?;
    let mut api = EveApi::new(HttpTransport::new()?, config.api_host(), cache);
    let mut resolver = Resolver::new();

    let snapshot = match corp::fetch_with_keys(&mut api, &mut resolver, &keys).await {
        Ok(snapshot) => snapshot,
        Err(e) => match exit_code_for(&e) {
            Some(code) => {
                eprintln!("{}", e);
                return Ok(code);
            }
            None => return Err(e),
        },
    };

    match store.load_latest(&snapshot.name) {
        Ok(Some(previous)) => println!(
            "Previous snapshot {}: total {}",
            previous.summary.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            wwes_core::utils::format_amount(previous.summary.balance)
        ),
        Ok(None) => info!("No previous snapshot"),
        Err(e) => warn!(error = %e, "Could not read previous snapshot"),
    }

    print!("{}", report::render(&snapshot, &resolver));

    if !has("--no-save") {
        let path = store.save(&snapshot, &resolver)?;
        info!(path = %path.display(), "Snapshot written");
    }

    info!("wwes done");
    Ok(ExitCode::SUCCESS)
}
