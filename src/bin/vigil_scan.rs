use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil::utils::env::{load_env, load_oracle_settings, load_scan_settings};
use vigil::{ControlCatalog, HttpOracleClient, PillarId, ScanCoordinator, SqliteScanStore};

const USAGE: &str = "usage: vigil-scan <organization_id> <context.json> [pillar...]";

// Minimal CLI helper to run one scan from the terminal.
// Pillars default to the six Well-Architected pillars when not provided.
// The outcome is printed to stdout as JSON; logs go to stderr.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(organization_id) = args.next() else {
        bail!(USAGE);
    };
    let Some(context_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };

    let names: Vec<String> = args.collect();
    let pillars = if names.is_empty() {
        PillarId::well_architected()
    } else {
        ControlCatalog::resolve(names.as_slice())?
    };

    let raw_context = std::fs::read_to_string(&context_path)
        .with_context(|| format!("Failed to read context file {}", context_path.display()))?;
    let context: serde_json::Value = serde_json::from_str(&raw_context)
        .with_context(|| format!("Context file {} is not valid JSON", context_path.display()))?;

    let settings = load_scan_settings()?;
    let oracle = HttpOracleClient::new(&load_oracle_settings()?)?;
    let store = SqliteScanStore::open_default()?;

    let coordinator = ScanCoordinator::new(Arc::new(oracle), Arc::new(store), settings);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding pillars");
            on_interrupt.cancel();
        }
    });

    let outcome = coordinator
        .run_scan_with_cancel(&organization_id, &pillars, context, cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
