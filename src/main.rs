use anyhow::{Context, Result};
use clap::Parser;

use txwatch::config::{ExplorerConfig, MonitorConfig};
use txwatch::monitor::observer::ScriptedObserver;
use txwatch::monitor::runtime::StatusUpdate;
use txwatch::monitor::{StatusPresenter, TransactionWatcher};
use txwatch::replay::{load_script, replay, ReplayStep};
use txwatch::TxHash;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON replay script of chain events
    #[arg(long)]
    script: PathBuf,

    /// Hash to watch before the script starts
    #[arg(long)]
    hash: Option<TxHash>,

    /// JSON file with a `MonitorConfig`
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "TXWATCH_EXPLORER_HOST")]
    explorer_host: Option<String>,

    #[arg(long, env = "TXWATCH_EXPLORER_NAME")]
    explorer_name: Option<String>,

    /// Print status updates as JSON lines
    #[arg(long)]
    json: bool,

    /// Quiet period that ends each replay step
    #[arg(long, default_value_t = 50)]
    settle_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    log::info!("[MAIN] explorer: {}", config.explorer.host);

    let mut steps = load_script(&args.script)?;
    if let Some(hash) = args.hash {
        steps.insert(0, ReplayStep::Watch(hash));
    }
    println!("[MAIN] Replaying {} steps from {}", steps.len(), args.script.display());

    let presenter = StatusPresenter::new(config.explorer);
    let observer = ScriptedObserver::new();
    let (watcher, mut stream) = TransactionWatcher::spawn(Arc::new(observer.clone()));

    let t0 = Instant::now();
    let updates = replay(
        &steps,
        &observer,
        &watcher,
        &mut stream,
        Duration::from_millis(args.settle_ms),
        |update| print_update(&presenter, update, args.json),
    )
    .await?;

    watcher.shutdown().await?;

    println!("-----------------------------------");
    println!("Status updates:   {}", updates);
    println!("Total Time:       {:?}", t0.elapsed());
    println!("-----------------------------------");

    Ok(())
}

fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).context("invalid config")?
        }
        None => MonitorConfig::default(),
    };

    if args.explorer_host.is_some() || args.explorer_name.is_some() {
        config.explorer = ExplorerConfig::new(
            args.explorer_host.as_deref().unwrap_or(&config.explorer.host),
            args.explorer_name.as_deref().unwrap_or(&config.explorer.name),
        );
    }

    Ok(config)
}

fn print_update(presenter: &StatusPresenter, update: &StatusUpdate, json: bool) {
    if json {
        match serde_json::to_string(update) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("[MAIN] cannot encode update: {}", e),
        }
        return;
    }

    match presenter.render(update.as_ref()) {
        Some(view) => println!("{}\n", view),
        None => println!("(no transaction)\n"),
    }
}
