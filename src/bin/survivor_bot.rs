use clap::Parser;
use colored::*;
use log::{error, info, warn};
use starknet::core::types::Felt;
use std::sync::Arc;
use survivorbot::{
    bot::{set_status, BotRunner, BotStatus},
    client::{parse_felt, ChainClient, StarknetClient},
    config::BotConfig,
    monitor::print_summary,
};

#[derive(Parser, Debug)]
#[command(name = "survivor-bot", about = "Plays on-chain dungeon runs until the adventurer dies")]
struct Args {
    /// JSON config file; falls back to environment variables when RPC_URL is set
    #[arg(short, long)]
    config: Option<String>,

    /// single | continuous
    #[arg(short, long)]
    mode: Option<String>,

    /// Game to play; repeat for several games
    #[arg(long = "game-id")]
    game_ids: Vec<u64>,

    /// Decide and log without submitting
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<BotConfig> {
    let mut config = match &args.config {
        Some(path) => BotConfig::from_file(path)?,
        None if std::env::var("RPC_URL").is_ok() => {
            info!("📋 Loading config from environment variables");
            BotConfig::from_env()
        }
        None => BotConfig::from_file("config.json").unwrap_or_else(|_| BotConfig::from_env()),
    };

    if let Some(mode) = &args.mode {
        config.mode = mode.clone();
    }
    if !args.game_ids.is_empty() {
        config.game_ids = args.game_ids.clone();
    }
    if args.dry_run {
        config.dry_run = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    println!("{}", "⚔️  Survivor Bot".bright_cyan().bold());
    info!("Started at {}", chrono::Utc::now().to_rfc3339());

    let config = load_config(&args)?;
    let mode = config.run_mode()?;

    let private_key = if config.dry_run {
        config.private_key.as_deref()
    } else {
        Some(
            config
                .private_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("PRIVATE_KEY is not set"))?,
        )
    };
    let client = StarknetClient::connect(&config, private_key).await?;
    let player = match client.address() {
        Some(address) => address,
        None if config.account_address.trim().is_empty() => Felt::ZERO,
        None => parse_felt("account_address", &config.account_address)?,
    };
    let engine = Arc::new(config.decision_engine(player)?);
    let client: Arc<dyn ChainClient> = Arc::new(client);

    info!("📡 RPC: {}", config.rpc_url);
    info!("🎮 Mode: {}{}", mode, if config.dry_run { " (dry run)" } else { "" });

    let games: Vec<Option<u64>> = if config.game_ids.is_empty() {
        info!("No game id given, a new game will be bought");
        vec![None]
    } else {
        config.game_ids.iter().copied().map(Some).collect()
    };
    if games.len() > 1 {
        warn!(
            "Running {} games from one account; their submissions share the account nonce",
            games.len()
        );
    }

    let runners: Vec<BotRunner> = games
        .into_iter()
        .map(|game_id| {
            BotRunner::new(client.clone(), engine.clone(), config.timing.clone(), mode, game_id)
                .with_dry_run(config.dry_run)
        })
        .collect();

    let handles: Vec<_> = runners.iter().map(|r| r.status_handle()).collect();
    ctrlc::set_handler(move || {
        println!("\n🛑 Stopping after the current cycle...");
        for handle in &handles {
            set_status(handle, BotStatus::Stopped);
        }
    })
    .ok();

    let tasks: Vec<_> = runners
        .into_iter()
        .map(|mut runner| tokio::spawn(async move { runner.run().await }))
        .collect();

    let mut failures = 0;
    for task in tasks {
        match task.await {
            Ok(Ok(summary)) => print_summary(&summary),
            Ok(Err(e)) => {
                error!("{}", format!("Runner stopped: {}", e).red());
                failures += 1;
            }
            Err(e) => {
                error!("Runner task failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} runner(s) stopped with an error", failures);
    }
    Ok(())
}
