use clap::Parser;
use starknet::core::types::Felt;
use survivorbot::{
    client::{parse_felt, ChainClient, StarknetClient},
    config::BotConfig,
    monitor::{print_decision, print_state},
};

/// Reads one game and shows what the bot would do next. Never submits.
#[derive(Parser, Debug)]
#[command(name = "inspect-game")]
struct Args {
    #[arg(long)]
    game_id: u64,

    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BotConfig::from_file(path)?,
        None => BotConfig::from_env(),
    };
    config.contracts.addresses()?;

    let client = StarknetClient::connect(&config, None).await?;
    let player = if config.account_address.trim().is_empty() {
        Felt::ZERO
    } else {
        parse_felt("account_address", &config.account_address)?
    };
    let engine = config.decision_engine(player)?;

    let state = client.fetch_state(args.game_id).await?;
    print_state(&state);
    let (phase, decision) = engine.decide(Some(&state));
    print_decision(phase, &decision);
    Ok(())
}
