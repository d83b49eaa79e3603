use crate::bot::RunMode;
use crate::calls::{CallBuilder, ContractAddresses, DEFAULT_PLAYER_NAME};
use crate::catalog::STARTING_WEAPONS;
use crate::client::parse_felt;
use crate::error::{BotError, Result};
use crate::strategy::{stat_policy, DecisionEngine, StrategySettings};
use serde::{Deserialize, Serialize};
use starknet::core::types::Felt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// "single" or "continuous"
    pub mode: String,

    /// Decide and log, never submit
    #[serde(default)]
    pub dry_run: bool,

    pub rpc_url: String,

    pub account_address: String,

    /// Only ever read from `PRIVATE_KEY`
    #[serde(skip)]
    pub private_key: Option<String>,

    /// One loop per id; empty means buy a new game
    #[serde(default)]
    pub game_ids: Vec<u64>,

    pub player_name: String,

    pub starting_weapon: u8,

    pub contracts: ContractsConfig,

    pub strategy: StrategyConfig,

    pub timing: TimingConfig,

    /// Ticket tokens approved for one game purchase
    pub ticket_amount: u128,

    /// View on the game contract returning the state words
    pub state_entrypoint: String,

    /// View on the VRF provider reporting whether a salt is fulfilled
    pub vrf_status_entrypoint: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub game: String,
    pub dungeon: String,
    pub vrf_provider: String,
    pub ticket_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// "vitality_strength" or "dexterity_first"
    pub stat_policy: String,

    /// Buy potions below this share of max health
    pub potion_threshold_pct: u8,

    pub max_potions_per_visit: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub poll_interval_secs: u64,
    pub receipt_timeout_secs: u64,
    pub randomness_timeout_secs: u64,
    pub max_submit_attempts: u32,
    pub retry_max_elapsed_secs: u64,
    pub pause_after_failure_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            mode: "continuous".to_string(),
            dry_run: false,
            rpc_url: "http://localhost:5050".to_string(),
            account_address: String::new(),
            private_key: None,
            game_ids: Vec::new(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            starting_weapon: 46,
            contracts: ContractsConfig::default(),
            strategy: StrategyConfig::default(),
            timing: TimingConfig::default(),
            ticket_amount: 1_000_000_000_000_000_000,
            state_entrypoint: "get_game_state".to_string(),
            vrf_status_entrypoint: "is_fulfilled".to_string(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            stat_policy: "vitality_strength".to_string(),
            potion_threshold_pct: 50,
            max_potions_per_visit: 10,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            receipt_timeout_secs: 120,
            randomness_timeout_secs: 60,
            max_submit_attempts: 5,
            retry_max_elapsed_secs: 60,
            pause_after_failure_secs: 30,
        }
    }
}

impl ContractsConfig {
    pub fn addresses(&self) -> Result<ContractAddresses> {
        Ok(ContractAddresses {
            game: contract_address("game", &self.game)?,
            dungeon: contract_address("dungeon", &self.dungeon)?,
            vrf_provider: contract_address("vrf_provider", &self.vrf_provider)?,
            ticket_token: contract_address("ticket_token", &self.ticket_token)?,
        })
    }

    pub fn from_env() -> Self {
        Self {
            game: std::env::var("GAME_ADDRESS").unwrap_or_default(),
            dungeon: std::env::var("DUNGEON_ADDRESS").unwrap_or_default(),
            vrf_provider: std::env::var("VRF_PROVIDER_ADDRESS").unwrap_or_default(),
            ticket_token: std::env::var("TICKET_TOKEN_ADDRESS").unwrap_or_default(),
        }
    }
}

fn contract_address(name: &str, value: &str) -> Result<Felt> {
    if value.trim().is_empty() {
        return Err(BotError::Config(format!("Missing {} contract address", name)));
    }
    if !value.trim().starts_with("0x") {
        return Err(BotError::Config(format!("{} contract address must be hex: {}", name, value)));
    }
    let address = parse_felt(name, value)?;
    if address == Felt::ZERO {
        return Err(BotError::Config(format!("{} contract address is zero", name)));
    }
    Ok(address)
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn randomness_timeout(&self) -> Duration {
        Duration::from_secs(self.randomness_timeout_secs)
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_secs(self.retry_max_elapsed_secs)
    }

    pub fn pause_after_failure(&self) -> Duration {
        Duration::from_secs(self.pause_after_failure_secs)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval_secs: env_or("POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            receipt_timeout_secs: env_or("RECEIPT_TIMEOUT_SECS", defaults.receipt_timeout_secs),
            randomness_timeout_secs: env_or(
                "RANDOMNESS_TIMEOUT_SECS",
                defaults.randomness_timeout_secs,
            ),
            max_submit_attempts: env_or("MAX_SUBMIT_ATTEMPTS", defaults.max_submit_attempts),
            retry_max_elapsed_secs: env_or(
                "RETRY_MAX_ELAPSED_SECS",
                defaults.retry_max_elapsed_secs,
            ),
            pause_after_failure_secs: env_or(
                "PAUSE_AFTER_FAILURE_SECS",
                defaults.pause_after_failure_secs,
            ),
        }
    }
}

impl StrategyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stat_policy: std::env::var("STAT_POLICY").unwrap_or(defaults.stat_policy),
            potion_threshold_pct: env_or("POTION_THRESHOLD_PCT", defaults.potion_threshold_pct),
            max_potions_per_visit: env_or("MAX_POTIONS_PER_VISIT", defaults.max_potions_per_visit),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Comma separated ids; unparsable entries are skipped.
pub fn parse_game_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

impl BotConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: BotConfig = serde_json::from_str(&contents)?;
        config.private_key = std::env::var("PRIVATE_KEY").ok();
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: std::env::var("BOT_MODE").unwrap_or(defaults.mode),
            dry_run: std::env::var("DRY_RUN").map(|v| v == "true").unwrap_or(false),
            rpc_url: std::env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            account_address: std::env::var("ACCOUNT_ADDRESS").unwrap_or_default(),
            private_key: std::env::var("PRIVATE_KEY").ok(),
            game_ids: std::env::var("GAME_IDS")
                .map(|v| parse_game_ids(&v))
                .unwrap_or_default(),
            player_name: std::env::var("PLAYER_NAME").unwrap_or(defaults.player_name),
            starting_weapon: env_or("STARTING_WEAPON", defaults.starting_weapon),
            contracts: ContractsConfig::from_env(),
            strategy: StrategyConfig::from_env(),
            timing: TimingConfig::from_env(),
            ticket_amount: env_or("TICKET_AMOUNT", defaults.ticket_amount),
            state_entrypoint: std::env::var("STATE_ENTRYPOINT")
                .unwrap_or(defaults.state_entrypoint),
            vrf_status_entrypoint: std::env::var("VRF_STATUS_ENTRYPOINT")
                .unwrap_or(defaults.vrf_status_entrypoint),
        }
    }

    pub fn run_mode(&self) -> Result<RunMode> {
        self.mode.parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(BotError::Config("RPC URL is empty".to_string()));
        }
        self.run_mode()?;
        self.contracts.addresses()?;
        if stat_policy(&self.strategy.stat_policy).is_none() {
            return Err(BotError::Config(format!(
                "Unknown stat policy: {}",
                self.strategy.stat_policy
            )));
        }
        if !STARTING_WEAPONS.contains(&self.starting_weapon) {
            return Err(BotError::Config(format!(
                "Item {} is not a starting weapon",
                self.starting_weapon
            )));
        }
        if self.strategy.potion_threshold_pct > 100 {
            return Err(BotError::Config("potion_threshold_pct above 100".to_string()));
        }
        if self.timing.max_submit_attempts == 0 {
            return Err(BotError::Config("max_submit_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn strategy_settings(&self, player_address: Felt) -> StrategySettings {
        StrategySettings {
            player_name: self.player_name.clone(),
            player_address,
            starting_weapon: self.starting_weapon,
            ticket_amount: self.ticket_amount,
            potion_threshold_pct: self.strategy.potion_threshold_pct,
            max_potions_per_visit: self.strategy.max_potions_per_visit,
        }
    }

    /// Builds the decision engine for `player_address`. Fails on an invalid config.
    pub fn decision_engine(&self, player_address: Felt) -> Result<DecisionEngine> {
        let builder = CallBuilder::new(self.contracts.addresses()?);
        let policy = stat_policy(&self.strategy.stat_policy).ok_or_else(|| {
            BotError::Config(format!("Unknown stat policy: {}", self.strategy.stat_policy))
        })?;
        Ok(DecisionEngine::new(
            builder,
            self.strategy_settings(player_address),
            policy,
        ))
    }
}
