use crate::calls::CallDescriptor;
use crate::client::{ChainClient, TxOutcome};
use crate::config::TimingConfig;
use crate::error::{BotError, Result};
use crate::monitor::GameMonitor;
use crate::state::GameState;
use crate::strategy::{check_legality, ActionKind, BotDecision, DecisionEngine, Phase};
use backoff::{future::retry, ExponentialBackoff};
use colored::*;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use starknet::core::types::Felt;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// One decision, then exit
    Single,
    /// Loop until the adventurer dies or the runner is stopped
    Continuous,
}

impl FromStr for RunMode {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(RunMode::Single),
            "continuous" => Ok(RunMode::Continuous),
            other => Err(BotError::Config(format!("Unknown mode: {}", other))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Single => f.write_str("single"),
            RunMode::Continuous => f.write_str("continuous"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Idle,
    Running,
    Paused,
    Stopped,
    Dead,
}

pub type StatusHandle = Arc<RwLock<BotStatus>>;

pub fn read_status(handle: &StatusHandle) -> BotStatus {
    match handle.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

pub fn set_status(handle: &StatusHandle, status: BotStatus) {
    match handle.write() {
        Ok(mut guard) => *guard = status,
        Err(poisoned) => *poisoned.into_inner() = status,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub game_id: Option<u64>,
    pub cycles: u64,
    pub transactions: u64,
    pub final_phase: Option<Phase>,
}

/// A `buy_game` transaction whose minted game id is not known yet.
#[derive(Debug, Clone, Copy)]
struct PendingPurchase {
    tx: Felt,
    submitted_at: Instant,
}

/// Drives one game: fetch, decide, act, wait. Never shares mutable state with
/// other runners.
pub struct BotRunner {
    client: Arc<dyn ChainClient>,
    engine: Arc<DecisionEngine>,
    timing: TimingConfig,
    mode: RunMode,
    dry_run: bool,
    game_id: Option<u64>,
    status: StatusHandle,
    monitor: GameMonitor,
    pending_purchase: Option<PendingPurchase>,
    /// Set once a purchase is adopted, cleared when the game reads as started.
    awaiting_start: bool,
}

impl BotRunner {
    pub fn new(
        client: Arc<dyn ChainClient>,
        engine: Arc<DecisionEngine>,
        timing: TimingConfig,
        mode: RunMode,
        game_id: Option<u64>,
    ) -> Self {
        Self {
            client,
            engine,
            timing,
            mode,
            dry_run: false,
            game_id,
            status: Arc::new(RwLock::new(BotStatus::Idle)),
            monitor: GameMonitor::new(),
            pending_purchase: None,
            awaiting_start: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn game_id(&self) -> Option<u64> {
        self.game_id
    }

    pub fn status(&self) -> BotStatus {
        read_status(&self.status)
    }

    /// Shared handle so a signal handler can stop the loop.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    fn label(&self) -> String {
        match self.game_id {
            Some(id) => format!("game {}", id),
            None => "new game".to_string(),
        }
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary {
            game_id: self.game_id,
            cycles: 0,
            transactions: 0,
            final_phase: None,
        };
        if self.status() == BotStatus::Stopped {
            return Ok(summary);
        }
        let dry = if self.dry_run { ", dry run" } else { "" };
        info!(
            "🚀 Starting runner for {} ({} mode{})",
            self.label(),
            self.mode,
            dry
        );
        set_status(&self.status, BotStatus::Running);

        loop {
            if self.status() == BotStatus::Stopped {
                info!("🛑 Runner for {} stopped", self.label());
                break;
            }

            summary.cycles += 1;
            match self.cycle(&mut summary).await {
                Ok(phase) => {
                    summary.final_phase = Some(phase);
                    if phase.is_terminal() {
                        let line = format!("💀 {} reached a terminal state", self.label());
                        info!("{}", line.red());
                        set_status(&self.status, BotStatus::Dead);
                        break;
                    }
                    if self.mode == RunMode::Single {
                        set_status(&self.status, BotStatus::Stopped);
                        break;
                    }
                }
                Err(e) => self.handle_failure(e).await?,
            }

            sleep(self.timing.poll_interval()).await;
        }

        summary.game_id = self.game_id;
        Ok(summary)
    }

    /// Decides whether a failed cycle ends the run.
    async fn handle_failure(&self, e: BotError) -> Result<()> {
        match &e {
            BotError::RetriesExhausted { .. } => {
                error!("{}", format!("❌ {}: {}", self.label(), e).red());
                set_status(&self.status, BotStatus::Paused);
                if self.mode == RunMode::Single {
                    return Err(e);
                }
                warn!(
                    "⏸️  Pausing {} for {}s",
                    self.label(),
                    self.timing.pause_after_failure_secs
                );
                sleep(self.timing.pause_after_failure()).await;
                if self.status() == BotStatus::Paused {
                    set_status(&self.status, BotStatus::Running);
                }
                Ok(())
            }
            BotError::IllegalAction(_) => {
                error!("{}", format!("❌ {}: skipping cycle: {}", self.label(), e).red());
                if self.mode == RunMode::Single {
                    set_status(&self.status, BotStatus::Stopped);
                    return Err(e);
                }
                sleep(self.timing.pause_after_failure()).await;
                Ok(())
            }
            _ if e.is_retriable() => {
                warn!("{}", format!("⚠️  {}: {}", self.label(), e).yellow());
                if self.mode == RunMode::Single {
                    set_status(&self.status, BotStatus::Stopped);
                    return Err(e);
                }
                sleep(self.timing.pause_after_failure()).await;
                Ok(())
            }
            _ => {
                error!("{}", format!("❌ {}: {}", self.label(), e).red());
                set_status(&self.status, BotStatus::Stopped);
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Option<GameState>> {
        match self.game_id {
            Some(id) => Ok(Some(self.client.fetch_state(id).await?)),
            None => Ok(None),
        }
    }

    /// One fetch, decide, act pass. Returns the phase the decision was made in.
    async fn cycle(&mut self, summary: &mut RunSummary) -> Result<Phase> {
        if let Some(pending) = self.pending_purchase {
            self.resolve_purchase(pending).await?;
            return Ok(Phase::Idle);
        }

        let state = self.fetch().await?;
        let (phase, decision) = match &state {
            Some(fresh) if self.awaiting_start && !fresh.adventurer.has_started() => {
                self.engine.start_game(fresh.game_id)
            }
            _ => {
                self.awaiting_start = false;
                if let Some(state) = &state {
                    self.monitor.observe(state);
                }
                self.engine.decide(state.as_ref())
            }
        };
        info!(
            "🎯 {} [{}] {:?}: {}",
            self.label(),
            phase.to_string().cyan(),
            decision.action,
            decision.reason
        );

        if phase.is_terminal() || decision.is_empty() {
            return Ok(phase);
        }
        check_legality(state.as_ref(), &decision)?;

        if self.dry_run {
            for call in &decision.calls {
                info!(
                    "📝 dry run: {:#x}.{}({})",
                    call.contract_address,
                    call.entrypoint,
                    call.calldata.join(", ")
                );
            }
            return Ok(phase);
        }

        match decision.randomness_request() {
            Some(request) => {
                let salt = request.salt().unwrap_or(Felt::ZERO);
                self.act_with_randomness(state.as_ref(), &decision, salt, summary).await?;
            }
            None if decision.action == ActionKind::BuyGame && self.game_id.is_none() => {
                let tx = self.submit(&decision.calls).await?;
                summary.transactions += 1;
                let pending = PendingPurchase {
                    tx,
                    submitted_at: Instant::now(),
                };
                self.pending_purchase = Some(pending);
                if self.await_inclusion(tx).await? {
                    self.resolve_purchase(pending).await?;
                }
            }
            None => {
                let tx = self.submit(&decision.calls).await?;
                summary.transactions += 1;
                self.await_inclusion(tx).await?;
            }
        }
        Ok(phase)
    }

    async fn act_with_randomness(
        &self,
        state: Option<&GameState>,
        decision: &BotDecision,
        salt: Felt,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let (request, action) = decision.calls.split_at(1);
        let tx = self.submit(request).await?;
        summary.transactions += 1;
        if !self.await_inclusion(tx).await? {
            return Ok(());
        }
        if !self.await_randomness(salt, state).await? {
            return Ok(());
        }

        // The salt is bound to the action count observed before the request.
        let fresh = self.fetch().await?;
        check_legality(fresh.as_ref(), decision)?;

        let tx = self.submit(action).await?;
        summary.transactions += 1;
        self.await_inclusion(tx).await?;
        Ok(())
    }

    /// Settles a submitted purchase. Until it is settled the runner never
    /// buys again; a purchase that stays unconfirmed stops the runner.
    async fn resolve_purchase(&mut self, pending: PendingPurchase) -> Result<()> {
        let outcome = match self.client.receipt(pending.tx).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.unresolved_purchase(pending, e)),
        };
        match outcome {
            Some(TxOutcome::Succeeded) => {}
            Some(TxOutcome::Reverted(reason)) => {
                warn!("Purchase {:#x} reverted ({}), no ticket spent", pending.tx, reason);
                self.pending_purchase = None;
                return Ok(());
            }
            None => {
                let e = BotError::Provider(format!("purchase {:#x} not yet included", pending.tx));
                return Err(self.unresolved_purchase(pending, e));
            }
        }

        match self.client.purchased_game_id(pending.tx).await {
            Ok(Some(id)) => {
                info!("{}", format!("🎟️  Bought game {}", id).green());
                self.game_id = Some(id);
                self.pending_purchase = None;
                self.awaiting_start = true;
                Ok(())
            }
            Ok(None) => Err(BotError::PurchaseUnconfirmed {
                tx: format!("{:#x}", pending.tx),
                reason: "receipt holds no game token mint".to_string(),
            }),
            Err(e) => Err(self.unresolved_purchase(pending, e)),
        }
    }

    /// Keeps `e` retriable until the purchase has outlived the inclusion wait
    /// plus the retry budget.
    fn unresolved_purchase(&self, pending: PendingPurchase, e: BotError) -> BotError {
        let limit = self.timing.receipt_timeout() + self.timing.retry_max_elapsed();
        if pending.submitted_at.elapsed() < limit {
            return e;
        }
        error!("{}", format!("❌ purchase {:#x} unresolved: {}", pending.tx, e).red());
        BotError::PurchaseUnconfirmed {
            tx: format!("{:#x}", pending.tx),
            reason: e.to_string(),
        }
    }

    /// Submits with exponential backoff. Only failures before a transaction hash
    /// exists are retried.
    async fn submit(&self, calls: &[CallDescriptor]) -> Result<Felt> {
        let max_attempts = self.timing.max_submit_attempts.max(1);
        let attempts = AtomicU32::new(0);
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: self.timing.pause_after_failure().max(Duration::from_secs(1)),
            max_elapsed_time: Some(self.timing.retry_max_elapsed()),
            ..Default::default()
        };

        let client = &self.client;
        let counter = &attempts;
        let result = retry(policy, || async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            match client.submit(calls).await {
                Ok(hash) => Ok(hash),
                Err(e) if e.is_retriable() && attempt < max_attempts => {
                    let line =
                        format!("🔁 Submit attempt {}/{} failed: {}", attempt, max_attempts, e);
                    warn!("{}", line.yellow());
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await;

        match result {
            Ok(hash) => {
                let names: Vec<&str> = calls.iter().map(|c| c.entrypoint).collect();
                info!("📤 {} submitted [{}]: {:#x}", self.label(), names.join(", "), hash);
                Ok(hash)
            }
            Err(e) if e.is_retriable() => Err(BotError::RetriesExhausted {
                attempts: attempts.load(Ordering::SeqCst),
                last_error: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// `false` when the transaction reverted or was not seen before the timeout.
    async fn await_inclusion(&self, tx: Felt) -> Result<bool> {
        let deadline = Instant::now() + self.timing.receipt_timeout();
        loop {
            match self.client.receipt(tx).await? {
                Some(TxOutcome::Succeeded) => {
                    debug!("✅ {:#x} included", tx);
                    return Ok(true);
                }
                Some(TxOutcome::Reverted(reason)) => {
                    warn!("{}", format!("↩️  {:#x} reverted: {}", tx, reason).red());
                    return Ok(false);
                }
                None => {}
            }
            if Instant::now() >= deadline {
                let secs = self.timing.receipt_timeout_secs;
                warn!("{}", format!("⌛ {:#x} not included after {}s", tx, secs).yellow());
                return Ok(false);
            }
            sleep(self.timing.poll_interval()).await;
        }
    }

    /// Waits for the VRF provider to fulfil `salt`. On timeout the state is read
    /// once more: an unchanged action count means the request was lost.
    async fn await_randomness(&self, salt: Felt, before: Option<&GameState>) -> Result<bool> {
        let deadline = Instant::now() + self.timing.randomness_timeout();
        loop {
            if self.client.randomness_ready(salt).await? {
                debug!("🎲 randomness ready for {:#x}", salt);
                return Ok(true);
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.timing.poll_interval()).await;
        }

        let after = self.fetch().await?;
        let count = |s: Option<&GameState>| s.map(|s| s.adventurer.action_count);
        if count(after.as_ref()) == count(before) {
            let line =
                format!("⌛ randomness for {:#x} never arrived, request treated as lost", salt);
            warn!("{}", line.yellow());
            return Err(BotError::RandomnessTimeout {
                salt: format!("{:#x}", salt),
            });
        }
        info!("Action count moved while waiting for randomness, recomputing");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::fixtures::builder;
    use crate::calls::{
        ENTRY_APPROVE, ENTRY_BUY_GAME, ENTRY_EXPLORE, ENTRY_REQUEST_RANDOM, ENTRY_START_GAME,
    };
    use crate::state::{fixtures, Adventurer, Beast, DecodeError};
    use crate::strategy::{StrategySettings, VitalityStrength};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockChain {
        /// Each fetch pops the front; the last state repeats.
        states: Mutex<VecDeque<GameState>>,
        fetch_failures: Mutex<u32>,
        submit_failures: Mutex<u32>,
        submitted: Mutex<Vec<Vec<CallDescriptor>>>,
        reverted: bool,
        /// The node never learns about any transaction.
        receipt_missing: bool,
        randomness_never_ready: bool,
        minted: Option<u64>,
        mint_lookup_fails: bool,
    }

    impl MockChain {
        fn with_states(states: Vec<GameState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                ..Self::default()
            }
        }

        fn entrypoints(&self) -> Vec<Vec<&'static str>> {
            self.submitted
                .lock()
                .unwrap()
                .iter()
                .map(|calls| calls.iter().map(|c| c.entrypoint).collect())
                .collect()
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn fetch_state(&self, _game_id: u64) -> Result<GameState> {
            let mut failures = self.fetch_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(BotError::Decode(DecodeError::Truncated {
                    expected: 70,
                    actual: 3,
                }));
            }
            drop(failures);
            let mut states = self.states.lock().unwrap();
            if states.len() > 1 {
                Ok(states.pop_front().unwrap())
            } else {
                states
                    .front()
                    .cloned()
                    .ok_or_else(|| BotError::Provider("no state".to_string()))
            }
        }

        async fn submit(&self, calls: &[CallDescriptor]) -> Result<Felt> {
            let mut failures = self.submit_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(BotError::Submission("nonce too old".to_string()));
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(calls.to_vec());
            Ok(Felt::from(submitted.len() as u64))
        }

        async fn receipt(&self, _tx_hash: Felt) -> Result<Option<TxOutcome>> {
            if self.receipt_missing {
                Ok(None)
            } else if self.reverted {
                Ok(Some(TxOutcome::Reverted("out of gas".to_string())))
            } else {
                Ok(Some(TxOutcome::Succeeded))
            }
        }

        async fn randomness_ready(&self, _salt: Felt) -> Result<bool> {
            Ok(!self.randomness_never_ready)
        }

        async fn purchased_game_id(&self, _tx_hash: Felt) -> Result<Option<u64>> {
            if self.mint_lookup_fails {
                return Err(BotError::Provider("receipt events unavailable".to_string()));
            }
            Ok(self.minted)
        }
    }

    fn timing() -> TimingConfig {
        TimingConfig {
            poll_interval_secs: 1,
            receipt_timeout_secs: 10,
            randomness_timeout_secs: 5,
            max_submit_attempts: 3,
            retry_max_elapsed_secs: 600,
            pause_after_failure_secs: 2,
        }
    }

    fn engine() -> Arc<DecisionEngine> {
        let settings = StrategySettings {
            player_name: "bot".to_string(),
            player_address: Felt::from(0xabcu64),
            starting_weapon: 46,
            ticket_amount: 1_000,
            potion_threshold_pct: 50,
            max_potions_per_visit: 10,
        };
        Arc::new(DecisionEngine::new(builder(), settings, Box::new(VitalityStrength)))
    }

    fn runner(chain: &Arc<MockChain>, mode: RunMode, game_id: Option<u64>) -> BotRunner {
        let client: Arc<dyn ChainClient> = chain.clone();
        BotRunner::new(client, engine(), timing(), mode, game_id)
    }

    fn dead() -> GameState {
        fixtures::state(Adventurer {
            health: 0,
            xp: 20,
            ..fixtures::adventurer()
        })
    }

    fn battle(action_count: u32) -> GameState {
        let adventurer = Adventurer {
            xp: 4,
            beast_health: 30,
            action_count,
            ..fixtures::adventurer()
        };
        let beast = Beast {
            id: 25,
            level: 1,
            ..Beast::default()
        };
        fixtures::state_with_beast(adventurer, beast)
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_game_submits_nothing() {
        let chain = Arc::new(MockChain::with_states(vec![dead()]));
        let mut runner = runner(&chain, RunMode::Continuous, Some(7));
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.final_phase, Some(Phase::Dead));
        assert_eq!(summary.transactions, 0);
        assert_eq!(runner.status(), BotStatus::Dead);
        assert!(chain.entrypoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_explore_requests_randomness_first() {
        let chain = Arc::new(MockChain::with_states(vec![fixtures::state(fixtures::adventurer())]));
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.final_phase, Some(Phase::Exploring));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM], vec![ENTRY_EXPLORE]]);
        assert_eq!(runner.status(), BotStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_runs_until_dead() {
        let fresh = fixtures::state(fixtures::adventurer());
        let chain = Arc::new(MockChain::with_states(vec![fresh.clone(), fresh, dead()]));
        let mut runner = runner(&chain, RunMode::Continuous, Some(7));
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.final_phase, Some(Phase::Dead));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_submit_failures_are_retried() {
        let chain = Arc::new(MockChain {
            submit_failures: Mutex::new(2),
            ..MockChain::with_states(vec![fixtures::state(fixtures::adventurer())])
        });
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.transactions, 2);
        assert_eq!(chain.entrypoints().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_in_single_mode() {
        let chain = Arc::new(MockChain {
            submit_failures: Mutex::new(100),
            ..MockChain::with_states(vec![fixtures::state(fixtures::adventurer())])
        });
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        match runner.run().await {
            Err(BotError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(runner.status(), BotStatus::Paused);
        assert_eq!(*chain.submit_failures.lock().unwrap(), 97);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_randomness_never_submits_the_action() {
        let chain = Arc::new(MockChain {
            randomness_never_ready: true,
            ..MockChain::with_states(vec![fixtures::state(fixtures::adventurer())])
        });
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        assert!(matches!(
            runner.run().await,
            Err(BotError::RandomnessTimeout { .. })
        ));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_action_count_blocks_battle_action() {
        let chain = Arc::new(MockChain::with_states(vec![battle(12), battle(13)]));
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        assert!(matches!(runner.run().await, Err(BotError::SaltMismatch { .. })));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_request_skips_action() {
        let chain = Arc::new(MockChain {
            reverted: true,
            ..MockChain::with_states(vec![fixtures::state(fixtures::adventurer())])
        });
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.transactions, 1);
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_submits_nothing() {
        let chain = Arc::new(MockChain::with_states(vec![fixtures::state(fixtures::adventurer())]));
        let mut runner = runner(&chain, RunMode::Single, Some(7)).with_dry_run(true);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.transactions, 0);
        assert_eq!(summary.final_phase, Some(Phase::Exploring));
        assert!(chain.entrypoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_buys_and_adopts_game() {
        let chain = Arc::new(MockChain {
            minted: Some(55),
            ..MockChain::default()
        });
        let mut runner = runner(&chain, RunMode::Single, None);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.game_id, Some(55));
        assert_eq!(runner.game_id(), Some(55));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_APPROVE, ENTRY_BUY_GAME]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mint_lookup_never_buys_twice() {
        let chain = Arc::new(MockChain {
            mint_lookup_fails: true,
            ..MockChain::default()
        });
        let mut runner = runner(&chain, RunMode::Continuous, None);
        assert!(matches!(
            runner.run().await,
            Err(BotError::PurchaseUnconfirmed { .. })
        ));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_APPROVE, ENTRY_BUY_GAME]]);
        assert_eq!(runner.game_id(), None);
        assert_eq!(runner.status(), BotStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_purchase_receipt_never_buys_twice() {
        let chain = Arc::new(MockChain {
            receipt_missing: true,
            minted: Some(7),
            ..MockChain::default()
        });
        let mut runner = runner(&chain, RunMode::Continuous, None);
        assert!(matches!(
            runner.run().await,
            Err(BotError::PurchaseUnconfirmed { .. })
        ));
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_APPROVE, ENTRY_BUY_GAME]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bought_game_is_started_then_played() {
        let unstarted = fixtures::state(Adventurer::default());
        let chain = Arc::new(MockChain {
            minted: Some(7),
            ..MockChain::with_states(vec![unstarted.clone(), unstarted, dead()])
        });
        let mut runner = runner(&chain, RunMode::Continuous, None);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.game_id, Some(7));
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.final_phase, Some(Phase::Dead));
        assert_eq!(
            chain.entrypoints(),
            vec![
                vec![ENTRY_APPROVE, ENTRY_BUY_GAME],
                vec![ENTRY_REQUEST_RANDOM],
                vec![ENTRY_START_GAME],
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_pause_then_resume_in_continuous_mode() {
        let fresh = fixtures::state(fixtures::adventurer());
        let chain = Arc::new(MockChain {
            submit_failures: Mutex::new(3),
            ..MockChain::with_states(vec![fresh.clone(), fresh.clone(), fresh, dead()])
        });
        let mut runner = runner(&chain, RunMode::Continuous, Some(7));
        let started = Instant::now();
        let summary = runner.run().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(timing().pause_after_failure_secs));
        assert_eq!(*chain.submit_failures.lock().unwrap(), 0);
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.transactions, 2);
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM], vec![ENTRY_EXPLORE]]);
        assert_eq!(runner.status(), BotStatus::Dead);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_waits_before_refetching() {
        let chain = Arc::new(MockChain {
            fetch_failures: Mutex::new(1),
            ..MockChain::with_states(vec![dead()])
        });
        let mut runner = runner(&chain, RunMode::Continuous, Some(7));
        let started = Instant::now();
        let summary = runner.run().await.unwrap();
        let t = timing();
        let waited = Duration::from_secs(t.pause_after_failure_secs + t.poll_interval_secs);
        assert!(started.elapsed() >= waited);
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.final_phase, Some(Phase::Dead));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_timeout_skips_action() {
        let chain = Arc::new(MockChain {
            receipt_missing: true,
            ..MockChain::with_states(vec![fixtures::state(fixtures::adventurer())])
        });
        let mut runner = runner(&chain, RunMode::Single, Some(7));
        let started = Instant::now();
        let summary = runner.run().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(timing().receipt_timeout_secs));
        assert_eq!(summary.transactions, 1);
        assert_eq!(chain.entrypoints(), vec![vec![ENTRY_REQUEST_RANDOM]]);
        assert_eq!(runner.status(), BotStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_runner_does_nothing() {
        let chain = Arc::new(MockChain::with_states(vec![fixtures::state(fixtures::adventurer())]));
        let mut runner = runner(&chain, RunMode::Continuous, Some(7));
        set_status(&runner.status_handle(), BotStatus::Stopped);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.cycles, 0);
        assert!(chain.entrypoints().is_empty());
    }

    #[test]
    fn test_run_mode_parsing() {
        assert_eq!("single".parse::<RunMode>().unwrap(), RunMode::Single);
        assert_eq!(" Continuous ".parse::<RunMode>().unwrap(), RunMode::Continuous);
        assert!(matches!("forever".parse::<RunMode>(), Err(BotError::Config(_))));
    }
}
