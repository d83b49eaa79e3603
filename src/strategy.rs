use crate::calls::{CallBuilder, CallDescriptor, GameAction, ItemPurchase};
use crate::catalog::Slot;
use crate::combat;
use crate::error::{BotError, Result};
use crate::state::{Adventurer, GameState, Item, Stats, BAG_SIZE, MAX_STAT_VALUE};
use serde::{Deserialize, Serialize};
use starknet::core::types::Felt;
use std::fmt;

/// Logical phase of a game, derived fresh from every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    StarterBeast,
    InBattle,
    StatUpgrade,
    Shopping,
    Exploring,
    Dead,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::StarterBeast => "starter_beast",
            Phase::InBattle => "in_battle",
            Phase::StatUpgrade => "stat_upgrade",
            Phase::Shopping => "shopping",
            Phase::Exploring => "exploring",
            Phase::Dead => "dead",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Phase::Dead
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    None,
    BuyGame,
    StartGame,
    Explore,
    Attack,
    Flee,
    UpgradeStats,
    BuyItems,
    Equip,
}

/// The single next step for a game. `calls` are ordered: a randomness request
/// always comes immediately before the action that consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotDecision {
    pub action: ActionKind,
    pub reason: String,
    pub actions: Vec<GameAction>,
    pub calls: Vec<CallDescriptor>,
}

impl BotDecision {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The leading randomness request, if the decision starts with one.
    pub fn randomness_request(&self) -> Option<&GameAction> {
        self.actions.first().filter(|a| a.is_randomness_request())
    }
}

/// Chooses how to spend stat points. Implementations must allocate exactly
/// `points` unless every stat is already capped.
pub trait StatPolicy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn allocate(&self, adventurer: &Adventurer, points: u8) -> Stats;
}

const STRENGTH: usize = 0;
const DEXTERITY: usize = 1;
const VITALITY: usize = 2;
const INTELLIGENCE: usize = 3;
const WISDOM: usize = 4;
const CHARISMA: usize = 5;
const LUCK: usize = 6;

fn stats_to_array(s: &Stats) -> [u8; 7] {
    [s.strength, s.dexterity, s.vitality, s.intelligence, s.wisdom, s.charisma, s.luck]
}

fn stats_from_array(a: [u8; 7]) -> Stats {
    Stats {
        strength: a[STRENGTH],
        dexterity: a[DEXTERITY],
        vitality: a[VITALITY],
        intelligence: a[INTELLIGENCE],
        wisdom: a[WISDOM],
        charisma: a[CHARISMA],
        luck: a[LUCK],
    }
}

/// Hands out points one at a time; `pick` returns stat indices in order of preference.
fn allocate_with<F>(adventurer: &Adventurer, points: u8, mut pick: F) -> Stats
where
    F: FnMut(&[u8; 7]) -> Vec<usize>,
{
    let base = stats_to_array(&adventurer.stats);
    let mut added = [0u8; 7];
    for _ in 0..points {
        let current: [u8; 7] = std::array::from_fn(|i| base[i] + added[i]);
        let choice = pick(&current)
            .into_iter()
            .chain([DEXTERITY, CHARISMA, INTELLIGENCE, WISDOM, LUCK, STRENGTH, VITALITY])
            .find(|&i| current[i] < MAX_STAT_VALUE);
        match choice {
            Some(i) => added[i] += 1,
            None => break,
        }
    }
    stats_from_array(added)
}

/// Default policy: alternate vitality and strength, vitality first.
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalityStrength;

impl StatPolicy for VitalityStrength {
    fn name(&self) -> &'static str {
        "vitality_strength"
    }

    fn allocate(&self, adventurer: &Adventurer, points: u8) -> Stats {
        allocate_with(adventurer, points, |current| {
            if current[VITALITY] <= current[STRENGTH] {
                vec![VITALITY, STRENGTH]
            } else {
                vec![STRENGTH, VITALITY]
            }
        })
    }
}

/// Raise dexterity until fleeing always succeeds, then vitality.
#[derive(Debug, Clone, Copy, Default)]
pub struct DexterityFirst;

impl StatPolicy for DexterityFirst {
    fn name(&self) -> &'static str {
        "dexterity_first"
    }

    fn allocate(&self, adventurer: &Adventurer, points: u8) -> Stats {
        let level = adventurer.level();
        allocate_with(adventurer, points, |current| {
            if (current[DEXTERITY] as u32) < level {
                vec![DEXTERITY, VITALITY]
            } else {
                vec![VITALITY, STRENGTH]
            }
        })
    }
}

pub const STAT_POLICIES: [&str; 2] = ["vitality_strength", "dexterity_first"];

pub fn stat_policy(name: &str) -> Option<Box<dyn StatPolicy>> {
    match name {
        "vitality_strength" => Some(Box::new(VitalityStrength)),
        "dexterity_first" => Some(Box::new(DexterityFirst)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct StrategySettings {
    pub player_name: String,
    pub player_address: Felt,
    pub starting_weapon: u8,
    pub ticket_amount: u128,
    /// Buy potions below this share of max health.
    pub potion_threshold_pct: u8,
    pub max_potions_per_visit: u8,
}

/// Maps a snapshot to exactly one decision. Holds only immutable settings, so
/// identical snapshots always produce identical decisions.
#[derive(Debug)]
pub struct DecisionEngine {
    builder: CallBuilder,
    settings: StrategySettings,
    policy: Box<dyn StatPolicy>,
}

impl DecisionEngine {
    pub fn new(
        builder: CallBuilder,
        settings: StrategySettings,
        policy: Box<dyn StatPolicy>,
    ) -> Self {
        Self {
            builder,
            settings,
            policy,
        }
    }

    pub fn builder(&self) -> &CallBuilder {
        &self.builder
    }

    /// `None` means there is no game yet.
    pub fn decide(&self, state: Option<&GameState>) -> (Phase, BotDecision) {
        let state = match state {
            Some(state) => state,
            None => return self.buy_game(),
        };
        let adventurer = &state.adventurer;

        if adventurer.is_dead() {
            return (
                Phase::Dead,
                self.decision(ActionKind::None, "adventurer is dead".to_string(), Vec::new()),
            );
        }
        if adventurer.in_battle() {
            return self.battle(state);
        }
        if adventurer.stat_upgrades_available > 0 {
            return self.upgrade_stats(state);
        }
        if let Some(decision) = self.shop(state) {
            return (Phase::Shopping, decision);
        }
        self.explore(state)
    }

    fn decision(
        &self,
        action: ActionKind,
        reason: String,
        actions: Vec<GameAction>,
    ) -> BotDecision {
        let calls = self.builder.build_all(&actions);
        BotDecision {
            action,
            reason,
            actions,
            calls,
        }
    }

    fn buy_game(&self) -> (Phase, BotDecision) {
        let actions = vec![
            GameAction::ApproveTicket {
                amount: self.settings.ticket_amount,
            },
            GameAction::BuyGame {
                player_name: self.settings.player_name.clone(),
                recipient: self.settings.player_address,
            },
        ];
        (
            Phase::Idle,
            self.decision(ActionKind::BuyGame, "no game yet, buying one".to_string(), actions),
        )
    }

    /// Bootstrap step for a game this runner just bought. A fresh game reads
    /// as health 0, so `decide` would call it dead.
    pub fn start_game(&self, game_id: u64) -> (Phase, BotDecision) {
        let actions = vec![
            GameAction::RequestRandomForExplore { game_id, xp: 0 },
            GameAction::StartGame {
                game_id,
                weapon: self.settings.starting_weapon,
            },
        ];
        (
            Phase::Idle,
            self.decision(
                ActionKind::StartGame,
                format!("game {} bought but not started", game_id),
                actions,
            ),
        )
    }

    fn battle(&self, state: &GameState) -> (Phase, BotDecision) {
        let adventurer = &state.adventurer;
        let request = GameAction::RequestRandomForBattle {
            game_id: state.game_id,
            xp: adventurer.xp,
            action_count: adventurer.action_count,
        };
        let attack = GameAction::Attack {
            game_id: state.game_id,
            to_the_death: false,
        };

        if adventurer.xp == 0 {
            return (
                Phase::StarterBeast,
                self.decision(
                    ActionKind::Attack,
                    format!("starter {} cannot be fled", state.beast.name()),
                    vec![request, attack],
                ),
            );
        }

        let dealt = combat::expected_damage_dealt(adventurer, &state.beast);
        let taken = combat::expected_damage_taken(adventurer, &state.beast);
        let chance = combat::flee_chance(adventurer.stats.dexterity, adventurer.level());

        if dealt >= taken || chance == 0 {
            let reason = format!(
                "attacking {}: deal {} vs take {} (flee {}%)",
                state.beast.name(),
                dealt,
                taken,
                chance
            );
            let decision = self.decision(ActionKind::Attack, reason, vec![request, attack]);
            return (Phase::InBattle, decision);
        }

        let flee = GameAction::Flee {
            game_id: state.game_id,
            to_the_death: false,
        };
        let reason = format!(
            "fleeing {}: deal {} vs take {} (flee {}%)",
            state.beast.name(),
            dealt,
            taken,
            chance
        );
        (Phase::InBattle, self.decision(ActionKind::Flee, reason, vec![request, flee]))
    }

    fn upgrade_stats(&self, state: &GameState) -> (Phase, BotDecision) {
        let points = state.adventurer.stat_upgrades_available;
        let stats = self.policy.allocate(&state.adventurer, points);
        let reason = format!("{} stat point(s) via {}", points, self.policy.name());
        let actions = vec![GameAction::SelectStatUpgrades {
            game_id: state.game_id,
            stats,
        }];
        (Phase::StatUpgrade, self.decision(ActionKind::UpgradeStats, reason, actions))
    }

    fn shop(&self, state: &GameState) -> Option<BotDecision> {
        if let Some(item) = best_bag_upgrade(state) {
            let reason = format!(
                "equipping {} from bag",
                item.info().map(|i| i.name).unwrap_or("item")
            );
            let actions = vec![GameAction::Equip {
                game_id: state.game_id,
                items: vec![item.id],
            }];
            return Some(self.decision(ActionKind::Equip, reason, actions));
        }

        let adventurer = &state.adventurer;
        let mut gold = adventurer.gold as u32;
        let mut reasons = Vec::new();

        let potions = self.potions_to_buy(adventurer);
        if potions > 0 {
            let each = combat::potion_cost(adventurer.level(), adventurer.stats.charisma);
            gold -= potions as u32 * each;
            reasons.push(format!("{} potion(s)", potions));
        }

        let purchases = market_upgrades(state, gold);
        if potions == 0 && purchases.is_empty() {
            return None;
        }
        for p in &purchases {
            if let Some(info) = crate::catalog::item_info(p.item_id) {
                reasons.push(info.name.to_string());
            }
        }

        let mut actions = Vec::new();
        let to_drop = bag_overflow(state, &purchases);
        if !to_drop.is_empty() {
            actions.push(GameAction::Drop {
                game_id: state.game_id,
                items: to_drop,
            });
        }
        actions.push(GameAction::BuyItems {
            game_id: state.game_id,
            potions,
            items: purchases,
        });
        let reason = format!("buying {}", reasons.join(", "));
        Some(self.decision(ActionKind::BuyItems, reason, actions))
    }

    fn potions_to_buy(&self, adventurer: &Adventurer) -> u8 {
        let max_health = adventurer.max_health() as u32;
        let threshold = max_health * self.settings.potion_threshold_pct as u32;
        if (adventurer.health as u32) * 100 >= threshold {
            return 0;
        }
        let price = combat::potion_cost(adventurer.level(), adventurer.stats.charisma);
        let needed = combat::potions_to_full(adventurer.health, adventurer.max_health());
        let affordable = adventurer.gold as u32 / price;
        needed
            .min(affordable)
            .min(self.settings.max_potions_per_visit as u32) as u8
    }

    fn explore(&self, state: &GameState) -> (Phase, BotDecision) {
        let actions = vec![
            GameAction::RequestRandomForExplore {
                game_id: state.game_id,
                xp: state.adventurer.xp,
            },
            GameAction::Explore {
                game_id: state.game_id,
                till_beast: false,
            },
        ];
        (
            Phase::Exploring,
            self.decision(ActionKind::Explore, "nothing pending, exploring".to_string(), actions),
        )
    }
}

/// Bag item with the largest power gain over what its slot currently holds.
fn best_bag_upgrade(state: &GameState) -> Option<Item> {
    let equipment = &state.adventurer.equipment;
    state
        .bag
        .items()
        .iter()
        .filter_map(|item| {
            let slot = item.slot()?;
            let current = equipment.get(slot).power();
            (item.power() > current).then(|| (item.power() - current, *item))
        })
        .max_by_key(|(gain, item)| (*gain, std::cmp::Reverse(item.id)))
        .map(|(_, item)| item)
}

/// Affordable market items that beat the equipped item of their slot, best gain
/// first, one per slot.
fn market_upgrades(state: &GameState, mut gold: u32) -> Vec<ItemPurchase> {
    let adventurer = &state.adventurer;
    let mut candidates: Vec<(u32, u32, u8, Slot)> = state
        .market
        .iter()
        .filter_map(|&id| {
            let item = Item::new(id, 0);
            let info = item.info()?;
            let current = adventurer.equipment.get(info.slot).power();
            if item.power() <= current {
                return None;
            }
            let price = combat::item_price(info.tier, adventurer.stats.charisma);
            Some((item.power() - current, price, id, info.slot))
        })
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut taken: Vec<Slot> = Vec::new();
    let mut purchases = Vec::new();
    for (_, price, id, slot) in candidates {
        if price > gold || taken.contains(&slot) {
            continue;
        }
        gold -= price;
        taken.push(slot);
        purchases.push(ItemPurchase { item_id: id, equip: true });
    }
    purchases
}

/// Weakest bag items to drop so that gear displaced by `purchases` fits in the bag.
fn bag_overflow(state: &GameState, purchases: &[ItemPurchase]) -> Vec<u8> {
    let displaced = purchases
        .iter()
        .filter_map(|p| crate::catalog::item_info(p.item_id))
        .filter(|info| !state.adventurer.equipment.get(info.slot).is_empty())
        .count();
    let free = BAG_SIZE - state.bag.len();
    if displaced <= free {
        return Vec::new();
    }
    let mut items: Vec<Item> = state.bag.items().to_vec();
    items.sort_by_key(|i| (i.power(), i.id));
    items.into_iter().take(displaced - free).map(|i| i.id).collect()
}

/// Rejects decisions the contract would refuse. These are engine defects, not
/// transient failures.
pub fn check_legality(state: Option<&GameState>, decision: &BotDecision) -> Result<()> {
    let state = match state {
        Some(state) => state,
        None => {
            let bootstrap_only = decision
                .actions
                .iter()
                .all(|a| {
                    matches!(a, GameAction::ApproveTicket { .. } | GameAction::BuyGame { .. })
                });
            if !bootstrap_only {
                return Err(BotError::IllegalAction("game actions without a game".to_string()));
            }
            return Ok(());
        }
    };
    let adventurer = &state.adventurer;

    let starting = decision
        .actions
        .iter()
        .any(|a| matches!(a, GameAction::StartGame { .. }));
    if starting && adventurer.has_started() {
        return Err(BotError::IllegalAction(format!(
            "game {} is already under way",
            state.game_id
        )));
    }
    if adventurer.is_dead() && !starting && !decision.actions.is_empty() {
        return Err(BotError::IllegalAction("acting while dead".to_string()));
    }

    for (i, action) in decision.actions.iter().enumerate() {
        if let Some(id) = action.game_id() {
            if id != state.game_id {
                return Err(BotError::IllegalAction(format!(
                    "{} targets game {} but state is for game {}",
                    action.name(),
                    id,
                    state.game_id
                )));
            }
        }
        if action.needs_randomness() {
            let preceded = i > 0 && decision.actions[i - 1].is_randomness_request();
            if !preceded {
                return Err(BotError::IllegalAction(format!(
                    "{} is not preceded by a randomness request",
                    action.name()
                )));
            }
        }
        match action {
            GameAction::RequestRandomForBattle { xp, action_count, .. } => {
                if *action_count != adventurer.action_count || *xp != adventurer.xp {
                    let expected = crate::salt::battle_salt(
                        state.game_id,
                        adventurer.xp,
                        adventurer.action_count,
                    );
                    let observed = action.salt().unwrap_or(Felt::ZERO);
                    return Err(BotError::SaltMismatch {
                        expected: expected.to_string(),
                        observed: observed.to_string(),
                    });
                }
            }
            GameAction::Attack { .. } | GameAction::Flee { .. } if !adventurer.in_battle() => {
                return Err(BotError::IllegalAction(format!("{} without a beast", action.name())));
            }
            GameAction::Flee { .. } if adventurer.xp == 0 => {
                return Err(BotError::IllegalAction("fleeing the starter beast".to_string()));
            }
            GameAction::Explore { .. }
            | GameAction::BuyItems { .. }
            | GameAction::Equip { .. }
            | GameAction::Drop { .. }
            | GameAction::SelectStatUpgrades { .. }
                if adventurer.in_battle() =>
            {
                return Err(BotError::IllegalAction(format!("{} during battle", action.name())));
            }
            GameAction::SelectStatUpgrades { stats, .. } => {
                if stats.total() != adventurer.stat_upgrades_available as u32 {
                    return Err(BotError::IllegalAction(format!(
                        "allocated {} stat points, {} available",
                        stats.total(),
                        adventurer.stat_upgrades_available
                    )));
                }
                let before = stats_to_array(&adventurer.stats);
                let added = stats_to_array(stats);
                let over_cap = before
                    .iter()
                    .zip(added.iter())
                    .any(|(b, a)| *b as u16 + *a as u16 > MAX_STAT_VALUE as u16);
                if over_cap {
                    return Err(BotError::IllegalAction("stat above cap".to_string()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
