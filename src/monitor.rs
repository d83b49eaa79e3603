use crate::bot::RunSummary;
use crate::combat;
use crate::state::GameState;
use crate::strategy::{BotDecision, Phase};
use colored::*;
use log::{info, warn};

/// Something that changed between two snapshots of the same game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    LevelUp { from: u32, to: u32 },
    Damaged(u16),
    Healed(u16),
    GoldChanged(i32),
    BeastEncountered { name: &'static str, level: u16 },
    BeastCleared,
    Died,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    health: u16,
    level: u32,
    gold: u16,
    in_battle: bool,
    dead: bool,
}

impl Snapshot {
    fn of(state: &GameState) -> Self {
        let adventurer = &state.adventurer;
        Self {
            health: adventurer.health,
            level: adventurer.level(),
            gold: adventurer.gold,
            in_battle: adventurer.in_battle(),
            dead: adventurer.is_dead(),
        }
    }
}

/// Logs what happened to a game between polling cycles.
#[derive(Debug, Default)]
pub struct GameMonitor {
    last: Option<Snapshot>,
}

impl GameMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: &GameState) -> Vec<GameEvent> {
        let now = Snapshot::of(state);
        let events = match self.last {
            Some(prev) => diff(&prev, &now, state),
            None => {
                info!("📊 Tracking game {}", state.game_id);
                Vec::new()
            }
        };
        self.last = Some(now);

        for event in &events {
            log_event(state.game_id, event);
        }
        events
    }
}

fn diff(prev: &Snapshot, now: &Snapshot, state: &GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if now.dead && !prev.dead {
        events.push(GameEvent::Died);
        return events;
    }
    if now.level > prev.level {
        events.push(GameEvent::LevelUp {
            from: prev.level,
            to: now.level,
        });
    }
    if now.health < prev.health {
        events.push(GameEvent::Damaged(prev.health - now.health));
    } else if now.health > prev.health {
        events.push(GameEvent::Healed(now.health - prev.health));
    }
    if now.gold != prev.gold {
        events.push(GameEvent::GoldChanged(now.gold as i32 - prev.gold as i32));
    }
    if now.in_battle && !prev.in_battle {
        events.push(GameEvent::BeastEncountered {
            name: state.beast.name(),
            level: state.beast.level,
        });
    } else if !now.in_battle && prev.in_battle {
        events.push(GameEvent::BeastCleared);
    }
    events
}

fn log_event(game_id: u64, event: &GameEvent) {
    match event {
        GameEvent::LevelUp { from, to } => {
            info!("{}", format!("⬆️  game {}: level {} → {}", game_id, from, to).green())
        }
        GameEvent::Damaged(amount) => {
            warn!("{}", format!("🩸 game {}: took {} damage", game_id, amount).yellow())
        }
        GameEvent::Healed(amount) => {
            info!("{}", format!("💚 game {}: healed {}", game_id, amount).green())
        }
        GameEvent::GoldChanged(delta) if *delta > 0 => {
            info!("{}", format!("💰 game {}: +{} gold", game_id, delta).green())
        }
        GameEvent::GoldChanged(delta) => info!("🛒 game {}: spent {} gold", game_id, -delta),
        GameEvent::BeastEncountered { name, level } => {
            info!("{}", format!("👹 game {}: {} (level {}) appears", game_id, name, level).cyan())
        }
        GameEvent::BeastCleared => info!("🏁 game {}: battle over", game_id),
        GameEvent::Died => warn!("{}", format!("💀 game {}: adventurer died", game_id).red()),
    }
}

pub fn print_state(state: &GameState) {
    let adventurer = &state.adventurer;
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!("{}", format!("Game #{}", state.game_id).cyan().bold());
    println!("{}", "═══════════════════════════════════════".cyan());

    println!(
        "  Health: {}/{}   Level: {} ({} xp)   Gold: {}",
        adventurer.health,
        adventurer.max_health(),
        adventurer.level(),
        adventurer.xp,
        adventurer.gold
    );
    let s = &adventurer.stats;
    println!(
        "  STR {} DEX {} VIT {} INT {} WIS {} CHA {} LUK {}   (+{} unspent)",
        s.strength,
        s.dexterity,
        s.vitality,
        s.intelligence,
        s.wisdom,
        s.charisma,
        s.luck,
        adventurer.stat_upgrades_available
    );
    println!("  Actions taken: {}", adventurer.action_count);

    println!("\n{}", "Equipment:".yellow());
    for (slot, item) in adventurer.equipment.iter() {
        if let Some(info) = item.info() {
            println!(
                "  {:<7} {} (T{}, greatness {})",
                slot.as_str(),
                info.name,
                info.tier,
                item.greatness()
            );
        }
    }

    if !state.bag.is_empty() {
        let names: Vec<&str> = state
            .bag
            .items()
            .iter()
            .filter_map(|i| i.info().map(|info| info.name))
            .collect();
        println!("\n{} {}", "Bag:".yellow(), names.join(", "));
    }

    if adventurer.in_battle() {
        if let Some(info) = state.beast.info() {
            let level = adventurer.level();
            println!(
                "\n{} {} (T{}, level {}, {} health left)",
                "Beast:".red(),
                info.name,
                info.tier,
                state.beast.level,
                adventurer.beast_health
            );
            println!(
                "  Reward if slain: {} xp, {} gold",
                combat::xp_reward(info.tier, state.beast.level as u32, true, level),
                combat::gold_reward(info.tier, state.beast.level as u32)
            );
            println!(
                "  Expected per hit: deal {}, take {}   Flee chance: {}%",
                combat::expected_damage_dealt(adventurer, &state.beast),
                combat::expected_damage_taken(adventurer, &state.beast),
                combat::flee_chance(adventurer.stats.dexterity, level)
            );
        }
    }

    if !state.market.is_empty() {
        println!("\n{} {} item(s) on offer", "Market:".yellow(), state.market.len());
    }
    println!("{}", "═══════════════════════════════════════\n".cyan());
}

pub fn print_decision(phase: Phase, decision: &BotDecision) {
    println!("{} {}", "Phase:".bold(), phase.to_string().green());
    println!("{} {:?}: {}", "Decision:".bold(), decision.action, decision.reason);
    for call in &decision.calls {
        println!(
            "  {:#x}.{}({})",
            call.contract_address,
            call.entrypoint,
            call.calldata.join(", ")
        );
    }
}

pub fn print_summary(summary: &RunSummary) {
    let game = summary
        .game_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let phase = summary
        .final_phase
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}",
        format!(
            "Game {}: {} cycle(s), {} transaction(s), final phase {}",
            game, summary.cycles, summary.transactions, phase
        )
        .cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{fixtures, Adventurer, Beast};

    #[test]
    fn test_first_observation_is_quiet() {
        let mut monitor = GameMonitor::new();
        assert!(monitor.observe(&fixtures::state(fixtures::adventurer())).is_empty());
    }

    #[test]
    fn test_reports_battle_progress() {
        let mut monitor = GameMonitor::new();
        monitor.observe(&fixtures::state(fixtures::adventurer()));

        let fighting = Adventurer {
            health: 90,
            beast_health: 20,
            ..fixtures::adventurer()
        };
        let beast = Beast {
            id: 29,
            level: 4,
            ..Beast::default()
        };
        let events = monitor.observe(&fixtures::state_with_beast(fighting, beast));
        assert_eq!(
            events,
            vec![
                GameEvent::Damaged(10),
                GameEvent::BeastEncountered {
                    name: "Dragon",
                    level: 4
                },
            ]
        );

        let won = Adventurer {
            health: 90,
            xp: 8,
            gold: 12,
            ..fixtures::adventurer()
        };
        let events = monitor.observe(&fixtures::state(won));
        assert_eq!(
            events,
            vec![
                GameEvent::LevelUp { from: 1, to: 3 },
                GameEvent::GoldChanged(12),
                GameEvent::BeastCleared,
            ]
        );
    }

    #[test]
    fn test_death_supersedes_other_changes() {
        let mut monitor = GameMonitor::new();
        monitor.observe(&fixtures::state(fixtures::adventurer()));
        let dead = Adventurer {
            health: 0,
            gold: 40,
            ..fixtures::adventurer()
        };
        assert_eq!(monitor.observe(&fixtures::state(dead)), vec![GameEvent::Died]);
    }
}
