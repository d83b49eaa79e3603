//! Integer mirrors of the game contract's combat and economy formulas.
//!
//! Every function is pure. Inputs outside the contract's domain (tier not in
//! 1..=5, stats above 31) are programming errors and trip an assertion.

use crate::catalog::{ArmorType, AttackType, Slot};
use crate::state::{Adventurer, Beast, MAX_STAT_VALUE};

pub const STARTING_HEALTH: u16 = 100;
pub const HEALTH_PER_VITALITY: u16 = 15;
pub const MAX_ADVENTURER_HEALTH: u16 = 1023;
pub const XP_PER_LEVEL: u32 = 4;
pub const MAX_GREATNESS: u8 = 20;

pub const BASE_DAMAGE_REDUCTION_PCT: u32 = 75;
/// Floor for damage dealt to beasts.
pub const MIN_DAMAGE: u32 = 4;
/// Floor for damage dealt by beasts.
pub const BEAST_MIN_DAMAGE: u32 = 2;
pub const STRENGTH_BONUS_PCT: u32 = 10;

pub const XP_REWARD_DIVISOR: u32 = 2;
pub const MINIMUM_XP_REWARD: u32 = 4;
pub const XP_DECAY_PER_LEVEL: u32 = 2;
pub const MAX_XP_DECAY: u32 = 95;
pub const GOLD_REWARD_DIVISOR: u32 = 2;
pub const MIN_GOLD_REWARD: u32 = 1;

pub const ITEM_BASE_PRICE: u32 = 4;
pub const MIN_ITEM_PRICE: u32 = 1;
pub const MIN_POTION_PRICE: u32 = 1;
pub const POTION_HEALTH_AMOUNT: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effectiveness {
    Strong,
    Fair,
    Weak,
}

/// Who receives the hit; selects the damage floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Beast,
    Adventurer,
}

impl Target {
    fn min_damage(self) -> u32 {
        match self {
            Target::Beast => MIN_DAMAGE,
            Target::Adventurer => BEAST_MIN_DAMAGE,
        }
    }
}

fn assert_tier(tier: u8) {
    assert!((1..=5).contains(&tier), "tier out of range: {}", tier);
}

pub fn tier_multiplier(tier: u8) -> u32 {
    assert_tier(tier);
    6 - tier as u32
}

pub fn level(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

pub fn max_health(vitality: u8) -> u16 {
    assert!(vitality <= MAX_STAT_VALUE, "vitality out of range: {}", vitality);
    (STARTING_HEALTH + vitality as u16 * HEALTH_PER_VITALITY).min(MAX_ADVENTURER_HEALTH)
}

pub fn greatness(xp: u16) -> u8 {
    let mut g: u32 = 0;
    while g < MAX_GREATNESS as u32 && (g + 1) * (g + 1) <= xp as u32 {
        g += 1;
    }
    (g as u8).max(1)
}

/// Percent chance to escape a beast.
pub fn flee_chance(dexterity: u8, level: u32) -> u32 {
    assert!(level >= 1, "level must be at least 1");
    if dexterity as u32 >= level {
        return 100;
    }
    255 * dexterity as u32 * 100 / (level * 256)
}

pub fn potion_cost(level: u32, charisma: u8) -> u32 {
    level
        .saturating_sub(charisma as u32 * 2)
        .max(MIN_POTION_PRICE)
}

pub fn item_price(tier: u8, charisma: u8) -> u32 {
    (tier_multiplier(tier) * ITEM_BASE_PRICE)
        .saturating_sub(charisma as u32)
        .max(MIN_ITEM_PRICE)
}

pub fn potions_to_full(health: u16, max_health: u16) -> u32 {
    let missing = max_health.saturating_sub(health) as u32;
    missing.div_ceil(POTION_HEALTH_AMOUNT as u32)
}

/// Elemental triangle: Magic > Metal, Blade > Cloth, Bludgeon > Hide.
pub fn effectiveness(attack: AttackType, armor: ArmorType) -> Effectiveness {
    match (attack, armor) {
        (AttackType::Magic, ArmorType::Metal)
        | (AttackType::Blade, ArmorType::Cloth)
        | (AttackType::Bludgeon, ArmorType::Hide) => Effectiveness::Strong,
        (AttackType::Magic, ArmorType::Hide)
        | (AttackType::Blade, ArmorType::Metal)
        | (AttackType::Bludgeon, ArmorType::Cloth) => Effectiveness::Weak,
        _ => Effectiveness::Fair,
    }
}

/// Damage of one hit. `armor` is `None` for an unarmored slot, which takes
/// neutral, unmitigated damage.
pub fn damage(
    attack: AttackType,
    armor: Option<ArmorType>,
    tier: u8,
    base_roll: u32,
    target: Target,
) -> u32 {
    let elemental = match armor.map(|a| effectiveness(attack, a)) {
        Some(Effectiveness::Strong) => base_roll * 3 / 2,
        Some(Effectiveness::Weak) => base_roll / 2,
        _ => base_roll,
    };
    let scaled = elemental * tier_multiplier(tier);
    let mitigated = if armor.is_some() {
        scaled * BASE_DAMAGE_REDUCTION_PCT / 100
    } else {
        scaled
    };
    mitigated.max(target.min_damage())
}

pub fn strength_bonus(damage: u32, strength: u8) -> u32 {
    damage * strength as u32 * STRENGTH_BONUS_PCT / 100
}

pub fn gold_reward(tier: u8, level: u32) -> u32 {
    (tier_multiplier(tier) * level / GOLD_REWARD_DIVISOR).max(MIN_GOLD_REWARD)
}

/// Obstacles pay half of what a beast of the same tier and level pays.
/// The reward decays with the adventurer's level, by at most `MAX_XP_DECAY` percent.
pub fn xp_reward(tier: u8, level: u32, is_beast: bool, adventurer_level: u32) -> u32 {
    let mut base = tier_multiplier(tier) * level;
    if !is_beast {
        base /= 2;
    }
    let decay = (adventurer_level * XP_DECAY_PER_LEVEL).min(MAX_XP_DECAY);
    (base / XP_REWARD_DIVISOR * (100 - decay) / 100).max(MINIMUM_XP_REWARD)
}

/// Damage the adventurer's weapon is expected to deal to `beast` per hit.
pub fn expected_damage_dealt(adventurer: &Adventurer, beast: &Beast) -> u32 {
    let weapon = adventurer.equipment.weapon();
    let attack = weapon
        .info()
        .filter(|info| info.slot == Slot::Weapon)
        .and_then(|info| info.item_type.attack_type().map(|a| (a, info.tier)));
    let (attack, tier) = match attack {
        Some(found) => found,
        None => return MIN_DAMAGE,
    };
    let armor = beast.kind().map(|k| k.armor_type());
    let hit = damage(attack, armor, tier, weapon.greatness() as u32, Target::Beast);
    hit + strength_bonus(hit, adventurer.stats.strength)
}

/// Damage `beast` is expected to deal per hit, averaged over the armor slots it may strike.
pub fn expected_damage_taken(adventurer: &Adventurer, beast: &Beast) -> u32 {
    let info = match beast.info() {
        Some(info) => info,
        None => return 0,
    };
    let attack = info.kind.attack_type();
    let roll = (beast.level as u32).max(1);
    let total: u32 = Slot::ARMOR
        .iter()
        .map(|&slot| {
            let armor = adventurer
                .equipment
                .get(slot)
                .info()
                .and_then(|i| i.item_type.armor_type());
            damage(attack, armor, info.tier, roll, Target::Adventurer)
        })
        .sum();
    total / Slot::ARMOR.len() as u32
}
