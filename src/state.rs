use crate::catalog::{self, BeastInfo, BeastKind, ItemInfo, Slot};
use crate::combat;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use thiserror::Error;

/// Words in the adventurer header.
pub const ADVENTURER_WORDS: usize = 14;
/// (id, xp) for each of the eight equipment slots.
pub const EQUIPMENT_WORDS: usize = 16;
pub const BAG_SIZE: usize = 15;
/// (id, xp) for each bag slot, then the `mutated` flag.
pub const BAG_WORDS: usize = BAG_SIZE * 2 + 1;
pub const BEAST_WORDS: usize = 8;
/// Everything before the market ids, including the market length word.
pub const MIN_STATE_WORDS: usize =
    ADVENTURER_WORDS + EQUIPMENT_WORDS + BAG_WORDS + BEAST_WORDS + 1;

pub const MAX_STAT_VALUE: u8 = 31;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected at least {expected} words, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("field `{field}` is not a hex number: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field `{field}` value {value} is out of range")]
    OutOfRange { field: &'static str, value: u128 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub strength: u8,
    pub dexterity: u8,
    pub vitality: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
    pub luck: u8,
}

impl Stats {
    pub fn total(&self) -> u32 {
        [
            self.strength,
            self.dexterity,
            self.vitality,
            self.intelligence,
            self.wisdom,
            self.charisma,
            self.luck,
        ]
        .iter()
        .map(|&s| s as u32)
        .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: u8,
    pub xp: u16,
}

impl Item {
    pub const EMPTY: Item = Item { id: 0, xp: 0 };

    pub fn new(id: u8, xp: u16) -> Self {
        Self { id, xp }
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    pub fn info(&self) -> Option<&'static ItemInfo> {
        catalog::item_info(self.id)
    }

    pub fn greatness(&self) -> u8 {
        combat::greatness(self.xp)
    }

    pub fn tier(&self) -> Option<u8> {
        self.info().map(|i| i.tier)
    }

    pub fn slot(&self) -> Option<Slot> {
        self.info().map(|i| i.slot)
    }

    /// Comparable strength of an item: greatness scaled by tier. Empty items score 0.
    pub fn power(&self) -> u32 {
        match self.info() {
            Some(info) => self.greatness() as u32 * combat::tier_multiplier(info.tier),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    items: [Item; 8],
}

impl Equipment {
    pub fn new(items: [Item; 8]) -> Self {
        Self { items }
    }

    pub fn get(&self, slot: Slot) -> Item {
        self.items[slot.index()]
    }

    pub fn weapon(&self) -> Item {
        self.get(Slot::Weapon)
    }

    /// Copy with `item` placed in `slot`.
    pub fn with(mut self, slot: Slot, item: Item) -> Self {
        self.items[slot.index()] = item;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Item)> + '_ {
        Slot::ALL.iter().map(move |&slot| (slot, self.get(slot)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bag {
    slots: Vec<Item>,
    pub mutated: bool,
}

impl Bag {
    /// Builds a bag from occupied items; at most `BAG_SIZE` are kept.
    pub fn new(items: Vec<Item>, mutated: bool) -> Self {
        let slots = items
            .into_iter()
            .filter(|i| !i.is_empty())
            .take(BAG_SIZE)
            .collect();
        Self { slots, mutated }
    }

    pub fn items(&self) -> &[Item] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= BAG_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adventurer {
    pub health: u16,
    pub xp: u32,
    pub gold: u16,
    pub beast_health: u16,
    pub stat_upgrades_available: u8,
    pub stats: Stats,
    pub equipment: Equipment,
    pub item_specials_seed: u16,
    pub action_count: u32,
}

impl Adventurer {
    pub fn level(&self) -> u32 {
        combat::level(self.xp)
    }

    pub fn max_health(&self) -> u16 {
        combat::max_health(self.stats.vitality)
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn in_battle(&self) -> bool {
        self.beast_health > 0
    }

    /// A bought game that was never started has no health, no xp and no weapon.
    pub fn has_started(&self) -> bool {
        self.health > 0 || self.xp > 0 || !self.equipment.weapon().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Beast {
    pub id: u8,
    pub seed: u64,
    pub health: u16,
    pub level: u16,
    pub specials: [u8; 3],
    pub is_collectable: bool,
}

impl Beast {
    pub fn info(&self) -> Option<BeastInfo> {
        catalog::beast_info(self.id)
    }

    pub fn name(&self) -> &'static str {
        self.info().map(|i| i.name).unwrap_or("Unknown")
    }

    pub fn tier(&self) -> Option<u8> {
        self.info().map(|i| i.tier)
    }

    pub fn kind(&self) -> Option<BeastKind> {
        self.info().map(|i| i.kind)
    }

    pub fn special_prefix(&self) -> Option<u8> {
        Some(self.specials[1]).filter(|&s| s != 0)
    }

    pub fn special_suffix(&self) -> Option<u8> {
        Some(self.specials[2]).filter(|&s| s != 0)
    }
}

/// One polling cycle's view of a game. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: u64,
    pub adventurer: Adventurer,
    pub bag: Bag,
    pub beast: Beast,
    pub market: Vec<u8>,
}

impl GameState {
    pub fn new(
        game_id: u64,
        adventurer: Adventurer,
        bag: Bag,
        beast: Beast,
        market: Vec<u8>,
    ) -> Self {
        Self {
            game_id,
            adventurer,
            bag,
            beast,
            market,
        }
    }

    /// Decodes the fixed-order word sequence returned by the game's state view.
    pub fn decode<S: AsRef<str>>(game_id: u64, words: &[S]) -> Result<Self, DecodeError> {
        if words.len() < MIN_STATE_WORDS {
            return Err(DecodeError::Truncated {
                expected: MIN_STATE_WORDS,
                actual: words.len(),
            });
        }
        let mut cursor = WordCursor::new(words);

        let health = cursor.next("health")?;
        let xp = cursor.next("xp")?;
        let gold = cursor.next("gold")?;
        let beast_health = cursor.next("beast_health")?;
        let stat_upgrades_available = cursor.next("stat_upgrades_available")?;
        let stats = Stats {
            strength: cursor.stat("strength")?,
            dexterity: cursor.stat("dexterity")?,
            vitality: cursor.stat("vitality")?,
            intelligence: cursor.stat("intelligence")?,
            wisdom: cursor.stat("wisdom")?,
            charisma: cursor.stat("charisma")?,
            luck: cursor.stat("luck")?,
        };
        let item_specials_seed = cursor.next("item_specials_seed")?;
        let action_count = cursor.next("action_count")?;

        let mut equipped = [Item::EMPTY; 8];
        for slot in equipped.iter_mut() {
            *slot = cursor.item("equipment")?;
        }

        let mut bag_items = Vec::with_capacity(BAG_SIZE);
        for _ in 0..BAG_SIZE {
            bag_items.push(cursor.item("bag")?);
        }
        let mutated = cursor.flag("bag_mutated")?;

        let beast = Beast {
            id: cursor.next("beast_id")?,
            seed: cursor.next("beast_seed")?,
            health: cursor.next("beast_starting_health")?,
            level: cursor.next("beast_level")?,
            specials: [
                cursor.next("beast_special1")?,
                cursor.next("beast_special2")?,
                cursor.next("beast_special3")?,
            ],
            is_collectable: cursor.flag("beast_is_collectable")?,
        };

        let market_len: usize = cursor.next("market_len")?;
        if cursor.remaining() < market_len {
            return Err(DecodeError::Truncated {
                expected: MIN_STATE_WORDS + market_len,
                actual: words.len(),
            });
        }
        let mut market = Vec::with_capacity(market_len);
        for _ in 0..market_len {
            market.push(cursor.next("market_item")?);
        }

        let adventurer = Adventurer {
            health,
            xp,
            gold,
            beast_health,
            stat_upgrades_available,
            stats,
            equipment: Equipment::new(equipped),
            item_specials_seed,
            action_count,
        };

        Ok(Self::new(game_id, adventurer, Bag::new(bag_items, mutated), beast, market))
    }
}

struct WordCursor<'a, S> {
    words: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> WordCursor<'a, S> {
    fn new(words: &'a [S]) -> Self {
        Self { words, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }

    fn next<T: TryFrom<u128>>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        let raw = self.words.get(self.pos).ok_or(DecodeError::Truncated {
            expected: self.pos + 1,
            actual: self.words.len(),
        })?;
        self.pos += 1;
        let value = parse_word(field, raw.as_ref())?;
        T::try_from(value).map_err(|_| DecodeError::OutOfRange { field, value })
    }

    fn stat(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        let value: u8 = self.next(field)?;
        if value > MAX_STAT_VALUE {
            return Err(DecodeError::OutOfRange {
                field,
                value: value as u128,
            });
        }
        Ok(value)
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.next::<u8>(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::OutOfRange {
                field,
                value: other as u128,
            }),
        }
    }

    fn item(&mut self, field: &'static str) -> Result<Item, DecodeError> {
        let id = self.next(field)?;
        let xp = self.next(field)?;
        Ok(Item { id, xp })
    }
}

fn parse_word(field: &'static str, raw: &str) -> Result<u128, DecodeError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u128::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => DecodeError::OutOfRange {
            field,
            value: u128::MAX,
        },
        _ => DecodeError::NotNumeric {
            field,
            value: raw.to_string(),
        },
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const SHORT_SWORD: u8 = 46;

    /// Freshly started adventurer: 100 health, short sword, no beast.
    pub fn adventurer() -> Adventurer {
        Adventurer {
            health: 100,
            equipment: Equipment::default().with(Slot::Weapon, Item::new(SHORT_SWORD, 0)),
            ..Adventurer::default()
        }
    }

    pub fn state(adventurer: Adventurer) -> GameState {
        GameState::new(7, adventurer, Bag::default(), Beast::default(), Vec::new())
    }

    pub fn state_with_beast(adventurer: Adventurer, beast: Beast) -> GameState {
        GameState::new(7, adventurer, Bag::default(), beast, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(v: u64) -> String {
        format!("0x{:x}", v)
    }

    fn base_words() -> Vec<String> {
        let mut words = Vec::new();
        // health, xp, gold, beast_health, upgrades
        words.extend([100, 9, 40, 0, 2].map(hex));
        // str, dex, vit, int, wis, cha, luck
        words.extend([3, 2, 1, 0, 0, 4, 2].map(hex));
        // item_specials_seed, action_count
        words.extend([1234, 17].map(hex));
        // weapon = Katana with 16 xp, chest = Shirt, rest empty
        words.extend([42, 16, 21, 1].map(hex));
        words.extend(std::iter::repeat(hex(0)).take(12));
        // bag: one Cap, rest empty, mutated = 0
        words.extend([56, 4].map(hex));
        words.extend(std::iter::repeat(hex(0)).take(28));
        words.push(hex(0));
        // beast: id, seed, health, level, specials, collectable
        words.extend([29, 99, 40, 3, 0, 5, 7, 1].map(hex));
        words
    }

    #[test]
    fn test_decode_full_snapshot() {
        let mut words = base_words();
        words.extend([3, 17, 52, 91].map(hex));

        let state = GameState::decode(42, &words).unwrap();
        let adv = &state.adventurer;
        assert_eq!(state.game_id, 42);
        assert_eq!(adv.health, 100);
        assert_eq!(adv.xp, 9);
        assert_eq!(adv.level(), 3);
        assert_eq!(adv.gold, 40);
        assert_eq!(adv.stat_upgrades_available, 2);
        assert_eq!(adv.stats.charisma, 4);
        assert_eq!(adv.item_specials_seed, 1234);
        assert_eq!(adv.action_count, 17);

        let weapon = adv.equipment.weapon();
        assert_eq!(weapon, Item::new(42, 16));
        assert_eq!(weapon.greatness(), 4);
        assert!(adv.equipment.get(Slot::Head).is_empty());
        assert_eq!(adv.equipment.get(Slot::Chest).id, 21);

        assert_eq!(state.bag.items(), &[Item::new(56, 4)]);
        assert!(!state.bag.mutated);

        assert_eq!(state.beast.id, 29);
        assert_eq!(state.beast.name(), "Dragon");
        assert_eq!(state.beast.level, 3);
        assert_eq!(state.beast.special_prefix(), Some(5));
        assert_eq!(state.beast.special_suffix(), Some(7));
        assert!(state.beast.is_collectable);

        assert_eq!(state.market, vec![17, 52, 91]);
    }

    #[test]
    fn test_decode_rejects_short_sequence() {
        let words = vec!["0x1"; 10];
        assert_eq!(
            GameState::decode(1, &words),
            Err(DecodeError::Truncated {
                expected: MIN_STATE_WORDS,
                actual: 10
            })
        );
    }

    #[test]
    fn test_decode_rejects_market_overrun() {
        let mut words = base_words();
        words.extend([4, 17].map(hex));
        assert!(matches!(
            GameState::decode(1, &words),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_numeric_word() {
        let mut words = base_words();
        words.push(hex(0));
        words[1] = "0xnope".to_string();
        assert_eq!(
            GameState::decode(1, &words),
            Err(DecodeError::NotNumeric {
                field: "xp",
                value: "0xnope".to_string()
            })
        );
    }

    #[test]
    fn test_decode_rejects_oversized_stat() {
        let mut words = base_words();
        words.push(hex(0));
        words[5] = hex(300);
        assert_eq!(
            GameState::decode(1, &words),
            Err(DecodeError::OutOfRange {
                field: "strength",
                value: 300
            })
        );

        words[5] = hex(3);
        words[7] = hex(32);
        assert_eq!(
            GameState::decode(1, &words),
            Err(DecodeError::OutOfRange {
                field: "vitality",
                value: 32
            })
        );
    }

    #[test]
    fn test_zero_health_is_dead_even_before_start() {
        let fresh = Adventurer::default();
        assert!(!fresh.has_started());
        assert!(fresh.is_dead());

        let fallen = Adventurer {
            health: 0,
            ..fixtures::adventurer()
        };
        assert!(fallen.is_dead());
    }

    #[test]
    fn test_bag_capacity() {
        let items = (1..=20).map(|id| Item::new(id, 0)).collect();
        let bag = Bag::new(items, false);
        assert_eq!(bag.len(), BAG_SIZE);
        assert!(bag.is_full());
    }
}
