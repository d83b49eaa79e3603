//! Static item and beast tables mirroring the game's loot catalog.
//!
//! Everything here is immutable process-wide data. Lookups return `None` for
//! id 0 (the empty sentinel) and for ids outside the catalog.

use serde::{Deserialize, Serialize};

pub const ITEM_COUNT: u8 = 101;
pub const BEAST_COUNT: u8 = 75;
pub const BEASTS_PER_KIND: u8 = 25;
pub const BEASTS_PER_TIER: u8 = 5;

/// Weapons a new adventurer may start with.
pub const STARTING_WEAPONS: [u8; 4] = [12, 16, 46, 76];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Weapon,
    Chest,
    Head,
    Waist,
    Foot,
    Hand,
    Neck,
    Ring,
}

impl Slot {
    /// Order in which equipment words appear on-chain.
    pub const ALL: [Slot; 8] = [
        Slot::Weapon,
        Slot::Chest,
        Slot::Head,
        Slot::Waist,
        Slot::Foot,
        Slot::Hand,
        Slot::Neck,
        Slot::Ring,
    ];

    pub const ARMOR: [Slot; 5] = [Slot::Chest, Slot::Head, Slot::Waist, Slot::Foot, Slot::Hand];

    pub fn index(self) -> usize {
        match self {
            Slot::Weapon => 0,
            Slot::Chest => 1,
            Slot::Head => 2,
            Slot::Waist => 3,
            Slot::Foot => 4,
            Slot::Hand => 5,
            Slot::Neck => 6,
            Slot::Ring => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Weapon => "weapon",
            Slot::Chest => "chest",
            Slot::Head => "head",
            Slot::Waist => "waist",
            Slot::Foot => "foot",
            Slot::Hand => "hand",
            Slot::Neck => "neck",
            Slot::Ring => "ring",
        }
    }
}

/// Weapon side of the elemental triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    Magic,
    Blade,
    Bludgeon,
}

/// Armor side of the elemental triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorType {
    Cloth,
    Hide,
    Metal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Magic,
    Blade,
    Bludgeon,
    Cloth,
    Hide,
    Metal,
    Necklace,
    Ring,
}

impl ItemType {
    pub fn attack_type(self) -> Option<AttackType> {
        match self {
            ItemType::Magic => Some(AttackType::Magic),
            ItemType::Blade => Some(AttackType::Blade),
            ItemType::Bludgeon => Some(AttackType::Bludgeon),
            _ => None,
        }
    }

    pub fn armor_type(self) -> Option<ArmorType> {
        match self {
            ItemType::Cloth => Some(ArmorType::Cloth),
            ItemType::Hide => Some(ArmorType::Hide),
            ItemType::Metal => Some(ArmorType::Metal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemInfo {
    pub name: &'static str,
    pub slot: Slot,
    pub item_type: ItemType,
    pub tier: u8,
}

const fn item(name: &'static str, slot: Slot, item_type: ItemType, tier: u8) -> ItemInfo {
    ItemInfo { name, slot, item_type, tier }
}

use ItemType::{Blade, Bludgeon, Cloth, Hide, Magic, Metal, Necklace, Ring};
use Slot::{Chest, Foot, Hand, Head, Neck, Waist, Weapon};

/// Indexed by `id - 1`.
static ITEMS: [ItemInfo; ITEM_COUNT as usize] = [
    item("Pendant", Neck, Necklace, 1),
    item("Necklace", Neck, Necklace, 1),
    item("Amulet", Neck, Necklace, 1),
    item("Silver Ring", Slot::Ring, Ring, 2),
    item("Bronze Ring", Slot::Ring, Ring, 3),
    item("Platinum Ring", Slot::Ring, Ring, 1),
    item("Titanium Ring", Slot::Ring, Ring, 1),
    item("Gold Ring", Slot::Ring, Ring, 1),
    item("Ghost Wand", Weapon, Magic, 1),
    item("Grave Wand", Weapon, Magic, 2),
    item("Bone Wand", Weapon, Magic, 3),
    item("Wand", Weapon, Magic, 5),
    item("Grimoire", Weapon, Magic, 1),
    item("Chronicle", Weapon, Magic, 2),
    item("Tome", Weapon, Magic, 3),
    item("Book", Weapon, Magic, 5),
    item("Divine Robe", Chest, Cloth, 1),
    item("Silk Robe", Chest, Cloth, 2),
    item("Linen Robe", Chest, Cloth, 3),
    item("Robe", Chest, Cloth, 4),
    item("Shirt", Chest, Cloth, 5),
    item("Crown", Head, Cloth, 1),
    item("Divine Hood", Head, Cloth, 2),
    item("Silk Hood", Head, Cloth, 3),
    item("Linen Hood", Head, Cloth, 4),
    item("Hood", Head, Cloth, 5),
    item("Brightsilk Sash", Waist, Cloth, 1),
    item("Silk Sash", Waist, Cloth, 2),
    item("Wool Sash", Waist, Cloth, 3),
    item("Linen Sash", Waist, Cloth, 4),
    item("Sash", Waist, Cloth, 5),
    item("Divine Slippers", Foot, Cloth, 1),
    item("Silk Slippers", Foot, Cloth, 2),
    item("Wool Shoes", Foot, Cloth, 3),
    item("Linen Shoes", Foot, Cloth, 4),
    item("Shoes", Foot, Cloth, 5),
    item("Divine Gloves", Hand, Cloth, 1),
    item("Silk Gloves", Hand, Cloth, 2),
    item("Wool Gloves", Hand, Cloth, 3),
    item("Linen Gloves", Hand, Cloth, 4),
    item("Gloves", Hand, Cloth, 5),
    item("Katana", Weapon, Blade, 1),
    item("Falchion", Weapon, Blade, 2),
    item("Scimitar", Weapon, Blade, 3),
    item("Long Sword", Weapon, Blade, 4),
    item("Short Sword", Weapon, Blade, 5),
    item("Demon Husk", Chest, Hide, 1),
    item("Dragonskin Armor", Chest, Hide, 2),
    item("Studded Leather Armor", Chest, Hide, 3),
    item("Hard Leather Armor", Chest, Hide, 4),
    item("Leather Armor", Chest, Hide, 5),
    item("Demon Crown", Head, Hide, 1),
    item("Dragon's Crown", Head, Hide, 2),
    item("War Cap", Head, Hide, 3),
    item("Leather Cap", Head, Hide, 4),
    item("Cap", Head, Hide, 5),
    item("Demonhide Belt", Waist, Hide, 1),
    item("Dragonskin Belt", Waist, Hide, 2),
    item("Studded Leather Belt", Waist, Hide, 3),
    item("Hard Leather Belt", Waist, Hide, 4),
    item("Leather Belt", Waist, Hide, 5),
    item("Demonhide Boots", Foot, Hide, 1),
    item("Dragonskin Boots", Foot, Hide, 2),
    item("Studded Leather Boots", Foot, Hide, 3),
    item("Hard Leather Boots", Foot, Hide, 4),
    item("Leather Boots", Foot, Hide, 5),
    item("Demon's Hands", Hand, Hide, 1),
    item("Dragonskin Gloves", Hand, Hide, 2),
    item("Studded Leather Gloves", Hand, Hide, 3),
    item("Hard Leather Gloves", Hand, Hide, 4),
    item("Leather Gloves", Hand, Hide, 5),
    item("Warhammer", Weapon, Bludgeon, 1),
    item("Quarterstaff", Weapon, Bludgeon, 2),
    item("Maul", Weapon, Bludgeon, 3),
    item("Mace", Weapon, Bludgeon, 4),
    item("Club", Weapon, Bludgeon, 5),
    item("Holy Chestplate", Chest, Metal, 1),
    item("Ornate Chestplate", Chest, Metal, 2),
    item("Plate Mail", Chest, Metal, 3),
    item("Chain Mail", Chest, Metal, 4),
    item("Ring Mail", Chest, Metal, 5),
    item("Ancient Helm", Head, Metal, 1),
    item("Ornate Helm", Head, Metal, 2),
    item("Great Helm", Head, Metal, 3),
    item("Full Helm", Head, Metal, 4),
    item("Helm", Head, Metal, 5),
    item("Ornate Belt", Waist, Metal, 1),
    item("War Belt", Waist, Metal, 2),
    item("Plated Belt", Waist, Metal, 3),
    item("Mesh Belt", Waist, Metal, 4),
    item("Heavy Belt", Waist, Metal, 5),
    item("Holy Greaves", Foot, Metal, 1),
    item("Ornate Greaves", Foot, Metal, 2),
    item("Greaves", Foot, Metal, 3),
    item("Chain Boots", Foot, Metal, 4),
    item("Heavy Boots", Foot, Metal, 5),
    item("Holy Gauntlets", Hand, Metal, 1),
    item("Ornate Gauntlets", Hand, Metal, 2),
    item("Gauntlets", Hand, Metal, 3),
    item("Chain Gloves", Hand, Metal, 4),
    item("Heavy Gloves", Hand, Metal, 5),
];

pub fn item_info(id: u8) -> Option<&'static ItemInfo> {
    if id == 0 {
        return None;
    }
    ITEMS.get(id as usize - 1)
}

static BEAST_NAMES: [&str; BEAST_COUNT as usize] = [
    "Warlock",
    "Typhon",
    "Jiangshi",
    "Anansi",
    "Basilisk",
    "Gorgon",
    "Kitsune",
    "Lich",
    "Chimera",
    "Wendigo",
    "Rakshasa",
    "Werewolf",
    "Banshee",
    "Draugr",
    "Vampire",
    "Goblin",
    "Ghoul",
    "Wraith",
    "Sprite",
    "Kappa",
    "Fairy",
    "Leprechaun",
    "Kelpie",
    "Pixie",
    "Gnome",
    "Griffin",
    "Manticore",
    "Phoenix",
    "Dragon",
    "Minotaur",
    "Qilin",
    "Ammit",
    "Nue",
    "Skinwalker",
    "Chupacabra",
    "Weretiger",
    "Wyvern",
    "Roc",
    "Harpy",
    "Pegasus",
    "Hippogriff",
    "Fenrir",
    "Jaguar",
    "Satori",
    "Direwolf",
    "Bear",
    "Wolf",
    "Mantis",
    "Spider",
    "Rat",
    "Kraken",
    "Colossus",
    "Balrog",
    "Leviathan",
    "Tarrasque",
    "Titan",
    "Nephilim",
    "Behemoth",
    "Hydra",
    "Juggernaut",
    "Oni",
    "Jotunn",
    "Ettin",
    "Cyclops",
    "Giant",
    "Nemean Lion",
    "Berserker",
    "Yeti",
    "Golem",
    "Ent",
    "Troll",
    "Bigfoot",
    "Ogre",
    "Orc",
    "Skeleton",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeastKind {
    Magical,
    Hunter,
    Brute,
}

impl BeastKind {
    pub fn attack_type(self) -> AttackType {
        match self {
            BeastKind::Magical => AttackType::Magic,
            BeastKind::Hunter => AttackType::Blade,
            BeastKind::Brute => AttackType::Bludgeon,
        }
    }

    pub fn armor_type(self) -> ArmorType {
        match self {
            BeastKind::Magical => ArmorType::Cloth,
            BeastKind::Hunter => ArmorType::Hide,
            BeastKind::Brute => ArmorType::Metal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeastInfo {
    pub name: &'static str,
    pub kind: BeastKind,
    pub tier: u8,
}

pub fn beast_info(id: u8) -> Option<BeastInfo> {
    if id == 0 || id > BEAST_COUNT {
        return None;
    }
    let offset = id - 1;
    let kind = match offset / BEASTS_PER_KIND {
        0 => BeastKind::Magical,
        1 => BeastKind::Hunter,
        _ => BeastKind::Brute,
    };
    let tier = (offset % BEASTS_PER_KIND) / BEASTS_PER_TIER + 1;
    Some(BeastInfo {
        name: BEAST_NAMES[offset as usize],
        kind,
        tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_unknown_ids() {
        assert!(item_info(0).is_none());
        assert!(item_info(102).is_none());
        assert!(beast_info(0).is_none());
        assert!(beast_info(76).is_none());
    }

    #[test]
    fn test_item_lookup() {
        let katana = item_info(42).unwrap();
        assert_eq!(katana.name, "Katana");
        assert_eq!(katana.slot, Slot::Weapon);
        assert_eq!(katana.item_type.attack_type(), Some(AttackType::Blade));
        assert_eq!(katana.tier, 1);

        let heavy_gloves = item_info(101).unwrap();
        assert_eq!(heavy_gloves.slot, Slot::Hand);
        assert_eq!(heavy_gloves.item_type.armor_type(), Some(ArmorType::Metal));
        assert_eq!(heavy_gloves.tier, 5);
    }

    #[test]
    fn test_starting_weapons_are_tier_five_weapons() {
        for id in STARTING_WEAPONS {
            let info = item_info(id).unwrap();
            assert_eq!(info.slot, Slot::Weapon);
            assert_eq!(info.tier, 5);
        }
    }

    #[test]
    fn test_beast_kind_and_tier_ranges() {
        let warlock = beast_info(1).unwrap();
        assert_eq!(warlock.kind, BeastKind::Magical);
        assert_eq!(warlock.tier, 1);

        let gnome = beast_info(25).unwrap();
        assert_eq!(gnome.kind, BeastKind::Magical);
        assert_eq!(gnome.tier, 5);

        let griffin = beast_info(26).unwrap();
        assert_eq!(griffin.kind, BeastKind::Hunter);
        assert_eq!(griffin.tier, 1);

        let skeleton = beast_info(75).unwrap();
        assert_eq!(skeleton.name, "Skeleton");
        assert_eq!(skeleton.kind, BeastKind::Brute);
        assert_eq!(skeleton.tier, 5);
        assert_eq!(skeleton.kind.armor_type(), ArmorType::Metal);
    }

    #[test]
    fn test_slot_index_matches_on_chain_order() {
        for (i, slot) in Slot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
