use crate::salt;
use crate::state::Stats;
use serde::Serialize;
use starknet::core::types::Felt;
use starknet::core::utils::cairo_short_string_to_felt;

pub const ENTRY_REQUEST_RANDOM: &str = "request_random";
pub const ENTRY_APPROVE: &str = "approve";
pub const ENTRY_BUY_GAME: &str = "buy_game";
pub const ENTRY_START_GAME: &str = "start_game";
pub const ENTRY_EXPLORE: &str = "explore";
pub const ENTRY_ATTACK: &str = "attack";
pub const ENTRY_FLEE: &str = "flee";
pub const ENTRY_SELECT_STAT_UPGRADES: &str = "select_stat_upgrades";
pub const ENTRY_BUY_ITEMS: &str = "buy_items";
pub const ENTRY_EQUIP: &str = "equip";
pub const ENTRY_DROP: &str = "drop";

/// Player names must fit a Cairo short string.
pub const MAX_NAME_LEN: usize = 31;
pub const DEFAULT_PLAYER_NAME: &str = "survivor";

/// `Source::Salt` variant index of the VRF provider's request source.
const VRF_SOURCE_SALT: u64 = 1;
/// `PaymentType::Ticket` variant index.
const PAYMENT_TICKET: u64 = 0;
/// Cairo serializes `Option::Some` with variant index 0.
const OPTION_SOME: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub game: Felt,
    pub dungeon: Felt,
    pub vrf_provider: Felt,
    pub ticket_token: Felt,
}

/// A wire-ready invocation. Building one never signs or sends anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDescriptor {
    pub contract_address: Felt,
    pub entrypoint: &'static str,
    pub calldata: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemPurchase {
    pub item_id: u8,
    pub equip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    RequestRandomForExplore { game_id: u64, xp: u32 },
    RequestRandomForBattle { game_id: u64, xp: u32, action_count: u32 },
    ApproveTicket { amount: u128 },
    BuyGame { player_name: String, recipient: Felt },
    StartGame { game_id: u64, weapon: u8 },
    Explore { game_id: u64, till_beast: bool },
    Attack { game_id: u64, to_the_death: bool },
    Flee { game_id: u64, to_the_death: bool },
    SelectStatUpgrades { game_id: u64, stats: Stats },
    BuyItems { game_id: u64, potions: u8, items: Vec<ItemPurchase> },
    Equip { game_id: u64, items: Vec<u8> },
    Drop { game_id: u64, items: Vec<u8> },
}

impl GameAction {
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::RequestRandomForExplore { .. } => "request_random_for_explore",
            GameAction::RequestRandomForBattle { .. } => "request_random_for_battle",
            GameAction::ApproveTicket { .. } => "approve_ticket",
            GameAction::BuyGame { .. } => "buy_game",
            GameAction::StartGame { .. } => "start_game",
            GameAction::Explore { .. } => "explore",
            GameAction::Attack { .. } => "attack",
            GameAction::Flee { .. } => "flee",
            GameAction::SelectStatUpgrades { .. } => "select_stat_upgrades",
            GameAction::BuyItems { .. } => "buy_items",
            GameAction::Equip { .. } => "equip",
            GameAction::Drop { .. } => "drop",
        }
    }

    pub fn game_id(&self) -> Option<u64> {
        match *self {
            GameAction::ApproveTicket { .. } | GameAction::BuyGame { .. } => None,
            GameAction::RequestRandomForExplore { game_id, .. }
            | GameAction::RequestRandomForBattle { game_id, .. }
            | GameAction::StartGame { game_id, .. }
            | GameAction::Explore { game_id, .. }
            | GameAction::Attack { game_id, .. }
            | GameAction::Flee { game_id, .. }
            | GameAction::SelectStatUpgrades { game_id, .. }
            | GameAction::BuyItems { game_id, .. }
            | GameAction::Equip { game_id, .. }
            | GameAction::Drop { game_id, .. } => Some(game_id),
        }
    }

    /// Actions the contract only accepts once a matching VRF request is fulfilled.
    pub fn needs_randomness(&self) -> bool {
        matches!(
            self,
            GameAction::StartGame { .. }
                | GameAction::Explore { .. }
                | GameAction::Attack { .. }
                | GameAction::Flee { .. }
        )
    }

    pub fn is_randomness_request(&self) -> bool {
        self.salt().is_some()
    }

    /// The salt a randomness request registers with the VRF provider.
    pub fn salt(&self) -> Option<Felt> {
        match *self {
            GameAction::RequestRandomForExplore { game_id, xp } => {
                Some(salt::explore_salt(game_id, xp))
            }
            GameAction::RequestRandomForBattle {
                game_id,
                xp,
                action_count,
            } => Some(salt::battle_salt(game_id, xp, action_count)),
            _ => None,
        }
    }
}

/// Encodes a player name as a short string, falling back to the default name
/// when it is empty, too long or not ASCII.
pub fn encode_player_name(name: &str) -> Felt {
    let usable = !name.is_empty() && name.len() <= MAX_NAME_LEN && name.is_ascii();
    let encoded = if usable {
        cairo_short_string_to_felt(name).ok()
    } else {
        None
    };
    encoded.unwrap_or_else(|| {
        cairo_short_string_to_felt(DEFAULT_PLAYER_NAME).unwrap_or(Felt::ZERO)
    })
}

fn flag(value: bool) -> String {
    let bit = if value { "1" } else { "0" };
    bit.to_string()
}

#[derive(Debug, Clone)]
pub struct CallBuilder {
    addresses: ContractAddresses,
}

impl CallBuilder {
    pub fn new(addresses: ContractAddresses) -> Self {
        Self { addresses }
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    pub fn build_all(&self, actions: &[GameAction]) -> Vec<CallDescriptor> {
        actions.iter().map(|a| self.build(a)).collect()
    }

    pub fn build(&self, action: &GameAction) -> CallDescriptor {
        match action {
            GameAction::RequestRandomForExplore { .. }
            | GameAction::RequestRandomForBattle { .. } => {
                // salt() is Some for both request variants
                self.request_random(action.salt().unwrap_or(Felt::ZERO))
            }
            GameAction::ApproveTicket { amount } => self.approve_ticket(*amount),
            GameAction::BuyGame {
                player_name,
                recipient,
            } => self.buy_game(player_name, *recipient),
            GameAction::StartGame { game_id, weapon } => {
                self.game_call(ENTRY_START_GAME, *game_id, vec![weapon.to_string()])
            }
            GameAction::Explore { game_id, till_beast } => {
                self.game_call(ENTRY_EXPLORE, *game_id, vec![flag(*till_beast)])
            }
            GameAction::Attack { game_id, to_the_death } => {
                self.game_call(ENTRY_ATTACK, *game_id, vec![flag(*to_the_death)])
            }
            GameAction::Flee { game_id, to_the_death } => {
                self.game_call(ENTRY_FLEE, *game_id, vec![flag(*to_the_death)])
            }
            GameAction::SelectStatUpgrades { game_id, stats } => {
                self.select_stat_upgrades(*game_id, stats)
            }
            GameAction::BuyItems {
                game_id,
                potions,
                items,
            } => self.buy_items(*game_id, *potions, items),
            GameAction::Equip { game_id, items } => {
                self.item_list_call(ENTRY_EQUIP, *game_id, items)
            }
            GameAction::Drop { game_id, items } => self.item_list_call(ENTRY_DROP, *game_id, items),
        }
    }

    fn request_random(&self, salt: Felt) -> CallDescriptor {
        CallDescriptor {
            contract_address: self.addresses.vrf_provider,
            entrypoint: ENTRY_REQUEST_RANDOM,
            calldata: vec![
                self.addresses.game.to_string(),
                VRF_SOURCE_SALT.to_string(),
                salt.to_string(),
            ],
        }
    }

    fn approve_ticket(&self, amount: u128) -> CallDescriptor {
        // u256 is (low, high); ticket amounts always fit the low word
        CallDescriptor {
            contract_address: self.addresses.ticket_token,
            entrypoint: ENTRY_APPROVE,
            calldata: vec![self.addresses.dungeon.to_string(), amount.to_string(), "0".to_string()],
        }
    }

    fn buy_game(&self, player_name: &str, recipient: Felt) -> CallDescriptor {
        CallDescriptor {
            contract_address: self.addresses.dungeon,
            entrypoint: ENTRY_BUY_GAME,
            calldata: vec![
                PAYMENT_TICKET.to_string(),
                OPTION_SOME.to_string(),
                encode_player_name(player_name).to_string(),
                recipient.to_string(),
                flag(false),
            ],
        }
    }

    fn select_stat_upgrades(&self, game_id: u64, stats: &Stats) -> CallDescriptor {
        let values = [
            stats.strength,
            stats.dexterity,
            stats.vitality,
            stats.intelligence,
            stats.wisdom,
            stats.charisma,
            stats.luck,
        ];
        self.game_call(
            ENTRY_SELECT_STAT_UPGRADES,
            game_id,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    fn buy_items(&self, game_id: u64, potions: u8, items: &[ItemPurchase]) -> CallDescriptor {
        let mut args = Vec::with_capacity(2 + items.len() * 2);
        args.push(potions.to_string());
        args.push(items.len().to_string());
        for purchase in items {
            args.push(purchase.item_id.to_string());
            args.push(flag(purchase.equip));
        }
        self.game_call(ENTRY_BUY_ITEMS, game_id, args)
    }

    fn item_list_call(
        &self,
        entrypoint: &'static str,
        game_id: u64,
        items: &[u8],
    ) -> CallDescriptor {
        let mut args = Vec::with_capacity(1 + items.len());
        args.push(items.len().to_string());
        args.extend(items.iter().map(|id| id.to_string()));
        self.game_call(entrypoint, game_id, args)
    }

    fn game_call(
        &self,
        entrypoint: &'static str,
        game_id: u64,
        args: Vec<String>,
    ) -> CallDescriptor {
        let mut calldata = Vec::with_capacity(1 + args.len());
        calldata.push(game_id.to_string());
        calldata.extend(args);
        CallDescriptor {
            contract_address: self.addresses.game,
            entrypoint,
            calldata,
        }
    }
}
