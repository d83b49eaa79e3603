//! Salts binding a VRF request to the action that consumes it.
//!
//! The VRF provider recomputes these on fulfillment, so the element order and
//! the hash (Poseidon over a span, i.e. `poseidon_hash_many`) must match the
//! game contract exactly. A mismatch never errors on-chain; the request just
//! never resolves.

use starknet_crypto::{poseidon_hash_many, Felt};

/// Salt for exploring (and for starting a game, where xp is 0).
pub fn explore_salt(game_id: u64, xp: u32) -> Felt {
    poseidon_hash_many(&[Felt::from(xp), Felt::from(game_id)])
}

/// Salt for attacking or fleeing. The contract hashes the action count the
/// consuming transaction will produce, hence the `+ 1`.
pub fn battle_salt(game_id: u64, xp: u32, action_count: u32) -> Felt {
    poseidon_hash_many(&[
        Felt::from(xp),
        Felt::from(game_id),
        Felt::from(action_count as u64 + 1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use starknet_crypto::poseidon_hash;
    use std::collections::HashSet;

    #[test]
    fn test_explore_salt_is_span_hash_of_xp_then_game() {
        let salt = explore_salt(12, 40);
        assert_eq!(salt, poseidon_hash_many(&[Felt::from(40u64), Felt::from(12u64)]));
        // the two-element permutation pads differently and must not be used
        assert_ne!(salt, poseidon_hash(Felt::from(40u64), Felt::from(12u64)));
        assert_ne!(salt, explore_salt(40, 12));
    }

    #[test]
    fn test_battle_salt_uses_next_action_count() {
        let salt = battle_salt(12, 40, 6);
        assert_eq!(
            salt,
            poseidon_hash_many(&[Felt::from(40u64), Felt::from(12u64), Felt::from(7u64)])
        );
    }

    #[test]
    fn test_battle_salt_is_deterministic() {
        assert_eq!(battle_salt(99, 1234, 55), battle_salt(99, 1234, 55));
    }

    #[test]
    fn test_battle_salt_distinct_per_action_count() {
        let salts: HashSet<Felt> = (0..500).map(|count| battle_salt(99, 1234, count)).collect();
        assert_eq!(salts.len(), 500);
        assert!(!salts.contains(&explore_salt(99, 1234)));
    }
}
