#![no_std]

//! # Mock Game Hub
//!
//! Stake-escrow hub used by Alpha Duel in tests and local deployments.
//! Enforces the hub side of the session lifecycle: exactly one open
//! escrow per session, stakes locked at `start_game`, moved exactly once
//! at `end_game`.
//!
//! Balances are a plain per-address ledger with an open `fund` faucet —
//! this is a mock, not a token.

use soroban_sdk::{contract, contracterror, contractevent, contractimpl, contracttype, Address, Env};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

/// Stakes held in escrow for one open session.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockedStake {
    pub game: Address,
    pub player1: Address,
    pub player2: Address,
    pub player1_points: i128,
    pub player2_points: i128,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Balance(Address),
    Stake(u32),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum HubError {
    InsufficientBalance = 1,
    SessionAlreadyOpen = 2,
    SessionNotFound = 3,
    InvalidResult = 4,
    InvalidStake = 5,
}

// End-game result convention (shared with the game contract)
pub const RESULT_REFUND: u32 = 0;
pub const RESULT_PLAYER1: u32 = 1;
pub const RESULT_PLAYER2: u32 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvStakeLocked {
    pub session_id: u32,
    pub player1: Address,
    pub player2: Address,
}

#[contractevent]
pub struct EvStakeReleased {
    pub session_id: u32,
    pub result: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MockGameHub;

#[contractimpl]
impl MockGameHub {
    /// Credit a player's balance. Open faucet — mock only.
    pub fn fund(env: Env, player: Address, amount: i128) {
        let balance = Self::balance_of(&env, &player);
        env.storage()
            .instance()
            .set(&DataKey::Balance(player), &(balance + amount));
    }

    pub fn balance(env: Env, player: Address) -> i128 {
        Self::balance_of(&env, &player)
    }

    pub fn get_stake(env: Env, session_id: u32) -> Result<LockedStake, HubError> {
        env.storage()
            .instance()
            .get(&DataKey::Stake(session_id))
            .ok_or(HubError::SessionNotFound)
    }

    /// Lock both stakes for a new session. Fails (and aborts the whole
    /// game start) if either player cannot cover their stake.
    pub fn start_game(
        env: Env,
        game_id: Address,
        session_id: u32,
        player1: Address,
        player2: Address,
        player1_points: i128,
        player2_points: i128,
    ) -> Result<(), HubError> {
        if player1_points < 0 || player2_points < 0 {
            return Err(HubError::InvalidStake);
        }
        let key = DataKey::Stake(session_id);
        if env.storage().instance().has(&key) {
            return Err(HubError::SessionAlreadyOpen);
        }

        let balance1 = Self::balance_of(&env, &player1);
        let balance2 = Self::balance_of(&env, &player2);
        if balance1 < player1_points || balance2 < player2_points {
            return Err(HubError::InsufficientBalance);
        }

        env.storage()
            .instance()
            .set(&DataKey::Balance(player1.clone()), &(balance1 - player1_points));
        env.storage()
            .instance()
            .set(&DataKey::Balance(player2.clone()), &(balance2 - player2_points));

        let stake = LockedStake {
            game: game_id,
            player1: player1.clone(),
            player2: player2.clone(),
            player1_points,
            player2_points,
        };
        env.storage().instance().set(&key, &stake);

        EvStakeLocked {
            session_id,
            player1,
            player2,
        }
        .publish(&env);

        Ok(())
    }

    /// Release a session's escrow exactly once: winner takes both
    /// stakes, `RESULT_REFUND` returns each stake unchanged. The escrow
    /// entry is consumed, so a second call fails with SessionNotFound.
    pub fn end_game(env: Env, session_id: u32, result: u32) -> Result<(), HubError> {
        let key = DataKey::Stake(session_id);
        let stake: LockedStake = env
            .storage()
            .instance()
            .get(&key)
            .ok_or(HubError::SessionNotFound)?;

        let total = stake.player1_points + stake.player2_points;
        match result {
            RESULT_PLAYER1 => Self::credit(&env, &stake.player1, total),
            RESULT_PLAYER2 => Self::credit(&env, &stake.player2, total),
            RESULT_REFUND => {
                Self::credit(&env, &stake.player1, stake.player1_points);
                Self::credit(&env, &stake.player2, stake.player2_points);
            }
            _ => return Err(HubError::InvalidResult),
        }

        env.storage().instance().remove(&key);

        EvStakeReleased { session_id, result }.publish(&env);

        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Internal
    // ───────────────────────────────────────────────────────────────────────────

    fn balance_of(env: &Env, player: &Address) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::Balance(player.clone()))
            .unwrap_or(0)
    }

    fn credit(env: &Env, player: &Address, amount: i128) {
        let balance = Self::balance_of(env, player);
        env.storage()
            .instance()
            .set(&DataKey::Balance(player.clone()), &(balance + amount));
    }
}

#[cfg(test)]
mod test;
