#![no_std]

//! # Alpha Duel
//!
//! A two-player word-guessing wager. A hidden word is derived from the
//! session id against a fixed public 50-word catalog; each player picks
//! 3 distinct letters and the player whose letters hit more slots of the
//! hidden word takes both stakes.
//!
//! ## Game flow
//! 1. `start_game` locks both stakes through the Game Hub and fixes the
//!    hidden word reference (`word_id = session_id % 50`).
//! 2. Each player commits `keccak256(letters || salt)` — the guess stays
//!    client-side, so neither player can react to the other's pick.
//! 3. Settlement runs on one of two converging paths:
//!    - **Plaintext path**: both players submit their letters openly and
//!      `reveal_winner` scores them against the hidden word on-chain.
//!    - **Proof path**: either player hands `reveal_winner_with_proof` a
//!      proof whose public inputs carry the winner flag plus both guess
//!      digests; the verifier contract re-runs the scoring inside the
//!      proof relation and the digests are checked against the stored
//!      commitments before the flag is trusted.
//! 4. Winner takes both stakes; equal scores are a tie and both stakes
//!    are refunded. The Game Hub is told the session ended either way.
//! 5. A session that never completes is swept by `expire_game` after its
//!    TTL and both stakes are refunded — abandonment never forfeits.
//!
//! ## Letter encoding
//! A = 0 .. Z = 25, zero-indexed everywhere (commitments, guesses,
//! scoring). A guess is exactly 3 pairwise-distinct letters.
//!
//! ## Scoring
//! Occurrence counting: each guess letter scores once per matching slot
//! of the hidden word, so a doubled letter in the word counts twice.
//! Strictly greater score wins; equal scores tie.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, vec,
    Address, Bytes, BytesN, Env, IntoVal, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvGameStarted {
    pub session_id: u32,
    pub player1: Address,
    pub player2: Address,
}

/// Emitted when a player commits their guess (letters are hidden).
#[contractevent]
pub struct EvGuessCommitted {
    pub session_id: u32,
    pub player: Address,
}

/// Emitted on the plaintext path when a player submits open letters.
#[contractevent]
pub struct EvGuessSubmitted {
    pub session_id: u32,
    pub player: Address,
}

/// Emitted when the verifier contract accepts a settlement proof.
#[contractevent]
pub struct EvProofAccepted {
    pub session_id: u32,
    pub winner_flag: u32,
}

#[contractevent]
pub struct EvGameSettled {
    pub session_id: u32,
    pub result: u32,
}

#[contractevent]
pub struct EvGameExpired {
    pub session_id: u32,
}

#[contractevent]
pub struct EvHubStartReported {
    pub session_id: u32,
    pub hub: Address,
}

#[contractevent]
pub struct EvHubEndReported {
    pub session_id: u32,
    pub hub: Address,
    pub result: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Game Hub: locks both stakes at session start and moves them at session
/// end. `result` uses the winner-flag convention (`RESULT_REFUND` /
/// `RESULT_PLAYER1` / `RESULT_PLAYER2`); a refund returns both stakes
/// unchanged (tie or TTL expiry).
#[contractclient(name = "GameHubClient")]
pub trait DuelGameHub {
    fn start_game(
        env: Env,
        game_id: Address,
        session_id: u32,
        player1: Address,
        player2: Address,
        player1_points: i128,
        player2_points: i128,
    );

    fn end_game(env: Env, session_id: u32, result: u32);
}

/// Settlement proof verifier.
///
/// Public inputs layout (18 words, u32 each):
///   [0]       winner_flag : 0 = tie, 1 = player1, 2 = player2
///   [1]       session_id
///   [2..10)   player1 guess digest, 8 big-endian u32 words
///   [10..18)  player2 guess digest, 8 big-endian u32 words
///
/// Proof layout (88 bytes):
///   guess1 (3 × u32 BE) || salt1 (32) || guess2 (3 × u32 BE) || salt2 (32)
#[contractclient(name = "DuelVerifierClient")]
pub trait DuelVerifier {
    fn verify(env: Env, public_inputs: Vec<u32>, proof: Bytes) -> bool;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum DuelError {
    GameNotFound = 1,
    SessionAlreadyExists = 2,
    NotAPlayer = 3,
    SelfPlayNotAllowed = 4,
    GameAlreadyEnded = 5,
    AlreadyCommitted = 6,
    AlreadyGuessed = 7,
    BothPlayersNotGuessed = 8,
    MissingCommitment = 9,
    InvalidGuessShape = 10,
    ProofRejected = 11,
    MalformedPublicInputs = 12,
    CommitmentMismatch = 13,
    ExpiryNotReached = 14,
    AdminNotSet = 15,
    GameHubNotSet = 16,
    VerifierNotSet = 17,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Lifecycle states (compact u32 encoding for storage efficiency)
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) type LifecycleState = u32;

pub const STATE_CREATED: LifecycleState = 1;
pub const STATE_AWAITING_SECOND_COMMIT: LifecycleState = 2;
pub const STATE_AWAITING_REVEAL: LifecycleState = 3;
pub const STATE_SETTLED: LifecycleState = 4;
pub const STATE_EXPIRED: LifecycleState = 5;

// Settlement results — shared convention between the proof's public
// winner flag and the hub's end_game call.
pub const RESULT_REFUND: u32 = 0;
pub const RESULT_PLAYER1: u32 = 1;
pub const RESULT_PLAYER2: u32 = 2;

// History outcome codes (from the stored player's perspective)
pub const OUTCOME_WIN: u32 = 1;
pub const OUTCOME_LOSS: u32 = 2;
pub const OUTCOME_DRAW: u32 = 3;

// Player slots
const PLAYER_1: u32 = 1;
const PLAYER_2: u32 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
//  Game state & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub player1: Address,
    pub player2: Address,
    pub player1_points: i128,
    pub player2_points: i128,
    /// Index into the public word catalog. Fixed at creation, never
    /// recomputed — the word itself is derived on demand.
    pub word_id: u32,
    pub player1_commitment: Option<BytesN<32>>,
    pub player2_commitment: Option<BytesN<32>>,
    // Plaintext-path guesses (3 distinct letter indices each)
    pub player1_guess: Option<Vec<u32>>,
    pub player2_guess: Option<Vec<u32>>,
    /// Written exactly once at settlement; None after settlement = tie.
    pub winner: Option<Address>,
    pub lifecycle_state: u32,
    /// Ledger sequence past which `expire_game` may sweep this session.
    pub expires_at: u32,
}

/// Compact summary of a finished game, stored persistently per player.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameSummary {
    pub session_id: u32,
    pub opponent: Address,
    pub outcome: u32, // 1=win, 2=loss, 3=draw (from this player's perspective)
    pub ledger: u32,  // ledger sequence when the game settled
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Game(u32),
    Admin,
    GameHubAddress,
    VerifierAddress,
    PlayerHistory(Address),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

pub const ALPHABET_SIZE: u32 = 26;
pub const GUESS_LETTERS: u32 = 3;

/// Fixed capacity of the secret buffer. The scoring loop always runs to
/// this bound with a `true_length` guard, so the same algorithm can run
/// unmodified inside the proof relation (static loop bounds).
pub const MAX_SECRET_LEN: u32 = 12;

pub const CATALOG_SIZE: u32 = 50;

// Public-input layout for the settlement proof
pub const DIGEST_WORDS: u32 = 8;
pub const PI_WINNER_FLAG: u32 = 0;
pub const PI_SESSION_ID: u32 = 1;
pub const PI_DIGEST1: u32 = 2;
pub const PI_DIGEST2: u32 = 10;
pub const PUBLIC_INPUT_WORDS: u32 = 18;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Session TTL: an incomplete game may be swept 24 hours after start
const SESSION_TTL_SECONDS: u32 = 24 * 60 * 60;
const SESSION_TTL_LEDGERS: u32 = SESSION_TTL_SECONDS / LEDGER_RATE_SECS; // 17,280 ledgers

// Storage retention: game records are kept for 30 days
const STORAGE_TTL_SECONDS: u32 = 30 * 24 * 60 * 60;
const GAME_TTL_LEDGERS: u32 = STORAGE_TTL_SECONDS / LEDGER_RATE_SECS; // 518,400 ledgers

// History TTL: 120 days — persistent storage for player game history
const HISTORY_TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const HISTORY_TTL_LEDGERS: u32 = HISTORY_TTL_SECONDS / LEDGER_RATE_SECS; // 2,073,600 ledgers

/// Max game summaries stored per player (ring buffer)
const MAX_HISTORY_PER_PLAYER: u32 = 50;

// ═══════════════════════════════════════════════════════════════════════════════
//  Secret derivation — session_id → hidden word
// ═══════════════════════════════════════════════════════════════════════════════

/// Map a session id to its catalog index. Pure and total: the same
/// session id yields the same index in every execution context (the
/// contract, the verifier, and any offline prover re-derive it).
pub(crate) fn derive_word_id(session_id: u32) -> u32 {
    session_id % CATALOG_SIZE
}

/// The public word catalog (matches the frontend list exactly).
pub(crate) fn catalog_word(word_id: u32) -> &'static str {
    match word_id {
        0 => "APPLE",
        1 => "BANANA",
        2 => "ORANGE",
        3 => "GRAPE",
        4 => "MANGO",
        5 => "PEACH",
        6 => "LEMON",
        7 => "CHERRY",
        8 => "PEAR",
        9 => "PLUM",
        10 => "KIWI",
        11 => "FIG",
        12 => "DATE",
        13 => "LIME",
        14 => "APRICOT",
        15 => "PAPAYA",
        16 => "GUAVA",
        17 => "PINEAPPLE",
        18 => "COCONUT",
        19 => "BLUEBERRY",
        20 => "STRAWBERRY",
        21 => "RASPBERRY",
        22 => "BLACKBERRY",
        23 => "WATERMELON",
        24 => "CANTALOUPE",
        25 => "HONEYDEW",
        26 => "NECTARINE",
        27 => "TANGERINE",
        28 => "POMEGRANATE",
        29 => "PASSIONFRUIT",
        30 => "DRAGONFRUIT",
        31 => "LYCHEE",
        32 => "JACKFRUIT",
        33 => "CRANBERRY",
        34 => "MULBERRY",
        35 => "FIGS",
        36 => "DATEFRUIT",
        37 => "OLIVE",
        38 => "QUINCE",
        39 => "KUMQUAT",
        40 => "AVOCADO",
        41 => "MANDARIN",
        42 => "PEPPERMINT",
        43 => "CLEMENTINE",
        44 => "GRAPEFRUIT",
        45 => "STARFRUIT",
        46 => "BILBERRY",
        47 => "GOOSEBERRY",
        48 => "ELDERBERRY",
        _ => "SATSUMA",
    }
}

/// Encode a catalog word into the fixed secret buffer (A=0..Z=25) plus
/// its true length. Slots past the true length are zero padding and are
/// never scored.
pub(crate) fn secret_letters(word: &str) -> ([u32; MAX_SECRET_LEN as usize], u32) {
    let mut buf = [0u32; MAX_SECRET_LEN as usize];
    let bytes = word.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() && i < MAX_SECRET_LEN as usize {
        buf[i] = (bytes[i] - b'A') as u32;
        i += 1;
    }
    (buf, bytes.len() as u32)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Match-counting evaluator
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a submitted guess: exactly 3 pairwise-distinct letters, each
/// in `[0, 26)`. Returns the guess as a fixed triple.
pub(crate) fn validate_guess(guess: &Vec<u32>) -> Result<[u32; GUESS_LETTERS as usize], DuelError> {
    if guess.len() != GUESS_LETTERS {
        return Err(DuelError::InvalidGuessShape);
    }
    let triple = [
        guess.get(0).unwrap_or(u32::MAX),
        guess.get(1).unwrap_or(u32::MAX),
        guess.get(2).unwrap_or(u32::MAX),
    ];
    check_triple(&triple)?;
    Ok(triple)
}

fn check_triple(triple: &[u32; GUESS_LETTERS as usize]) -> Result<(), DuelError> {
    let mut i = 0usize;
    while i < GUESS_LETTERS as usize {
        if triple[i] >= ALPHABET_SIZE {
            return Err(DuelError::InvalidGuessShape);
        }
        i += 1;
    }
    if triple[0] == triple[1] || triple[0] == triple[2] || triple[1] == triple[2] {
        return Err(DuelError::InvalidGuessShape);
    }
    Ok(())
}

/// Count how many slots of the secret a guess hits.
///
/// Occurrence counting, not distinct-letter counting: a secret letter
/// present in two slots scores twice for a single matching guess letter.
/// The loop bound is the fixed buffer capacity with a `true_length`
/// guard — the cost never depends on the actual word length, which is
/// what lets the identical algorithm run inside the proof relation.
pub(crate) fn count_matches(
    secret: &[u32; MAX_SECRET_LEN as usize],
    true_length: u32,
    guess: &[u32; GUESS_LETTERS as usize],
) -> Result<u32, DuelError> {
    check_triple(guess)?;
    let mut count: u32 = 0;
    let mut slot: u32 = 0;
    while slot < MAX_SECRET_LEN {
        if slot < true_length {
            let letter = secret[slot as usize];
            if letter >= ALPHABET_SIZE {
                return Err(DuelError::InvalidGuessShape);
            }
            let mut g = 0usize;
            while g < GUESS_LETTERS as usize {
                if guess[g] == letter {
                    count += 1;
                }
                g += 1;
            }
        }
        slot += 1;
    }
    Ok(count)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Commitment scheme
// ═══════════════════════════════════════════════════════════════════════════════

/// Client-side commitment: `keccak256(l0_be4 || l1_be4 || l2_be4 || salt)`.
///
/// The contract stores only the digest; the letters and the 32-byte
/// random salt stay with the player until settlement. The salt defeats
/// dictionary enumeration of the 2600-triple guess space.
pub fn guess_commitment(
    env: &Env,
    guess: &[u32; GUESS_LETTERS as usize],
    salt: &BytesN<32>,
) -> BytesN<32> {
    let mut preimage = Bytes::new(env);
    let mut i = 0usize;
    while i < GUESS_LETTERS as usize {
        preimage.append(&Bytes::from_array(env, &guess[i].to_be_bytes()));
        i += 1;
    }
    preimage.append(&Bytes::from_array(env, &salt.to_array()));
    env.crypto().keccak256(&preimage).into()
}

/// Split a 32-byte digest into 8 big-endian u32 words — the form in
/// which digests travel through the proof's public inputs.
pub fn digest_words(digest: &BytesN<32>) -> [u32; DIGEST_WORDS as usize] {
    let arr = digest.to_array();
    let mut words = [0u32; DIGEST_WORDS as usize];
    let mut w = 0usize;
    while w < DIGEST_WORDS as usize {
        words[w] = u32::from_be_bytes([arr[4 * w], arr[4 * w + 1], arr[4 * w + 2], arr[4 * w + 3]]);
        w += 1;
    }
    words
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct AlphaDuelContract;

#[contractimpl]
impl AlphaDuelContract {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor & Lifecycle
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(env: Env, admin: Address, game_hub: Address, verifier: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::GameHubAddress, &game_hub);
        env.storage()
            .instance()
            .set(&DataKey::VerifierAddress, &verifier);
    }

    pub fn start_game(
        env: Env,
        session_id: u32,
        player1: Address,
        player2: Address,
        player1_points: i128,
        player2_points: i128,
    ) -> Result<(), DuelError> {
        if player1 == player2 {
            return Err(DuelError::SelfPlayNotAllowed);
        }

        player1.require_auth_for_args(vec![
            &env,
            session_id.into_val(&env),
            player1_points.into_val(&env),
        ]);
        player2.require_auth_for_args(vec![
            &env,
            session_id.into_val(&env),
            player2_points.into_val(&env),
        ]);

        let key = DataKey::Game(session_id);
        if env.storage().temporary().has(&key) {
            return Err(DuelError::SessionAlreadyExists);
        }

        // Game Hub lifecycle: lock both stakes BEFORE storing state. The
        // hub traps if either stake cannot be locked, which aborts the
        // whole start.
        let hub_addr = Self::load_hub(&env)?;
        let hub = GameHubClient::new(&env, &hub_addr);
        hub.start_game(
            &env.current_contract_address(),
            &session_id,
            &player1,
            &player2,
            &player1_points,
            &player2_points,
        );

        EvHubStartReported {
            session_id,
            hub: hub_addr,
        }
        .publish(&env);

        let game = Game {
            player1,
            player2,
            player1_points,
            player2_points,
            word_id: derive_word_id(session_id),
            player1_commitment: None,
            player2_commitment: None,
            player1_guess: None,
            player2_guess: None,
            winner: None,
            lifecycle_state: STATE_CREATED,
            expires_at: env.ledger().sequence().saturating_add(SESSION_TTL_LEDGERS),
        };

        EvGameStarted {
            session_id,
            player1: game.player1.clone(),
            player2: game.player2.clone(),
        }
        .publish(&env);

        Self::write_game(&env, session_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Commitments
    // ───────────────────────────────────────────────────────────────────────────

    /// Record a player's guess commitment. Each slot fills exactly once;
    /// a concurrent or repeated attempt is rejected, never overwritten.
    pub fn commit_guess(
        env: Env,
        session_id: u32,
        player: Address,
        guess_commitment: BytesN<32>,
    ) -> Result<(), DuelError> {
        player.require_auth();

        let mut game = Self::read_game(&env, session_id)?;
        Self::require_active(&game)?;

        let slot = Self::resolve_slot(&game, &player)?;
        match slot {
            PLAYER_1 => {
                if game.player1_commitment.is_some() {
                    return Err(DuelError::AlreadyCommitted);
                }
                game.player1_commitment = Some(guess_commitment);
            }
            _ => {
                if game.player2_commitment.is_some() {
                    return Err(DuelError::AlreadyCommitted);
                }
                game.player2_commitment = Some(guess_commitment);
            }
        }

        game.lifecycle_state =
            if game.player1_commitment.is_some() && game.player2_commitment.is_some() {
                STATE_AWAITING_REVEAL
            } else {
                STATE_AWAITING_SECOND_COMMIT
            };

        EvGuessCommitted {
            session_id,
            player: player.clone(),
        }
        .publish(&env);

        Self::write_game(&env, session_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Plaintext path
    // ───────────────────────────────────────────────────────────────────────────

    /// Submit an open guess (plaintext path). Validated to exactly 3
    /// pairwise-distinct letters in `[0, 26)`; each player guesses once.
    pub fn make_guess(
        env: Env,
        session_id: u32,
        player: Address,
        guess: Vec<u32>,
    ) -> Result<(), DuelError> {
        player.require_auth();

        let mut game = Self::read_game(&env, session_id)?;
        Self::require_active(&game)?;

        validate_guess(&guess)?;

        let slot = Self::resolve_slot(&game, &player)?;
        match slot {
            PLAYER_1 => {
                if game.player1_guess.is_some() {
                    return Err(DuelError::AlreadyGuessed);
                }
                game.player1_guess = Some(guess);
            }
            _ => {
                if game.player2_guess.is_some() {
                    return Err(DuelError::AlreadyGuessed);
                }
                game.player2_guess = Some(guess);
            }
        }

        EvGuessSubmitted {
            session_id,
            player: player.clone(),
        }
        .publish(&env);

        Self::write_game(&env, session_id, &game);
        Ok(())
    }

    /// Score both open guesses against the hidden word and settle.
    ///
    /// Strictly greater score wins; equal scores tie (`None`) and both
    /// stakes are refunded. Either party may trigger this — the outcome
    /// is deterministic, so the caller cannot influence it.
    pub fn reveal_winner(env: Env, session_id: u32) -> Result<Option<Address>, DuelError> {
        let mut game = Self::read_game(&env, session_id)?;
        Self::require_active(&game)?;

        let (guess1, guess2) = match (&game.player1_guess, &game.player2_guess) {
            (Some(g1), Some(g2)) => (validate_guess(g1)?, validate_guess(g2)?),
            _ => return Err(DuelError::BothPlayersNotGuessed),
        };

        let (secret, true_length) = secret_letters(catalog_word(game.word_id));
        let score1 = count_matches(&secret, true_length, &guess1)?;
        let score2 = count_matches(&secret, true_length, &guess2)?;

        let result = if score1 > score2 {
            RESULT_PLAYER1
        } else if score2 > score1 {
            RESULT_PLAYER2
        } else {
            RESULT_REFUND
        };

        Self::settle_game(&env, session_id, &mut game, result)?;
        Self::write_game(&env, session_id, &game);
        Ok(game.winner.clone())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Proof path
    // ───────────────────────────────────────────────────────────────────────────

    /// Settle from a zero-knowledge proof instead of open guesses.
    ///
    /// Requires both commitments. The public inputs must re-expose both
    /// guess digests; they are checked against the stored commitments
    /// before the winner flag is trusted, which binds the proof's
    /// private guesses to the commitments fixed on-ledger. A rejected
    /// proof leaves the session untouched — a corrected proof may be
    /// resubmitted.
    pub fn reveal_winner_with_proof(
        env: Env,
        session_id: u32,
        proof: Bytes,
        public_inputs: Vec<u32>,
    ) -> Result<Option<Address>, DuelError> {
        let mut game = Self::read_game(&env, session_id)?;
        Self::require_active(&game)?;

        let (commit1, commit2) = match (&game.player1_commitment, &game.player2_commitment) {
            (Some(c1), Some(c2)) => (c1.clone(), c2.clone()),
            _ => return Err(DuelError::MissingCommitment),
        };

        if public_inputs.len() != PUBLIC_INPUT_WORDS {
            return Err(DuelError::MalformedPublicInputs);
        }
        let winner_flag = public_inputs.get(PI_WINNER_FLAG).unwrap_or(u32::MAX);
        if winner_flag > RESULT_PLAYER2 {
            return Err(DuelError::MalformedPublicInputs);
        }
        if public_inputs.get(PI_SESSION_ID).unwrap_or(u32::MAX) != session_id {
            return Err(DuelError::MalformedPublicInputs);
        }

        // Commitment binding: the digests the proof computed over its
        // private guesses must equal the ones fixed before the reveal.
        Self::check_digest_binding(&public_inputs, PI_DIGEST1, &commit1)?;
        Self::check_digest_binding(&public_inputs, PI_DIGEST2, &commit2)?;

        let verifier_addr = Self::load_verifier(&env)?;
        let verifier = DuelVerifierClient::new(&env, &verifier_addr);
        if !verifier.verify(&public_inputs, &proof) {
            return Err(DuelError::ProofRejected);
        }

        EvProofAccepted {
            session_id,
            winner_flag,
        }
        .publish(&env);

        Self::settle_game(&env, session_id, &mut game, winner_flag)?;
        Self::write_game(&env, session_id, &game);
        Ok(game.winner.clone())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: TTL sweep
    // ───────────────────────────────────────────────────────────────────────────

    /// Expire an abandoned session past its TTL and refund both stakes.
    ///
    /// Maintenance operation: callable by anyone (an external scheduler,
    /// not the players), so an opponent going silent can never strand a
    /// stake. Expiry always refunds — an incomplete game never costs
    /// either player anything.
    pub fn expire_game(env: Env, session_id: u32) -> Result<(), DuelError> {
        let mut game = Self::read_game(&env, session_id)?;
        Self::require_active(&game)?;

        if env.ledger().sequence() < game.expires_at {
            return Err(DuelError::ExpiryNotReached);
        }

        let hub_addr = Self::load_hub(&env)?;
        let hub = GameHubClient::new(&env, &hub_addr);
        hub.end_game(&session_id, &RESULT_REFUND);

        EvHubEndReported {
            session_id,
            hub: hub_addr,
            result: RESULT_REFUND,
        }
        .publish(&env);

        game.lifecycle_state = STATE_EXPIRED;

        EvGameExpired { session_id }.publish(&env);

        Self::write_game(&env, session_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read & Admin
    // ───────────────────────────────────────────────────────────────────────────

    /// Game snapshot with both plaintext guesses redacted while the game
    /// is live, so an open guess cannot be snooped via RPC before
    /// settlement. Use `get_game_view` to see your own guess.
    pub fn get_game(env: Env, session_id: u32) -> Result<Game, DuelError> {
        let game = Self::read_game(&env, session_id)?;
        if Self::is_terminal(&game) {
            Ok(game)
        } else {
            let mut view = game;
            view.player1_guess = None;
            view.player2_guess = None;
            Ok(view)
        }
    }

    /// Game snapshot with player-level privacy: the viewer sees their
    /// own guess, the opponent's stays redacted until settlement.
    pub fn get_game_view(env: Env, session_id: u32, viewer: Address) -> Result<Game, DuelError> {
        let game = Self::read_game(&env, session_id)?;
        if Self::is_terminal(&game) {
            return Ok(game);
        }
        let mut view = game;
        match Self::resolve_slot(&view, &viewer) {
            Ok(PLAYER_1) => view.player2_guess = None,
            Ok(_) => view.player1_guess = None,
            Err(_) => {
                view.player1_guess = None;
                view.player2_guess = None;
            }
        }
        Ok(view)
    }

    /// Full raw game state (admin-only), for debugging and post-game
    /// verification.
    pub fn get_game_debug(env: Env, session_id: u32) -> Result<Game, DuelError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        Self::read_game(&env, session_id)
    }

    /// Get a player's game history (up to 50 most recent games).
    pub fn get_player_history(env: Env, player: Address) -> Vec<GameSummary> {
        let key = DataKey::PlayerHistory(player);
        env.storage()
            .persistent()
            .get(&key)
            .unwrap_or_else(|| Vec::new(&env))
    }

    pub fn get_admin(env: Env) -> Result<Address, DuelError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), DuelError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        Ok(())
    }

    pub fn get_hub(env: Env) -> Result<Address, DuelError> {
        Self::load_hub(&env)
    }

    pub fn set_hub(env: Env, new_hub: Address) -> Result<(), DuelError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage()
            .instance()
            .set(&DataKey::GameHubAddress, &new_hub);
        Ok(())
    }

    pub fn get_verifier(env: Env) -> Result<Address, DuelError> {
        Self::load_verifier(&env)
    }

    pub fn set_verifier(env: Env, new_verifier: Address) -> Result<(), DuelError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage()
            .instance()
            .set(&DataKey::VerifierAddress, &new_verifier);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), DuelError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Settlement (single call-site for stake movement)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record the winner and move the stakes as one unit.
    ///
    /// Both reveal paths converge here. The terminal-state guard makes
    /// settlement one-shot: a second invocation fails before any
    /// transfer, so a double payout cannot happen. Winner recording and
    /// stake movement share this single invocation, which the ledger
    /// applies atomically.
    fn settle_game(
        env: &Env,
        session_id: u32,
        game: &mut Game,
        result: u32,
    ) -> Result<(), DuelError> {
        if Self::is_terminal(game) {
            return Err(DuelError::GameAlreadyEnded);
        }

        let hub_addr = Self::load_hub(env)?;
        let hub = GameHubClient::new(env, &hub_addr);
        hub.end_game(&session_id, &result);

        EvHubEndReported {
            session_id,
            hub: hub_addr,
            result,
        }
        .publish(env);

        match result {
            RESULT_PLAYER1 => {
                game.player1_points += game.player2_points;
                game.player2_points = 0;
                game.winner = Some(game.player1.clone());
            }
            RESULT_PLAYER2 => {
                game.player2_points += game.player1_points;
                game.player1_points = 0;
                game.winner = Some(game.player2.clone());
            }
            // Tie: both stakes stay where they are, winner stays None.
            _ => {}
        }
        game.lifecycle_state = STATE_SETTLED;

        EvGameSettled { session_id, result }.publish(env);

        let (outcome1, outcome2) = match result {
            RESULT_PLAYER1 => (OUTCOME_WIN, OUTCOME_LOSS),
            RESULT_PLAYER2 => (OUTCOME_LOSS, OUTCOME_WIN),
            _ => (OUTCOME_DRAW, OUTCOME_DRAW),
        };
        Self::save_player_history(env, session_id, &game.player1, &game.player2, outcome1);
        Self::save_player_history(env, session_id, &game.player2, &game.player1, outcome2);

        Ok(())
    }

    /// Append a game summary to a player's persistent history (ring buffer, max 50).
    fn save_player_history(
        env: &Env,
        session_id: u32,
        player: &Address,
        opponent: &Address,
        outcome: u32,
    ) {
        let key = DataKey::PlayerHistory(player.clone());
        let mut history: Vec<GameSummary> = env
            .storage()
            .persistent()
            .get(&key)
            .unwrap_or_else(|| Vec::new(env));

        while history.len() >= MAX_HISTORY_PER_PLAYER {
            history.remove(0);
        }

        history.push_back(GameSummary {
            session_id,
            opponent: opponent.clone(),
            outcome,
            ledger: env.ledger().sequence(),
        });

        env.storage().persistent().set(&key, &history);
        env.storage()
            .persistent()
            .extend_ttl(&key, HISTORY_TTL_LEDGERS, HISTORY_TTL_LEDGERS);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards & helpers
    // ═══════════════════════════════════════════════════════════════════════════

    fn is_terminal(game: &Game) -> bool {
        game.lifecycle_state == STATE_SETTLED || game.lifecycle_state == STATE_EXPIRED
    }

    fn require_active(game: &Game) -> Result<(), DuelError> {
        if Self::is_terminal(game) {
            return Err(DuelError::GameAlreadyEnded);
        }
        Ok(())
    }

    fn resolve_slot(game: &Game, player: &Address) -> Result<u32, DuelError> {
        if *player == game.player1 {
            Ok(PLAYER_1)
        } else if *player == game.player2 {
            Ok(PLAYER_2)
        } else {
            Err(DuelError::NotAPlayer)
        }
    }

    /// Compare 8 public-input digest words against a stored commitment.
    fn check_digest_binding(
        public_inputs: &Vec<u32>,
        offset: u32,
        commitment: &BytesN<32>,
    ) -> Result<(), DuelError> {
        let words = digest_words(commitment);
        let mut w: u32 = 0;
        while w < DIGEST_WORDS {
            if public_inputs.get(offset + w).unwrap_or(u32::MAX) != words[w as usize] {
                return Err(DuelError::CommitmentMismatch);
            }
            w += 1;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn read_game(env: &Env, session_id: u32) -> Result<Game, DuelError> {
        env.storage()
            .temporary()
            .get(&DataKey::Game(session_id))
            .ok_or(DuelError::GameNotFound)
    }

    fn write_game(env: &Env, session_id: u32, game: &Game) {
        let key = DataKey::Game(session_id);
        env.storage().temporary().set(&key, game);
        env.storage()
            .temporary()
            .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
        // Keep instance storage (admin, hub, verifier addresses) alive
        env.storage()
            .instance()
            .extend_ttl(GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    }

    fn load_admin(env: &Env) -> Result<Address, DuelError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(DuelError::AdminNotSet)
    }

    fn load_hub(env: &Env) -> Result<Address, DuelError> {
        env.storage()
            .instance()
            .get(&DataKey::GameHubAddress)
            .ok_or(DuelError::GameHubNotSet)
    }

    fn load_verifier(env: &Env) -> Result<Address, DuelError> {
        env.storage()
            .instance()
            .get(&DataKey::VerifierAddress)
            .ok_or(DuelError::VerifierNotSet)
    }
}
