#![no_std]

//! # Duel Settlement Verifier
//!
//! On-chain verifier for Alpha Duel settlement proofs. The prover claims
//! a winner flag was correctly computed from two hidden guesses and the
//! session's hidden word, without the guesses ever being stored on-chain
//! in the clear.
//!
//! ## Relation
//!
//! The verifier checks, for public inputs `(winner_flag, session_id,
//! digest1, digest2)` and witness `(guess1, salt1, guess2, salt2)`:
//!
//! 1. `keccak256(guess1 || salt1) == digest1` and likewise for player 2
//!    (binding: the game contract compares these digests against the
//!    commitments fixed before the reveal).
//! 2. Both guesses are well-formed: 3 pairwise-distinct letters in
//!    `[0, 26)`.
//! 3. `score_i = occurrence count of guess_i against the word derived
//!    from session_id`, using the fixed-bound evaluator.
//! 4. `winner_flag` equals the strictly-greater-score rule's output
//!    (0 = tie, 1 = player1, 2 = player2).
//!
//! ## Public inputs layout (18 u32 words)
//! ```text
//! [0]       winner_flag : 0 = tie, 1 = player1, 2 = player2
//! [1]       session_id
//! [2..10)   digest1     : keccak256 of player1's guess+salt, 8 BE words
//! [10..18)  digest2     : keccak256 of player2's guess+salt, 8 BE words
//! ```
//!
//! ## Proof layout (88 bytes)
//! ```text
//! [0..12)   guess1 : 3 × u32 big-endian letter indices
//! [12..44)  salt1  : 32-byte commitment salt
//! [44..56)  guess2 : 3 × u32 big-endian letter indices
//! [56..88)  salt2  : 32-byte commitment salt
//! ```
//!
//! The word catalog and the match-counting loop here mirror the game
//! contract exactly and must stay behaviorally identical — a divergence
//! would let the proof path and the plaintext path settle the same
//! session differently.

use soroban_sdk::{contract, contracterror, contractevent, contractimpl, Bytes, BytesN, Env, Vec};

// ═══════════════════════════════════════════════════════════════════════════════
//  Error codes (published as failure-event reasons)
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum DuelVerifyError {
    ProofWrongLength = 1,
    InputsWrongLength = 2,
    DigestMismatch = 3,
    MalformedGuess = 4,
    WinnerFlagMismatch = 5,
    InvalidWinnerFlag = 6,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvVerifyFailed {
    pub reason: u32,
}

#[contractevent]
pub struct EvVerifySuccess {
    pub session_id: u32,
    pub winner_flag: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants (must match the game contract)
// ═══════════════════════════════════════════════════════════════════════════════

const ALPHABET_SIZE: u32 = 26;
const GUESS_LETTERS: usize = 3;
const MAX_SECRET_LEN: usize = 12;
const CATALOG_SIZE: u32 = 50;

const DIGEST_WORDS: u32 = 8;
const PI_WINNER_FLAG: u32 = 0;
const PI_SESSION_ID: u32 = 1;
const PI_DIGEST1: u32 = 2;
const PI_DIGEST2: u32 = 10;
const PUBLIC_INPUT_WORDS: u32 = 18;

/// guess (12) + salt (32), twice.
const PROOF_LEN: u32 = 88;

const FLAG_TIE: u32 = 0;
const FLAG_PLAYER1: u32 = 1;
const FLAG_PLAYER2: u32 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct DuelSettlementVerifier;

#[contractimpl]
impl DuelSettlementVerifier {
    /// Verify a settlement proof against its public inputs.
    ///
    /// Returns `true` iff the witness reproduces both public digests and
    /// the public winner flag matches the recomputed scores. Emits
    /// diagnostic events on success or failure.
    pub fn verify(env: Env, public_inputs: Vec<u32>, proof: Bytes) -> bool {
        if public_inputs.len() != PUBLIC_INPUT_WORDS {
            EvVerifyFailed {
                reason: DuelVerifyError::InputsWrongLength as u32,
            }
            .publish(&env);
            return false;
        }
        if proof.len() != PROOF_LEN {
            EvVerifyFailed {
                reason: DuelVerifyError::ProofWrongLength as u32,
            }
            .publish(&env);
            return false;
        }

        let winner_flag = public_inputs.get(PI_WINNER_FLAG).unwrap_or(u32::MAX);
        if winner_flag > FLAG_PLAYER2 {
            EvVerifyFailed {
                reason: DuelVerifyError::InvalidWinnerFlag as u32,
            }
            .publish(&env);
            return false;
        }
        let session_id = public_inputs.get(PI_SESSION_ID).unwrap_or(0);

        // ── Extract witness: (guess1, salt1, guess2, salt2) ─────────────────
        let guess1 = Self::read_guess(&proof, 0);
        let salt1 = Self::read_salt(&env, &proof, 12);
        let guess2 = Self::read_guess(&proof, 44);
        let salt2 = Self::read_salt(&env, &proof, 56);

        // ── Step 1: Digest binding ──────────────────────────────────────────
        if !Self::digest_matches(&env, &guess1, &salt1, &public_inputs, PI_DIGEST1)
            || !Self::digest_matches(&env, &guess2, &salt2, &public_inputs, PI_DIGEST2)
        {
            EvVerifyFailed {
                reason: DuelVerifyError::DigestMismatch as u32,
            }
            .publish(&env);
            return false;
        }

        // ── Step 2: Guess shape ─────────────────────────────────────────────
        if !Self::guess_well_formed(&guess1) || !Self::guess_well_formed(&guess2) {
            EvVerifyFailed {
                reason: DuelVerifyError::MalformedGuess as u32,
            }
            .publish(&env);
            return false;
        }

        // ── Step 3: Recompute scores from the derived word ──────────────────
        let (secret, true_length) = Self::derive_secret(session_id);
        let score1 = Self::count_matches(&secret, true_length, &guess1);
        let score2 = Self::count_matches(&secret, true_length, &guess2);

        // ── Step 4: Winner rule ─────────────────────────────────────────────
        let expected_flag = if score1 > score2 {
            FLAG_PLAYER1
        } else if score2 > score1 {
            FLAG_PLAYER2
        } else {
            FLAG_TIE
        };
        if expected_flag != winner_flag {
            EvVerifyFailed {
                reason: DuelVerifyError::WinnerFlagMismatch as u32,
            }
            .publish(&env);
            return false;
        }

        EvVerifySuccess {
            session_id,
            winner_flag,
        }
        .publish(&env);
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Witness extraction
    // ═══════════════════════════════════════════════════════════════════════════

    fn read_guess(proof: &Bytes, offset: u32) -> [u32; GUESS_LETTERS] {
        let mut guess = [0u32; GUESS_LETTERS];
        let mut i = 0usize;
        while i < GUESS_LETTERS {
            let base = offset + (i as u32) * 4;
            guess[i] = u32::from_be_bytes([
                proof.get(base).unwrap_or(0),
                proof.get(base + 1).unwrap_or(0),
                proof.get(base + 2).unwrap_or(0),
                proof.get(base + 3).unwrap_or(0),
            ]);
            i += 1;
        }
        guess
    }

    fn read_salt(env: &Env, proof: &Bytes, offset: u32) -> BytesN<32> {
        let mut arr = [0u8; 32];
        let mut i = 0u32;
        while i < 32 {
            arr[i as usize] = proof.get(offset + i).unwrap_or(0);
            i += 1;
        }
        BytesN::<32>::from_array(env, &arr)
    }

    /// Recompute `keccak256(l0_be4 || l1_be4 || l2_be4 || salt)` and
    /// compare it word-by-word against the public digest slot.
    fn digest_matches(
        env: &Env,
        guess: &[u32; GUESS_LETTERS],
        salt: &BytesN<32>,
        public_inputs: &Vec<u32>,
        offset: u32,
    ) -> bool {
        let mut preimage = Bytes::new(env);
        let mut i = 0usize;
        while i < GUESS_LETTERS {
            preimage.append(&Bytes::from_array(env, &guess[i].to_be_bytes()));
            i += 1;
        }
        preimage.append(&Bytes::from_array(env, &salt.to_array()));
        let digest: BytesN<32> = env.crypto().keccak256(&preimage).into();
        let arr = digest.to_array();

        let mut w: u32 = 0;
        while w < DIGEST_WORDS {
            let i = (4 * w) as usize;
            let word = u32::from_be_bytes([arr[i], arr[i + 1], arr[i + 2], arr[i + 3]]);
            if public_inputs.get(offset + w).unwrap_or(u32::MAX) != word {
                return false;
            }
            w += 1;
        }
        true
    }

    fn guess_well_formed(guess: &[u32; GUESS_LETTERS]) -> bool {
        let mut i = 0usize;
        while i < GUESS_LETTERS {
            if guess[i] >= ALPHABET_SIZE {
                return false;
            }
            i += 1;
        }
        guess[0] != guess[1] && guess[0] != guess[2] && guess[1] != guess[2]
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Secret derivation + scoring (mirror of the game contract)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Derive the hidden word for a session and encode it into the
    /// fixed-capacity buffer (A=0..Z=25) plus its true length.
    fn derive_secret(session_id: u32) -> ([u32; MAX_SECRET_LEN], u32) {
        let word = match session_id % CATALOG_SIZE {
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
        };

        let mut buf = [0u32; MAX_SECRET_LEN];
        let bytes = word.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() && i < MAX_SECRET_LEN {
            buf[i] = (bytes[i] - b'A') as u32;
            i += 1;
        }
        (buf, bytes.len() as u32)
    }

    /// Occurrence-counting evaluator with a static loop bound — the
    /// circuit-shaped twin of the game contract's `count_matches`.
    fn count_matches(
        secret: &[u32; MAX_SECRET_LEN],
        true_length: u32,
        guess: &[u32; GUESS_LETTERS],
    ) -> u32 {
        let mut count: u32 = 0;
        let mut slot: u32 = 0;
        while slot < MAX_SECRET_LEN as u32 {
            if slot < true_length {
                let letter = secret[slot as usize];
                let mut g = 0usize;
                while g < GUESS_LETTERS {
                    if guess[g] == letter {
                        count += 1;
                    }
                    g += 1;
                }
            }
            slot += 1;
        }
        count
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{vec, Env};

    fn setup() -> (Env, DuelSettlementVerifierClient<'static>) {
        let env = Env::default();
        let contract_id = env.register(DuelSettlementVerifier, ());
        let client = DuelSettlementVerifierClient::new(&env, &contract_id);
        (env, client)
    }

    fn guess_digest(env: &Env, guess: &[u32; 3], salt: &[u8; 32]) -> [u8; 32] {
        let mut preimage = Bytes::new(env);
        for g in guess.iter() {
            preimage.append(&Bytes::from_array(env, &g.to_be_bytes()));
        }
        preimage.append(&Bytes::from_array(env, salt));
        let digest: BytesN<32> = env.crypto().keccak256(&preimage).into();
        digest.to_array()
    }

    fn build_proof(env: &Env, guess1: &[u32; 3], salt1: &[u8; 32], guess2: &[u32; 3], salt2: &[u8; 32]) -> Bytes {
        let mut proof = Bytes::new(env);
        for g in guess1.iter() {
            proof.append(&Bytes::from_array(env, &g.to_be_bytes()));
        }
        proof.append(&Bytes::from_array(env, salt1));
        for g in guess2.iter() {
            proof.append(&Bytes::from_array(env, &g.to_be_bytes()));
        }
        proof.append(&Bytes::from_array(env, salt2));
        proof
    }

    fn build_public_inputs(
        env: &Env,
        winner_flag: u32,
        session_id: u32,
        digest1: &[u8; 32],
        digest2: &[u8; 32],
    ) -> Vec<u32> {
        let mut pi = vec![env, winner_flag, session_id];
        for d in [digest1, digest2] {
            for w in 0..8usize {
                pi.push_back(u32::from_be_bytes([
                    d[4 * w],
                    d[4 * w + 1],
                    d[4 * w + 2],
                    d[4 * w + 3],
                ]));
            }
        }
        pi
    }

    // Letter helpers (A=0..Z=25)
    fn l(c: char) -> u32 {
        c as u32 - 'A' as u32
    }

    #[test]
    fn valid_proof_accepted() {
        let (env, client) = setup();
        // session 8 → "PEAR": {A,B,P} scores 2, {E,A,R} scores 3 → player2
        let sid = 8u32;
        let guess1 = [l('A'), l('B'), l('P')];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 2, sid, &d1, &d2);

        assert!(client.verify(&pi, &proof));
    }

    #[test]
    fn tie_flag_accepted_on_equal_scores() {
        let (env, client) = setup();
        // session 8 → "PEAR": {P,E,X} scores 2, {A,R,Y} scores 2 → tie
        let sid = 8u32;
        let guess1 = [l('P'), l('E'), l('X')];
        let guess2 = [l('A'), l('R'), l('Y')];
        let salt1 = [0x33u8; 32];
        let salt2 = [0x44u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 0, sid, &d1, &d2);

        assert!(client.verify(&pi, &proof));
    }

    #[test]
    fn wrong_winner_flag_rejected() {
        let (env, client) = setup();
        let sid = 8u32;
        let guess1 = [l('A'), l('B'), l('P')];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        // Claim player1 won even though player2's score is higher
        let pi = build_public_inputs(&env, 1, sid, &d1, &d2);

        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn tampered_salt_rejected() {
        let (env, client) = setup();
        let sid = 8u32;
        let guess1 = [l('A'), l('B'), l('P')];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        // Proof carries a different salt than the digests were built with
        let proof = build_proof(&env, &guess1, &[0xFFu8; 32], &guess2, &salt2);
        let pi = build_public_inputs(&env, 2, sid, &d1, &d2);

        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn swapped_guess_rejected_by_digest() {
        let (env, client) = setup();
        // Changing the guess after committing must fail the digest check
        let sid = 8u32;
        let committed = [l('A'), l('B'), l('C')];
        let swapped = [l('E'), l('A'), l('R')];
        let guess2 = [l('X'), l('Y'), l('Z')];
        let salt1 = [0x55u8; 32];
        let salt2 = [0x66u8; 32];

        let d1 = guess_digest(&env, &committed, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &swapped, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 2, sid, &d1, &d2);

        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn duplicate_letters_rejected() {
        let (env, client) = setup();
        let sid = 8u32;
        let guess1 = [l('P'), l('P'), l('X')];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 2, sid, &d1, &d2);

        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn out_of_range_letter_rejected() {
        let (env, client) = setup();
        let sid = 8u32;
        let guess1 = [26u32, 1, 2];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 2, sid, &d1, &d2);

        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn wrong_proof_length_rejected() {
        let (env, client) = setup();
        let d = [0u8; 32];
        let pi = build_public_inputs(&env, 1, 8, &d, &d);
        let proof = Bytes::from_array(&env, &[0u8; 40]);
        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn wrong_inputs_length_rejected() {
        let (env, client) = setup();
        let pi = vec![&env, 1u32, 8u32];
        let proof = Bytes::from_array(&env, &[0u8; 88]);
        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn invalid_flag_value_rejected() {
        let (env, client) = setup();
        let guess1 = [l('A'), l('B'), l('P')];
        let guess2 = [l('E'), l('A'), l('R')];
        let salt1 = [0x11u8; 32];
        let salt2 = [0x22u8; 32];
        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);
        let pi = build_public_inputs(&env, 3, 8, &d1, &d2);
        assert!(!client.verify(&pi, &proof));
    }

    #[test]
    fn occurrence_counting_double_letter() {
        let (env, client) = setup();
        // session 0 → "APPLE": {P,X,Y} hits both P slots → score 2.
        // Opponent {Q,R,S} scores 0 → player1 wins.
        let sid = 0u32;
        let guess1 = [l('P'), l('X'), l('Y')];
        let guess2 = [l('Q'), l('R'), l('S')];
        let salt1 = [0x77u8; 32];
        let salt2 = [0x88u8; 32];

        let d1 = guess_digest(&env, &guess1, &salt1);
        let d2 = guess_digest(&env, &guess2, &salt2);
        let proof = build_proof(&env, &guess1, &salt1, &guess2, &salt2);

        // score1 = 2 (occurrences), not 1 (distinct letters): flag 1 accepted
        let pi = build_public_inputs(&env, 1, sid, &d1, &d2);
        assert!(client.verify(&pi, &proof));
    }
}
