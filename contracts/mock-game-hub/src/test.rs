#![cfg(test)]

//! Unit tests for the mock Game Hub's stake-escrow accounting.

use crate::{HubError, LockedStake, MockGameHub, MockGameHubClient, RESULT_PLAYER1, RESULT_REFUND};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, Env};

fn setup() -> (Env, MockGameHubClient<'static>, Address, Address, Address) {
    let env = Env::default();
    let contract_id = env.register(MockGameHub, ());
    let client = MockGameHubClient::new(&env, &contract_id);
    let game = Address::generate(&env);
    let player1 = Address::generate(&env);
    let player2 = Address::generate(&env);
    (env, client, game, player1, player2)
}

fn assert_hub_error<T>(
    result: &Result<Result<T, soroban_sdk::ConversionError>, Result<HubError, soroban_sdk::InvokeError>>,
    expected: HubError,
) {
    match result {
        Err(Ok(actual)) => assert_eq!(*actual, expected),
        other => panic!("Expected {:?}, got unexpected outcome: {:?}", expected, other.is_ok()),
    }
}

#[test]
fn lock_and_pay_winner() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &1_000);
    client.fund(&player2, &1_000);

    client.start_game(&game, &7, &player1, &player2, &400, &300);
    assert_eq!(client.balance(&player1), 600);
    assert_eq!(client.balance(&player2), 700);
    assert_eq!(
        client.get_stake(&7),
        LockedStake {
            game,
            player1: player1.clone(),
            player2: player2.clone(),
            player1_points: 400,
            player2_points: 300,
        }
    );

    client.end_game(&7, &RESULT_PLAYER1);
    assert_eq!(client.balance(&player1), 1_300);
    assert_eq!(client.balance(&player2), 700);
}

#[test]
fn refund_returns_stakes_unchanged() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &500);
    client.fund(&player2, &500);

    client.start_game(&game, &7, &player1, &player2, &200, &200);
    client.end_game(&7, &RESULT_REFUND);

    assert_eq!(client.balance(&player1), 500);
    assert_eq!(client.balance(&player2), 500);
}

#[test]
fn insufficient_balance_rejected() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &100);
    client.fund(&player2, &1_000);

    let result = client.try_start_game(&game, &7, &player1, &player2, &200, &200);
    assert_hub_error(&result, HubError::InsufficientBalance);
    // Nothing was deducted
    assert_eq!(client.balance(&player1), 100);
    assert_eq!(client.balance(&player2), 1_000);
}

#[test]
fn duplicate_session_rejected() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &1_000);
    client.fund(&player2, &1_000);

    client.start_game(&game, &7, &player1, &player2, &100, &100);
    let result = client.try_start_game(&game, &7, &player1, &player2, &100, &100);
    assert_hub_error(&result, HubError::SessionAlreadyOpen);
}

#[test]
fn double_release_rejected() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &1_000);
    client.fund(&player2, &1_000);

    client.start_game(&game, &7, &player1, &player2, &100, &100);
    client.end_game(&7, &RESULT_PLAYER1);

    // Escrow consumed: a second release cannot pay out again
    let result = client.try_end_game(&7, &RESULT_PLAYER1);
    assert_hub_error(&result, HubError::SessionNotFound);
    assert_eq!(client.balance(&player1), 1_100);
}

#[test]
fn invalid_result_rejected() {
    let (_env, client, game, player1, player2) = setup();
    client.fund(&player1, &1_000);
    client.fund(&player2, &1_000);

    client.start_game(&game, &7, &player1, &player2, &100, &100);
    let result = client.try_end_game(&7, &9);
    assert_hub_error(&result, HubError::InvalidResult);
}

#[test]
fn negative_stake_rejected() {
    let (_env, client, game, player1, player2) = setup();
    let result = client.try_start_game(&game, &7, &player1, &player2, &-5, &100);
    assert_hub_error(&result, HubError::InvalidStake);
}
