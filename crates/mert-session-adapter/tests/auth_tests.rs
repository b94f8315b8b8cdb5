/*
[INPUT]:  Test keys and challenge parameters
[OUTPUT]: Test results for signers and challenges
[POS]:    Integration tests - authentication
[UPDATE]: When signer or challenge format changes
*/

mod common;

use common::{TEST_ADDRESS, TEST_PRIVATE_KEY};
use mert_session_adapter::auth::{DEFAULT_APP_NAME, MockSignBehavior};
use mert_session_adapter::{
    ChallengeClock, EvmWalletSigner, ExchangeError, MockWalletSigner, WalletSigner,
};
use tokio_test::assert_ok;

#[tokio::test]
async fn test_mock_wallet_signer_behaviors() {
    let wallet = MockWalletSigner::new("0xmock_signature");
    let signature = assert_ok!(wallet.sign_message("test").await);
    assert_eq!(signature, "0xmock_signature");

    wallet.set_behavior(MockSignBehavior::Reject);
    let err = wallet.sign_message("test").await.unwrap_err();
    assert!(matches!(err, ExchangeError::UserRejected));
    assert!(err.is_wallet_error());

    assert_eq!(wallet.requests(), vec!["test".to_string(), "test".to_string()]);
}

#[tokio::test]
async fn test_evm_signer_signs_challenge() {
    let signer = assert_ok!(EvmWalletSigner::new(TEST_PRIVATE_KEY));
    assert_eq!(signer.address(), TEST_ADDRESS);

    let clock = ChallengeClock::new();
    let challenge = clock.challenge(DEFAULT_APP_NAME, signer.address());
    assert!(
        challenge
            .message()
            .starts_with(&format!("MERT Token Wallet Link: {TEST_ADDRESS} - "))
    );

    let signature = assert_ok!(signer.sign_message(challenge.message()).await);
    assert!(signature.starts_with("0x"));
    assert_eq!(signature.len(), 2 + 65 * 2);
}

#[test]
fn test_evm_signer_rejects_bad_key() {
    let err = EvmWalletSigner::new("not-a-key").unwrap_err();
    assert!(matches!(err, ExchangeError::Config(_)));
}

#[test]
fn test_challenges_never_repeat() {
    let clock = ChallengeClock::new();
    let first = clock.challenge(DEFAULT_APP_NAME, "0xabc");
    let second = clock.challenge(DEFAULT_APP_NAME, "0xabc");
    assert_ne!(first.message(), second.message());
}
