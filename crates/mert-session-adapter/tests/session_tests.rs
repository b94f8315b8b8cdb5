/*
[INPUT]:  Mock backend, mock wallet signer and in-memory session store
[OUTPUT]: Test results for the wallet-session lifecycle
[POS]:    Integration tests - session controller against the HTTP client
[UPDATE]: When session transitions or persistence rules change
*/

mod common;

use common::{fixture, fixture_with, user_json, wait_for_session};
use mert_session_adapter::session::{DegradedReason, SignOutReason};
use mert_session_adapter::{
    AuthState, ExchangeError, MemorySessionStore, MockWalletSigner, Session, SessionEvent,
    SessionMode, SessionStore, WalletConnection,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn stored(token: &str, address: &str) -> MemorySessionStore {
    let store = MemorySessionStore::new();
    store.save(token, address).unwrap();
    store
}

async fn mount_connect(server: &wiremock::MockServer, token: &str, address: &str) {
    Mock::given(method("POST"))
        .and(path("/api/wallet/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": token,
            "user": user_json(address, 0)
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_connect_stores_bound_token() {
    let fx = fixture().await;
    mount_connect(&fx.server, "tkn1", "0xABC").await;
    let mut events = fx.controller.subscribe_events();

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xABC"))
        .await;

    let requests = fx.signer.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("MERT Token Wallet Link: 0xABC - "));

    assert_eq!(fx.store.token().as_deref(), Some("tkn1"));
    assert_eq!(fx.store.bound_address().as_deref(), Some("0xabc"));

    let session = fx.controller.current_session();
    assert_eq!(session.token.as_deref(), Some("tkn1"));
    assert_eq!(session.bound_address.as_deref(), Some("0xabc"));
    assert_eq!(session.mode(), Some(SessionMode::Verified));
    assert_eq!(session.profile().unwrap().username.as_deref(), Some("mert"));

    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignInStarted {
            address: "0xABC".to_string()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedIn {
            address: "0xABC".to_string(),
            restored: false
        }
    );
}

#[tokio::test]
async fn test_reconnect_with_valid_token_skips_signing() {
    let fx = fixture_with(MockWalletSigner::new("0xsigned"), stored("tkn1", "0xabc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tkn1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("0xabc", 1)
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/connect"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&fx.server)
        .await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xABC"))
        .await;

    assert_eq!(fx.signer.call_count(), 0);
    let session = fx.controller.current_session();
    assert!(session.is_verified());
    assert!(session.is_admin());
    assert_eq!(session.token.as_deref(), Some("tkn1"));
    assert_eq!(fx.store.token().as_deref(), Some("tkn1"));
}

#[tokio::test]
async fn test_reconnect_with_expired_token_signs_again() {
    let fx = fixture_with(MockWalletSigner::new("0xsigned"), stored("tkn1", "0xabc")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tkn1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fx.server)
        .await;
    mount_connect(&fx.server, "tkn2", "0xabc").await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xabc"))
        .await;

    assert_eq!(fx.signer.call_count(), 1);
    assert_eq!(fx.store.token().as_deref(), Some("tkn2"));
    assert_eq!(fx.store.bound_address().as_deref(), Some("0xabc"));
    assert!(fx.controller.current_session().is_verified());
}

#[tokio::test]
async fn test_disconnect_clears_session() {
    let fx = fixture().await;
    mount_connect(&fx.server, "tkn1", "0xabc").await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xabc"))
        .await;
    assert!(fx.controller.current_session().is_authenticated());

    let mut events = fx.controller.subscribe_events();
    fx.controller
        .on_wallet_change(WalletConnection::disconnected())
        .await;

    assert_eq!(fx.controller.current_session(), Session::empty());
    assert!(fx.store.load().is_none());
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedOut {
            reason: SignOutReason::WalletDisconnected
        }
    );
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let fx = fixture().await;
    mount_connect(&fx.server, "tkn1", "0xabc").await;
    fx.wallet.connect("0xabc");
    fx.controller
        .on_wallet_change(WalletConnection::connected("0xabc"))
        .await;

    fx.controller.logout();
    let once = fx.controller.current_session();
    fx.controller.logout();
    let twice = fx.controller.current_session();

    assert_eq!(once, Session::empty());
    assert_eq!(once, twice);
    assert!(fx.store.load().is_none());
    assert!(!fx.wallet.current().connected);
}

#[tokio::test]
async fn test_declined_signature_falls_back_to_address_only() {
    let fx = fixture_with(MockWalletSigner::rejecting(), MemorySessionStore::new()).await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/connect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fx.server)
        .await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xABC"))
        .await;

    let session = fx.controller.current_session();
    assert!(session.token.is_none());
    assert!(session.bound_address.is_none());
    assert!(fx.store.load().is_none());
    match session.state {
        AuthState::Authenticated { profile, mode } => {
            assert_eq!(profile.wallet_address, "0xABC");
            assert!(!profile.is_admin);
            assert_eq!(
                mode,
                SessionMode::AddressOnly {
                    reason: DegradedReason::SignatureRejected
                }
            );
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn test_backend_rejection_falls_back_to_address_only() {
    let fx = fixture().await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/connect"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "expired" })))
        .mount(&fx.server)
        .await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xabc"))
        .await;

    let session = fx.controller.current_session();
    assert_eq!(
        session.mode(),
        Some(SessionMode::AddressOnly {
            reason: DegradedReason::BackendRejected
        })
    );
    assert!(fx.store.load().is_none());
}

#[tokio::test]
async fn test_accepted_without_token_is_address_only() {
    let fx = fixture().await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("0xabc", 1)
        })))
        .mount(&fx.server)
        .await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xabc"))
        .await;

    let session = fx.controller.current_session();
    assert!(session.token.is_none());
    assert!(session.is_admin());
    assert_eq!(
        session.mode(),
        Some(SessionMode::AddressOnly {
            reason: DegradedReason::NoTokenIssued
        })
    );
    assert!(fx.store.load().is_none());
}

#[tokio::test]
async fn test_hydration_makes_no_network_calls() {
    let fx = fixture_with(MockWalletSigner::new("0xsigned"), stored("tkn1", "0xabc")).await;

    let session = fx.controller.current_session();
    assert_eq!(session.token.as_deref(), Some("tkn1"));
    assert_eq!(session.state, AuthState::Unauthenticated);
    assert!(fx.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_switching_wallets_discards_binding() {
    let fx = fixture_with(MockWalletSigner::new("0xsigned"), stored("tkn1", "0xaaa")).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("0xaaa", 0)))
        .expect(0)
        .mount(&fx.server)
        .await;
    mount_connect(&fx.server, "tkn-b", "0xbbb").await;

    fx.controller
        .on_wallet_change(WalletConnection::connected("0xBBB"))
        .await;

    assert_eq!(fx.signer.call_count(), 1);
    assert_eq!(fx.store.token().as_deref(), Some("tkn-b"));
    assert_eq!(fx.store.bound_address().as_deref(), Some("0xbbb"));
}

#[tokio::test]
async fn test_run_loop_recovers_from_unauthorized_call() {
    let fx = fixture().await;
    mount_connect(&fx.server, "tkn1", "0xabc").await;
    Mock::given(method("GET"))
        .and(path("/api/trade/balance"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fx.server)
        .await;

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(fx.controller.clone().run(
        fx.wallet.subscribe(),
        fx.client.subscribe_events(),
        shutdown.clone(),
    ));
    let mut sessions = fx.controller.subscribe();

    fx.wallet.connect("0xabc");
    wait_for_session(&mut sessions, Session::is_verified).await;

    let err = fx.client.get_balance().await.unwrap_err();
    assert!(matches!(err, ExchangeError::Unauthorized));

    let session = wait_for_session(&mut sessions, |session| session.token.is_none()).await;
    assert_eq!(session.state, AuthState::Unauthenticated);
    assert!(fx.store.load().is_none());
    assert!(fx.wallet.current().connected);

    shutdown.cancel();
    runner.await.unwrap();
}

#[tokio::test]
async fn test_run_loop_follows_disconnect() {
    let fx = fixture().await;
    mount_connect(&fx.server, "tkn1", "0xabc").await;

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(fx.controller.clone().run(
        fx.wallet.subscribe(),
        fx.client.subscribe_events(),
        shutdown.clone(),
    ));
    let mut sessions = fx.controller.subscribe();

    fx.wallet.connect("0xabc");
    wait_for_session(&mut sessions, Session::is_verified).await;

    fx.wallet.disconnect();
    wait_for_session(&mut sessions, |session| *session == Session::empty()).await;
    assert!(fx.store.load().is_none());

    shutdown.cancel();
    runner.await.unwrap();
}
