/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for mert-session-adapter tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mert_session_adapter::{
    ClientConfig, ExchangeClient, MemorySessionStore, MockWalletSigner, Session, SessionStore,
    WalletConnectivity, WalletSessionController,
};
use serde_json::{Value, json};
use tokio::sync::watch;
use wiremock::MockServer;

/// Hardhat account #0, never holds real funds
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api` prefix
pub fn client_for(server: &MockServer, store: Arc<dyn SessionStore>) -> ExchangeClient {
    let config = ClientConfig {
        base_url: format!("{}/api", server.uri()),
        ..ClientConfig::default()
    };
    ExchangeClient::with_config(config, store).expect("client init")
}

pub fn user_json(address: &str, is_admin: u8) -> Value {
    json!({
        "id": 7,
        "username": "mert",
        "wallet_address": address,
        "is_admin": is_admin,
        "try_balance": "1500.25",
        "token_balance": 40
    })
}

/// Controller wired to a real client against the mock backend
pub struct Fixture {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub client: Arc<ExchangeClient>,
    pub signer: Arc<MockWalletSigner>,
    pub wallet: Arc<WalletConnectivity>,
    pub controller: Arc<WalletSessionController>,
}

pub async fn fixture() -> Fixture {
    fixture_with(MockWalletSigner::new("0xsigned"), MemorySessionStore::new()).await
}

pub async fn fixture_with(signer: MockWalletSigner, store: MemorySessionStore) -> Fixture {
    let server = setup_mock_server().await;
    let store = Arc::new(store);
    let client = Arc::new(client_for(&server, store.clone()));
    let signer = Arc::new(signer);
    let wallet = Arc::new(WalletConnectivity::new());
    let controller = Arc::new(WalletSessionController::new(
        client.clone(),
        signer.clone(),
        store.clone(),
        wallet.clone(),
    ));

    Fixture {
        server,
        store,
        client,
        signer,
        wallet,
        controller,
    }
}

/// Wait until the session satisfies `predicate`, failing after two seconds
pub async fn wait_for_session(
    rx: &mut watch::Receiver<Session>,
    predicate: impl FnMut(&Session) -> bool,
) -> Session {
    let session = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("session transition timed out")
        .expect("session channel closed");
    session.clone()
}
