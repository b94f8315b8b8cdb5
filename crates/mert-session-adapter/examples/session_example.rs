/*
[INPUT]:  Local EVM private key and a running MERT backend
[OUTPUT]: Wallet session established and balance printed
[POS]:    Examples - session lifecycle demonstration
[UPDATE]: When the controller wiring changes
*/

use std::sync::Arc;

use mert_session_adapter::*;

/// Example: Wallet session lifecycle
///
/// 1. Create the session store and HTTP client
/// 2. Wire the controller to a connectivity source and an EVM signer
/// 3. Report the wallet connected and let the controller sign in
/// 4. Use the session for a protected call, then log out
///
/// Run with `MERT_PRIVATE_KEY=0x... cargo run --example session_example`.
#[tokio::main]
async fn main() {
    println!("=== MERT Session Example ===\n");

    let Ok(private_key) = std::env::var("MERT_PRIVATE_KEY") else {
        eprintln!("Set MERT_PRIVATE_KEY to a hex EVM private key");
        return;
    };

    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let client = match ExchangeClient::new(store.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created ({})", client.base_url());

    let signer = match EvmWalletSigner::new(&private_key) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Invalid private key: {}", e);
            return;
        }
    };
    let address = signer.address().to_string();
    println!("✓ Wallet {}", address);

    let wallet = Arc::new(WalletConnectivity::new());
    let controller = Arc::new(WalletSessionController::new(
        client.clone(),
        signer,
        store,
        wallet.clone(),
    ));

    controller
        .on_wallet_change(WalletConnection::connected(&address))
        .await;
    let session = controller.current_session();
    println!("✓ Session: {:?}", session.state);

    if session.is_verified() {
        match client.get_balance().await {
            Ok(balance) => println!(
                "  TRY {} / MERT {}",
                balance.try_balance, balance.token_balance
            ),
            Err(e) => eprintln!("  balance failed: {}", e),
        }
    } else {
        println!("  address-only session, protected calls are unavailable");
    }

    controller.logout();
    println!("\n✓ Logged out, wallet connected: {}", wallet.current().connected);
}
