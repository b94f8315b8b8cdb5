/*
[INPUT]:  Wallet keys and connected addresses
[OUTPUT]: Signed sign-in challenges and signer errors
[POS]:    Auth layer - wallet side of the sign-in protocol
[UPDATE]: When auth flow or signature methods change
*/

pub mod challenge;
pub mod evm_wallet;
pub mod wallet;

pub use challenge::{Challenge, ChallengeClock, DEFAULT_APP_NAME};
pub use evm_wallet::EvmWalletSigner;
pub use wallet::{MockSignBehavior, MockWalletSigner, SignGate, WalletSigner};
