/*
[INPUT]:  Wallet connectivity, signer, backend session API and local storage
[OUTPUT]: Wallet-session controller and its reactive session value
[POS]:    Session layer - authentication lifecycle
[UPDATE]: When adding session components or changing exports
*/

pub mod api;
pub mod connectivity;
pub mod controller;
pub mod state;
pub mod store;

pub use api::SessionApi;
pub use connectivity::{WalletConnection, WalletConnectivity, WalletControl};
pub use controller::{ControllerConfig, WalletSessionController};
pub use state::{AuthState, DegradedReason, Session, SessionEvent, SessionMode, SignOutReason};
pub use store::{
    FileSessionStore, MemorySessionStore, SessionKey, SessionStore, StoredSession,
    normalize_address, same_address,
};
