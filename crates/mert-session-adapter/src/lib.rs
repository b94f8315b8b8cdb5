/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public MERT session adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod notify;
pub mod session;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    Challenge,
    ChallengeClock,
    EvmWalletSigner,
    MockWalletSigner,
    SignGate,
    WalletSigner,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    ClientEvent,
    ExchangeClient,
    ExchangeError,
    Result,
};

pub use notify::Notifier;

// Re-export commonly used types from session
pub use session::{
    AuthState,
    ControllerConfig,
    FileSessionStore,
    MemorySessionStore,
    Session,
    SessionApi,
    SessionEvent,
    SessionMode,
    SessionStore,
    WalletConnection,
    WalletConnectivity,
    WalletSessionController,
};

// Re-export all types
pub use types::*;
