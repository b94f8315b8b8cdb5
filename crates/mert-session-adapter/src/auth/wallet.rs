/*
[INPUT]:  Challenge message to sign
[OUTPUT]: Signature string, or a wallet-side failure
[POS]:    Auth layer - challenge signer abstraction
[UPDATE]: When adding new wallet types or changing signature format
*/

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::http::{ExchangeError, Result};

/// Trait for wallet signing operations
///
/// The call may suspend for as long as the user takes to approve it; it
/// fails with [`ExchangeError::UserRejected`] when declined and
/// [`ExchangeError::WalletUnavailable`] when the wallet cannot sign at all.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign a message and return the signature
    ///
    /// For EVM: Returns hex-encoded personal-sign signature (0x...)
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// What a [`MockWalletSigner`] does when asked to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSignBehavior {
    Sign(String),
    Reject,
    Unavailable(String),
}

/// Releases signatures held by a gated [`MockWalletSigner`]
#[derive(Debug, Clone)]
pub struct SignGate {
    permits: Arc<Semaphore>,
}

impl SignGate {
    /// Let one pending (or future) signature request complete
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

/// Mock wallet signer for testing
///
/// Records every message it is asked to sign. A gated signer holds each
/// request until [`SignGate::release`] is called, which simulates a user
/// who has not answered the wallet prompt yet.
#[derive(Debug)]
pub struct MockWalletSigner {
    behavior: Mutex<MockSignBehavior>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(signature: &str) -> Self {
        Self::with_behavior(MockSignBehavior::Sign(signature.to_string()))
    }

    /// A signer whose user declines every request
    pub fn rejecting() -> Self {
        Self::with_behavior(MockSignBehavior::Reject)
    }

    /// A signer whose wallet is locked or gone
    pub fn unavailable(reason: &str) -> Self {
        Self::with_behavior(MockSignBehavior::Unavailable(reason.to_string()))
    }

    pub fn with_behavior(behavior: MockSignBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every request until the returned gate releases it
    pub fn gated(mut self) -> (Self, SignGate) {
        let permits = Arc::new(Semaphore::new(0));
        self.gate = Some(permits.clone());
        (self, SignGate { permits })
    }

    pub fn set_behavior(&self, behavior: MockSignBehavior) {
        *self.behavior.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Messages received so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    async fn sign_message(&self, message: &str) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ExchangeError::WalletUnavailable("wallet closed".to_string()))?;
            permit.forget();
        }

        let behavior = self
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match behavior {
            MockSignBehavior::Sign(signature) => Ok(signature),
            MockSignBehavior::Reject => Err(ExchangeError::UserRejected),
            MockSignBehavior::Unavailable(reason) => Err(ExchangeError::WalletUnavailable(reason)),
        }
    }
}
