/*
[INPUT]:  Wallet provider connect/disconnect notifications
[OUTPUT]: Latest WalletConnection via `watch` + disconnect requests
[POS]:    Session layer - wallet connectivity source
[UPDATE]: When connection shape or disconnect handling changes
*/

use tokio::sync::watch;
use tracing::debug;

/// Snapshot of the wallet provider's connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletConnection {
    pub connected: bool,
    pub address: Option<String>,
}

impl WalletConnection {
    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            connected: true,
            address: Some(address.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// The address, only while connected and non-empty
    pub fn active_address(&self) -> Option<&str> {
        if !self.connected {
            return None;
        }
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// Lets the session ask the wallet provider to drop its connection.
pub trait WalletControl: Send + Sync {
    fn request_disconnect(&self);
}

/// Owning side of a push-only connectivity source.
///
/// Whoever talks to the wallet provider calls [`connect`](Self::connect) and
/// [`disconnect`](Self::disconnect); consumers hold a `watch::Receiver` that
/// always contains the latest connection. Re-reporting an identical
/// connection does not wake receivers.
#[derive(Debug)]
pub struct WalletConnectivity {
    tx: watch::Sender<WalletConnection>,
}

impl WalletConnectivity {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WalletConnection::disconnected());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletConnection> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> WalletConnection {
        self.tx.borrow().clone()
    }

    pub fn connect(&self, address: &str) {
        self.report(WalletConnection::connected(address));
    }

    pub fn disconnect(&self) {
        self.report(WalletConnection::disconnected());
    }

    pub fn report(&self, next: WalletConnection) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if changed {
            debug!(connected = next.connected, address = ?next.address, "wallet connection changed");
        }
    }
}

impl Default for WalletConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletControl for WalletConnectivity {
    fn request_disconnect(&self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_address_requires_connection() {
        assert_eq!(
            WalletConnection::connected("0xabc").active_address(),
            Some("0xabc")
        );
        assert_eq!(WalletConnection::connected("  ").active_address(), None);
        assert_eq!(
            WalletConnection {
                connected: false,
                address: Some("0xabc".to_string()),
            }
            .active_address(),
            None
        );
    }

    #[tokio::test]
    async fn test_identical_reports_do_not_wake_receivers() {
        let source = WalletConnectivity::new();
        let mut rx = source.subscribe();

        source.connect("0xabc");
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        source.connect("0xabc");
        assert!(!rx.has_changed().unwrap());

        source.request_disconnect();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), WalletConnection::disconnected());
    }
}
