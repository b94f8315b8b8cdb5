/*
[INPUT]:  Tokens, bound addresses and profiles produced by the controller
[OUTPUT]: Session snapshot, authentication state and session events
[POS]:    Session layer - reactive session value
[UPDATE]: When adding states, degraded reasons or event kinds
*/

use std::fmt;

use crate::http::ExchangeError;
use crate::types::UserProfile;

/// Why a session fell back to the address-only identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// The user declined the signature prompt
    SignatureRejected,
    /// The wallet could not sign at all
    WalletUnavailable,
    /// The backend refused the signed challenge
    BackendRejected,
    /// The backend could not be reached or failed
    BackendUnavailable,
    /// The backend accepted the signature but issued no token
    NoTokenIssued,
}

impl DegradedReason {
    pub fn from_error(err: &ExchangeError) -> Self {
        match err {
            ExchangeError::UserRejected => DegradedReason::SignatureRejected,
            ExchangeError::WalletUnavailable(_) => DegradedReason::WalletUnavailable,
            ExchangeError::Authentication { .. } | ExchangeError::Unauthorized => {
                DegradedReason::BackendRejected
            }
            _ => DegradedReason::BackendUnavailable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DegradedReason::SignatureRejected => "signature_rejected",
            DegradedReason::WalletUnavailable => "wallet_unavailable",
            DegradedReason::BackendRejected => "backend_rejected",
            DegradedReason::BackendUnavailable => "backend_unavailable",
            DegradedReason::NoTokenIssued => "no_token_issued",
        }
    }
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an authenticated session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The backend issued or validated a token
    Verified,
    /// Wallet-only identity; protected calls will be rejected
    AddressOnly { reason: DegradedReason },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating { address: String },
    Authenticated { profile: UserProfile, mode: SessionMode },
}

/// The reactive session value.
///
/// `token` is only ever present together with `bound_address`, and while a
/// wallet is connected the bound address equals the connected one.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub bound_address: Option<String>,
    pub state: AuthState,
}

impl Session {
    pub fn empty() -> Self {
        Self {
            token: None,
            bound_address: None,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match &self.state {
            AuthState::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<SessionMode> {
        match &self.state {
            AuthState::Authenticated { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    pub fn is_authenticating(&self) -> bool {
        matches!(self.state, AuthState::Authenticating { .. })
    }

    /// Authenticated with a backend-validated token
    pub fn is_verified(&self) -> bool {
        self.token.is_some() && self.mode() == Some(SessionMode::Verified)
    }

    pub fn is_admin(&self) -> bool {
        self.profile().is_some_and(|profile| profile.is_admin)
    }

    /// Wallet address of the authenticated or authenticating identity
    pub fn address(&self) -> Option<&str> {
        match &self.state {
            AuthState::Unauthenticated => None,
            AuthState::Authenticating { address } => Some(address),
            AuthState::Authenticated { profile, .. } => Some(&profile.wallet_address),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("bound_address", &self.bound_address)
            .field("state", &self.state)
            .finish()
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    Logout,
    WalletDisconnected,
    Unauthorized,
}

/// Notifications published by the controller for user-facing feedback
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignInStarted { address: String },
    SignedIn { address: String, restored: bool },
    Degraded { address: String, reason: DegradedReason },
    SignedOut { reason: SignOutReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session {
            token: Some("secret-token".to_string()),
            bound_address: Some("0xabc".to_string()),
            state: AuthState::Unauthenticated,
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_address_only_session_is_authenticated_but_not_verified() {
        let session = Session {
            token: None,
            bound_address: None,
            state: AuthState::Authenticated {
                profile: UserProfile::address_only("0xAbC"),
                mode: SessionMode::AddressOnly {
                    reason: DegradedReason::SignatureRejected,
                },
            },
        };
        assert!(session.is_authenticated());
        assert!(!session.is_verified());
        assert!(!session.is_admin());
        assert_eq!(session.address(), Some("0xAbC"));
    }

    #[test]
    fn test_degraded_reason_from_error() {
        assert_eq!(
            DegradedReason::from_error(&ExchangeError::UserRejected),
            DegradedReason::SignatureRejected
        );
        assert_eq!(
            DegradedReason::from_error(&ExchangeError::Authentication {
                message: "bad signature".to_string()
            }),
            DegradedReason::BackendRejected
        );
        assert_eq!(
            DegradedReason::from_error(&ExchangeError::Timeout { duration: 30 }),
            DegradedReason::BackendUnavailable
        );
    }
}
