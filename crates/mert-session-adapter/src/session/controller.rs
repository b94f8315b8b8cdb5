/*
[INPUT]:  Wallet connectivity reports, signer, backend session API, session store
[OUTPUT]: Reactive Session value and SessionEvent notifications
[POS]:    Session layer - wallet-session reconciliation
[UPDATE]: When changing state transitions, fast-path restore or stale-result rules
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::{ChallengeClock, DEFAULT_APP_NAME, WalletSigner};
use crate::http::{ClientEvent, ExchangeError};
use crate::notify::Notifier;
use crate::session::api::SessionApi;
use crate::session::connectivity::{WalletConnection, WalletControl};
use crate::session::state::{
    AuthState, DegradedReason, Session, SessionEvent, SessionMode, SignOutReason,
};
use crate::session::store::{SessionStore, StoredSession, normalize_address, same_address};
use crate::types::{ConnectResponse, UserProfile};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Application name embedded in the challenge message
    pub app_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// Latest connectivity the controller has observed.
///
/// `epoch` moves whenever a new reconciliation starts or the session is torn
/// down; an async result may only be committed under the epoch it started in.
#[derive(Debug, Default)]
struct Observed {
    address: Option<String>,
    epoch: u64,
    seen_connection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Ticket {
    address: Option<String>,
    epoch: u64,
}

impl Observed {
    fn ticket(&self) -> Ticket {
        Ticket {
            address: self.address.clone(),
            epoch: self.epoch,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.epoch == ticket.epoch && self.address == ticket.address
    }
}

/// Reconciles wallet connectivity, the persisted session and the backend.
///
/// Public methods never return errors: failures surface as state transitions
/// on [`subscribe`](Self::subscribe) and as [`SessionEvent`]s.
pub struct WalletSessionController {
    config: ControllerConfig,
    api: Arc<dyn SessionApi>,
    signer: Arc<dyn WalletSigner>,
    store: Arc<dyn SessionStore>,
    wallet: Arc<dyn WalletControl>,
    clock: ChallengeClock,
    observed: Mutex<Observed>,
    session: watch::Sender<Session>,
    events: Notifier<SessionEvent>,
}

impl std::fmt::Debug for WalletSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSessionController")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("session", &*self.session.borrow())
            .finish()
    }
}

impl WalletSessionController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        signer: Arc<dyn WalletSigner>,
        store: Arc<dyn SessionStore>,
        wallet: Arc<dyn WalletControl>,
    ) -> Self {
        Self::with_config(ControllerConfig::default(), api, signer, store, wallet)
    }

    /// Create a controller hydrated from `store`. No network calls are made
    /// until a wallet connection is reported.
    pub fn with_config(
        config: ControllerConfig,
        api: Arc<dyn SessionApi>,
        signer: Arc<dyn WalletSigner>,
        store: Arc<dyn SessionStore>,
        wallet: Arc<dyn WalletControl>,
    ) -> Self {
        let initial = hydrate(store.as_ref());
        let (session, _rx) = watch::channel(initial);

        Self {
            config,
            api,
            signer,
            store,
            wallet,
            clock: ChallengeClock::new(),
            observed: Mutex::new(Observed::default()),
            session,
            events: Notifier::new(),
        }
    }

    /// Non-blocking snapshot of the current session
    pub fn current_session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Reactive session value; every transition is published.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn events(&self) -> &Notifier<SessionEvent> {
        &self.events
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Reconcile one connectivity report.
    pub async fn on_wallet_change(&self, connection: WalletConnection) {
        match connection.active_address() {
            Some(address) => self.on_connected(address).await,
            None => self.on_disconnected(),
        }
    }

    /// Clear the session and ask the wallet to disconnect. Idempotent.
    pub fn logout(&self) {
        let changed = {
            let mut observed = self.lock_observed();
            observed.address = None;
            observed.epoch += 1;
            self.clear_session()
        };

        self.wallet.request_disconnect();

        if changed {
            info!("logged out");
            self.events.publish(SessionEvent::SignedOut {
                reason: SignOutReason::Logout,
            });
        }
    }

    /// Re-fetch the profile with the current token.
    ///
    /// A 401 clears the token (state becomes `Unauthenticated`) without
    /// disconnecting the wallet; other failures leave the session unchanged.
    pub async fn refresh_profile(&self) -> Session {
        let (ticket, token) = {
            let observed = self.lock_observed();
            let session = self.session.borrow();
            let Some(token) = session.token.clone() else {
                debug!("no session token, skipping profile refresh");
                return session.clone();
            };
            (observed.ticket(), token)
        };

        match self.api.me(&token).await {
            Ok(profile) => {
                let observed = self.lock_observed();
                let committed = observed.is_current(&ticket)
                    && self.session.send_if_modified(|session| {
                        if session.token.as_deref() != Some(token.as_str()) {
                            return false;
                        }
                        let bound_connected = match (&observed.address, &session.bound_address) {
                            (Some(connected), Some(bound)) => same_address(connected, bound),
                            _ => false,
                        };
                        if !bound_connected {
                            return false;
                        }
                        let fallback = session.bound_address.clone().unwrap_or_default();
                        session.state = AuthState::Authenticated {
                            profile: profile.with_fallback_address(&fallback),
                            mode: SessionMode::Verified,
                        };
                        true
                    });
                if committed {
                    debug!("profile refreshed");
                } else {
                    debug!("discarding stale profile refresh");
                }
            }
            Err(ExchangeError::Unauthorized) => self.handle_unauthorized(&token),
            Err(err) => warn!(error = %err, "profile refresh failed, keeping session"),
        }

        self.current_session()
    }

    /// A backend call carrying `token` was rejected with 401.
    ///
    /// Clears the session only while `token` is still the current one; the
    /// wallet stays connected.
    pub fn handle_unauthorized(&self, token: &str) {
        let signed_out = {
            let _observed = self.lock_observed();
            let was_authenticated = {
                let session = self.session.borrow();
                if session.token.as_deref() != Some(token) {
                    debug!("ignoring 401 for a superseded token");
                    return;
                }
                session.is_authenticated()
            };
            if let Err(err) = self.store.clear_if_token(token) {
                warn!(error = %err, "failed to clear rejected session token");
            }
            self.session.send_replace(Session::empty());
            was_authenticated
        };

        if signed_out {
            info!("session token rejected, signed out");
            self.events.publish(SessionEvent::SignedOut {
                reason: SignOutReason::Unauthorized,
            });
        } else {
            debug!("stored session token rejected before use");
        }
    }

    /// Run the sign-in flow again for the currently connected wallet.
    ///
    /// Used after a 401 when the caller wants a fresh token without waiting
    /// for the next connectivity report.
    pub async fn reauthenticate(&self) {
        let address = self.lock_observed().address.clone();
        match address {
            Some(address) => self.on_connected(&address).await,
            None => debug!("no connected wallet, nothing to re-authenticate"),
        }
    }

    /// Drive the controller from a connectivity source and client events
    /// until `shutdown` fires.
    ///
    /// Each connectivity change is reconciled on its own task, so a pending
    /// signature never blocks a later report.
    pub async fn run(
        self: Arc<Self>,
        mut connections: watch::Receiver<WalletConnection>,
        mut client_events: broadcast::Receiver<ClientEvent>,
        shutdown: CancellationToken,
    ) {
        let mut tasks = JoinSet::new();
        let mut events_open = true;

        let initial = connections.borrow_and_update().clone();
        self.spawn_reconcile(&mut tasks, initial);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("session controller shutting down");
                    break;
                }
                changed = connections.changed() => {
                    if changed.is_err() {
                        info!("wallet connectivity source closed");
                        break;
                    }
                    let connection = connections.borrow_and_update().clone();
                    self.spawn_reconcile(&mut tasks, connection);
                }
                event = client_events.recv(), if events_open => match event {
                    Ok(ClientEvent::Unauthorized { token }) => self.handle_unauthorized(&token),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "client events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("client event channel closed");
                        events_open = false;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "wallet reconciliation task failed");
                    }
                }
            }
        }

        tasks.shutdown().await;
    }

    fn spawn_reconcile(self: &Arc<Self>, tasks: &mut JoinSet<()>, connection: WalletConnection) {
        let controller = Arc::clone(self);
        tasks.spawn(async move {
            controller.on_wallet_change(connection).await;
        });
    }

    async fn on_connected(&self, address: &str) {
        let normalized = normalize_address(address);

        let ticket = {
            let mut observed = self.lock_observed();
            let same_wallet = observed.address.as_deref() == Some(normalized.as_str());
            if same_wallet {
                let session = self.session.borrow();
                if session.is_authenticated() || session.is_authenticating() {
                    debug!(address = %normalized, "wallet re-reported, session already handled");
                    return;
                }
            }
            observed.address = Some(normalized.clone());
            observed.seen_connection = true;
            observed.epoch += 1;
            observed.ticket()
        };

        if let Some(stored) = self.store.load() {
            if same_address(&stored.address, &normalized) {
                if self.restore(&ticket, address, stored).await {
                    return;
                }
            } else {
                debug!(address = %normalized, "stored session bound to another wallet, discarding");
            }
        }

        self.sign_in(&ticket, address).await;
    }

    /// Fast path: validate the stored token without asking the wallet to sign.
    /// Returns true when the flow is finished, either restored or superseded.
    async fn restore(&self, ticket: &Ticket, address: &str, stored: StoredSession) -> bool {
        match self.api.me(&stored.token).await {
            Ok(profile) => {
                let committed = self.commit(ticket, |_, session| {
                    *session = Session {
                        token: Some(stored.token.clone()),
                        bound_address: Some(stored.address.clone()),
                        state: AuthState::Authenticated {
                            profile: profile.with_fallback_address(address),
                            mode: SessionMode::Verified,
                        },
                    };
                });
                if committed {
                    info!(address = %stored.address, "session restored from stored token");
                    self.events.publish(SessionEvent::SignedIn {
                        address: address.to_string(),
                        restored: true,
                    });
                } else {
                    debug!("discarding stale session restore");
                }
                true
            }
            Err(err) => {
                info!(error = %err, "stored session token rejected, signing in again");
                let committed = self.commit(ticket, |store, session| {
                    if let Err(err) = store.clear_if_token(&stored.token) {
                        warn!(error = %err, "failed to purge stored session");
                    }
                    if session.token.as_deref() == Some(stored.token.as_str()) {
                        *session = Session::empty();
                    }
                });
                !committed
            }
        }
    }

    async fn sign_in(&self, ticket: &Ticket, address: &str) {
        let started = self.commit(ticket, |store, session| {
            if let Err(err) = store.clear() {
                warn!(error = %err, "failed to clear stale session");
            }
            *session = Session {
                token: None,
                bound_address: None,
                state: AuthState::Authenticating {
                    address: address.to_string(),
                },
            };
        });
        if !started {
            return;
        }

        info!(address = %address, "requesting wallet signature");
        self.events.publish(SessionEvent::SignInStarted {
            address: address.to_string(),
        });

        let challenge = self.clock.challenge(&self.config.app_name, address);
        let outcome = match self.signer.sign_message(challenge.message()).await {
            Ok(signature) => self.api.connect(challenge.message(), &signature).await,
            Err(err) => Err(err),
        };

        let (next, event) = self.settle(address, outcome);
        let committed = self.commit(ticket, |store, session| {
            if let Some(token) = &next.token {
                if let Err(err) = store.save(token, address) {
                    warn!(error = %err, "failed to persist session token");
                }
            }
            *session = next;
        });

        if committed {
            self.events.publish(event);
        } else {
            debug!(address = %address, "discarding stale sign-in result");
        }
    }

    /// Turn a sign round-trip outcome into the session to commit.
    fn settle(
        &self,
        address: &str,
        outcome: crate::http::Result<ConnectResponse>,
    ) -> (Session, SessionEvent) {
        let degraded = |profile: UserProfile, reason: DegradedReason| {
            (
                Session {
                    token: None,
                    bound_address: None,
                    state: AuthState::Authenticated {
                        profile,
                        mode: SessionMode::AddressOnly { reason },
                    },
                },
                SessionEvent::Degraded {
                    address: address.to_string(),
                    reason,
                },
            )
        };

        match outcome {
            Ok(ConnectResponse {
                token: Some(token),
                user,
            }) => {
                let profile = user
                    .map(|user| user.with_fallback_address(address))
                    .unwrap_or_else(|| UserProfile::address_only(address));
                info!(address = %address, is_admin = profile.is_admin, "wallet signed in");
                (
                    Session {
                        token: Some(token),
                        bound_address: Some(normalize_address(address)),
                        state: AuthState::Authenticated {
                            profile,
                            mode: SessionMode::Verified,
                        },
                    },
                    SessionEvent::SignedIn {
                        address: address.to_string(),
                        restored: false,
                    },
                )
            }
            Ok(ConnectResponse { token: None, user }) => {
                warn!(address = %address, "backend accepted signature without issuing a token");
                let profile = user
                    .map(|user| user.with_fallback_address(address))
                    .unwrap_or_else(|| UserProfile::address_only(address));
                degraded(profile, DegradedReason::NoTokenIssued)
            }
            Err(err) => {
                let reason = DegradedReason::from_error(&err);
                warn!(address = %address, error = %err, %reason, "sign-in failed, using address-only session");
                degraded(UserProfile::address_only(address), reason)
            }
        }
    }

    fn on_disconnected(&self) {
        let changed = {
            let mut observed = self.lock_observed();
            if !observed.seen_connection {
                debug!("no wallet connected yet, keeping hydrated session");
                return;
            }
            observed.address = None;
            observed.epoch += 1;
            self.clear_session()
        };

        if changed {
            info!("wallet disconnected, session cleared");
            self.events.publish(SessionEvent::SignedOut {
                reason: SignOutReason::WalletDisconnected,
            });
        }
    }

    /// Clear store and memory. Caller holds the observed lock.
    fn clear_session(&self) -> bool {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.session.send_if_modified(|session| {
            let changed = *session != Session::empty();
            *session = Session::empty();
            changed
        })
    }

    /// Apply `update` only while `ticket` is still current.
    fn commit<F>(&self, ticket: &Ticket, update: F) -> bool
    where
        F: FnOnce(&dyn SessionStore, &mut Session),
    {
        let observed = self.lock_observed();
        if !observed.is_current(ticket) {
            return false;
        }
        self.session.send_modify(|session| update(self.store.as_ref(), session));
        true
    }

    fn lock_observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Session reconstructed from the store at startup.
fn hydrate(store: &dyn SessionStore) -> Session {
    match store.load() {
        Some(stored) => {
            debug!(address = %stored.address, "hydrated stored session");
            Session {
                token: Some(stored.token),
                bound_address: Some(stored.address),
                state: AuthState::Unauthenticated,
            }
        }
        None => {
            if store.token().is_some() || store.bound_address().is_some() {
                warn!("stored session is incomplete, discarding");
                if let Err(err) = store.clear() {
                    warn!(error = %err, "failed to discard incomplete session");
                }
            }
            Session::empty()
        }
    }
}
