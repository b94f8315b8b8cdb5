/*
[INPUT]:  CLI configuration, optional wallet private key, shutdown token
[OUTPUT]: Running session controller wired to the file store and HTTP client
[POS]:    Application layer - session wiring for one CLI invocation
[UPDATE]: When changing how commands obtain a session
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use console::style;
use mert_session_adapter::session::same_address;
use mert_session_adapter::{
    EvmWalletSigner, ExchangeClient, ExchangeError, FileSessionStore, Session, SessionEvent,
    WalletConnectivity, WalletSessionController, WalletSigner,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::i18n::{Locale, MessageKey, event_message};

/// Signer used when no private key was supplied
#[derive(Debug)]
struct MissingKeySigner;

#[async_trait]
impl WalletSigner for MissingKeySigner {
    async fn sign_message(&self, _message: &str) -> mert_session_adapter::Result<String> {
        Err(ExchangeError::WalletUnavailable(
            "no private key configured".to_string(),
        ))
    }
}

/// Session controller, client and store for one CLI invocation.
///
/// The controller runs its event loop in the background; the local key acts
/// as the wallet and is reported connected on [`connect`](Self::connect).
pub struct SessionRuntime {
    locale: Locale,
    client: Arc<ExchangeClient>,
    store: Arc<FileSessionStore>,
    wallet: Arc<WalletConnectivity>,
    controller: Arc<WalletSessionController>,
    address: Option<String>,
    login_timeout: Duration,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Build and start the runtime. Must be called inside a tokio runtime.
    pub fn start(
        config: &CliConfig,
        private_key: Option<&str>,
        shutdown: &CancellationToken,
    ) -> Result<Self> {
        let session_path = config.session_path()?;
        let store = Arc::new(
            FileSessionStore::open(&session_path)
                .with_context(|| format!("open session store {}", session_path.display()))?,
        );
        let client = Arc::new(
            ExchangeClient::with_config(config.client_config(), store.clone())
                .context("create exchange client")?,
        );

        let (signer, address): (Arc<dyn WalletSigner>, Option<String>) = match private_key {
            Some(key) => {
                let signer = EvmWalletSigner::new(key).context("invalid private key")?;
                let address = signer.address().to_string();
                (Arc::new(signer), Some(address))
            }
            None => (Arc::new(MissingKeySigner), None),
        };

        let wallet = Arc::new(WalletConnectivity::new());
        let controller = Arc::new(WalletSessionController::with_config(
            config.controller_config(),
            client.clone(),
            signer,
            store.clone(),
            wallet.clone(),
        ));

        let shutdown = shutdown.child_token();
        let printer = spawn_event_printer(
            controller.subscribe_events(),
            config.locale,
            shutdown.clone(),
        );
        let runner = tokio::spawn(controller.clone().run(
            wallet.subscribe(),
            client.subscribe_events(),
            shutdown.clone(),
        ));

        debug!(session_file = %session_path.display(), has_key = address.is_some(), "session runtime started");

        Ok(Self {
            locale: config.locale,
            client,
            store,
            wallet,
            controller,
            address,
            login_timeout: Duration::from_secs(config.timeout_secs.saturating_mul(3)),
            shutdown,
            tasks: vec![printer, runner],
        })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn client(&self) -> &ExchangeClient {
        &self.client
    }

    pub fn store(&self) -> &FileSessionStore {
        &self.store
    }

    pub fn controller(&self) -> &WalletSessionController {
        &self.controller
    }

    /// Wallet address derived from the private key, if one was supplied
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn session(&self) -> Session {
        self.controller.current_session()
    }

    /// Report the local wallet as connected and wait until the controller
    /// has settled on a session for it.
    pub async fn connect(&self) -> Result<Session> {
        let address = self
            .address
            .as_deref()
            .ok_or_else(|| anyhow!(MessageKey::PrivateKeyRequired.text(self.locale)))?;

        let mut sessions = self.controller.subscribe();
        self.wallet.connect(address);

        let settled = sessions.wait_for(|session| {
            session.is_authenticated()
                && session
                    .address()
                    .is_some_and(|current| same_address(current, address))
        });

        tokio::select! {
            _ = self.shutdown.cancelled() => bail!("interrupted"),
            result = tokio::time::timeout(self.login_timeout, settled) => {
                let session = result
                    .context("timed out waiting for wallet session")?
                    .context("session controller stopped")?
                    .clone();
                info!(address = %address, verified = session.is_verified(), "wallet session ready");
                Ok(session)
            }
        }
    }

    /// Connect and require a backend-verified session
    pub async fn require_verified(&self) -> Result<Session> {
        let session = self.connect().await?;
        if !session.is_verified() {
            bail!(MessageKey::AddressOnlySession.text(self.locale));
        }
        Ok(session)
    }

    /// Connect and require an admin session
    pub async fn require_admin(&self) -> Result<Session> {
        let session = self.require_verified().await?;
        if !session.is_admin() {
            bail!(MessageKey::AdminRequired.text(self.locale));
        }
        Ok(session)
    }

    /// Stop the controller loop and flush pending notifications
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(err) = task.await {
                debug!(error = %err, "runtime task ended abnormally");
            }
        }
    }
}

fn spawn_event_printer(
    mut events: broadcast::Receiver<SessionEvent>,
    locale: Locale,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    while let Ok(event) = events.try_recv() {
                        print_event(&event, locale);
                    }
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => print_event(&event, locale),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

fn print_event(event: &SessionEvent, locale: Locale) {
    let text = event_message(event).text(locale);
    let styled = match event {
        SessionEvent::SignInStarted { .. } => style(text).cyan(),
        SessionEvent::SignedIn { .. } => style(text).green(),
        SessionEvent::Degraded { .. } => style(text).yellow(),
        SessionEvent::SignedOut { .. } => style(text).dim(),
    };
    eprintln!("{styled}");
}
