/*
[INPUT]:  Parsed subcommand, configuration, optional private key
[OUTPUT]: Session lifecycle actions and exchange calls printed to stdout
[POS]:    CLI layer - command dispatch
[UPDATE]: When adding subcommands or changing their output
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::{Subcommand, ValueEnum};
use console::style;
use mert_session_adapter::{
    ActionResponse, AuthState, Page, Session, SessionMode, SessionStore, TradeSide, Transaction,
    UserProfile,
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::CliConfig;
use crate::i18n::{Locale, MessageKey};
use crate::runtime::SessionRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for TradeSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => TradeSide::Buy,
            SideArg::Sell => TradeSide::Sell,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in with the configured wallet key
    Login,
    /// Show the stored session without contacting the backend
    Status,
    /// Clear the stored session
    Logout,
    /// Re-fetch the profile for the current session
    Refresh,
    /// Current token price
    Price,
    /// TRY and token balance
    Balance,
    /// Preview a trade without executing it
    Preview {
        #[arg(value_enum)]
        side: SideArg,
        amount: Decimal,
    },
    /// Buy tokens with the TRY balance
    Buy { amount: Decimal },
    /// Register an on-chain token transfer as a sale
    Sell { tx_hash: String },
    /// Trade history
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Backend view of the wallet connection
    WalletStatus,
    /// Admin actions
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Interactively write a configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Stats,
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    Transactions {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, value_enum)]
        side: Option<SideArg>,
    },
    SetPrice { price: Decimal },
    Mint { address: String, amount: Decimal },
    KycRegister { address: String },
    KycToggle {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    DepositTry { username: String, amount: Decimal },
}

/// Everything a command needs besides its own arguments
#[derive(Clone)]
pub struct CommandContext {
    pub config: CliConfig,
    pub private_key: Option<String>,
    pub shutdown: CancellationToken,
}

pub async fn execute(command: Command, ctx: &CommandContext) -> Result<()> {
    if let Command::Init { output } = command {
        let output = match output {
            Some(path) => path,
            None => crate::config::default_config_path()
                .context("could not determine config directory")?,
        };
        return crate::cli::init::run_init(output);
    }

    let runtime = SessionRuntime::start(&ctx.config, ctx.private_key.as_deref(), &ctx.shutdown)?;
    let result = dispatch(command, &runtime).await;
    runtime.shutdown().await;
    result
}

async fn dispatch(command: Command, rt: &SessionRuntime) -> Result<()> {
    let locale = rt.locale();
    match command {
        Command::Init { .. } => Ok(()),
        Command::Login => {
            let session = rt.connect().await?;
            print_session(&session, locale);
            Ok(())
        }
        Command::Status => {
            match rt.store().load() {
                Some(stored) => println!(
                    "{}: {}",
                    MessageKey::StoredSession.text(locale),
                    style(stored.address).cyan()
                ),
                None => println!("{}", MessageKey::NoStoredSession.text(locale)),
            }
            if let Some(address) = rt.address() {
                println!("wallet: {address}");
            }
            Ok(())
        }
        Command::Logout => {
            rt.controller().logout();
            info!("session cleared");
            println!("{}", MessageKey::LoggedOut.text(locale));
            Ok(())
        }
        Command::Refresh => {
            rt.connect().await?;
            let session = rt.controller().refresh_profile().await;
            if session.is_verified() {
                println!("{}", style(MessageKey::ProfileRefreshed.text(locale)).green());
            }
            print_session(&session, locale);
            Ok(())
        }
        Command::Price => {
            let quote = rt.client().get_price().await.context("fetch price")?;
            println!("{} TRY", quote.price);
            Ok(())
        }
        Command::Balance => {
            rt.require_verified().await?;
            let client = rt.client();
            let balance = client.get_balance().await.context("fetch balance")?;
            println!("TRY:   {}", balance.try_balance);
            println!("MERT:  {}", balance.token_balance);
            if let Ok(quote) = client.get_price().await {
                if let Some(max) = balance.max_buy_amount(quote.price) {
                    println!("max buy: {max} MERT @ {} TRY", quote.price);
                }
            }
            Ok(())
        }
        Command::Preview { side, amount } => {
            rt.require_verified().await?;
            let preview = rt
                .client()
                .preview_trade(side.into(), amount)
                .await
                .context("preview trade")?;
            if let Some(price) = preview.price {
                println!("price:  {price} TRY");
            }
            if let Some(total) = preview.try_total() {
                println!("TRY:    {total}");
            }
            if let Some(tokens) = preview.token_total() {
                println!("MERT:   {tokens}");
            }
            Ok(())
        }
        Command::Buy { amount } => {
            rt.require_verified().await?;
            let response = rt.client().buy_token(amount).await.context("buy tokens")?;
            print_action(&response, MessageKey::BuySuccess, locale);
            Ok(())
        }
        Command::Sell { tx_hash } => {
            rt.require_verified().await?;
            let response = rt.client().sell_token(&tx_hash).await.context("sell tokens")?;
            print_action(&response, MessageKey::SellSuccess, locale);
            Ok(())
        }
        Command::History { page, limit } => {
            rt.require_verified().await?;
            let history = rt
                .client()
                .trade_history(page, limit)
                .await
                .context("fetch trade history")?;
            print_transactions(&history, page);
            Ok(())
        }
        Command::WalletStatus => {
            rt.require_verified().await?;
            let status = rt.client().wallet_status().await.context("fetch wallet status")?;
            println!("connected: {}", status.connected);
            if let Some(address) = status.wallet_address {
                println!("address:   {address}");
            }
            Ok(())
        }
        Command::Admin(admin) => {
            rt.require_admin().await?;
            run_admin(admin, rt).await
        }
    }
}

async fn run_admin(command: AdminCommand, rt: &SessionRuntime) -> Result<()> {
    let client = rt.client();
    let locale = rt.locale();
    match command {
        AdminCommand::Stats => {
            let stats = client.admin_stats().await.context("fetch admin stats")?;
            println!("users:         {}", display_opt(stats.total_users));
            println!("transactions:  {}", display_opt(stats.total_transactions));
            println!("price:         {}", display_opt(stats.current_price));
            println!("admin balance: {}", display_opt(stats.admin_token_balance));
        }
        AdminCommand::Users { page, limit } => {
            let users = client.admin_users(page, limit).await.context("list users")?;
            for user in &users.items {
                print_user(user);
            }
            println!("page {page}/{}", users.total_pages);
        }
        AdminCommand::Transactions { page, limit, side } => {
            let history = client
                .admin_transactions(page, limit, side.map(TradeSide::from))
                .await
                .context("list transactions")?;
            print_transactions(&history, page);
        }
        AdminCommand::SetPrice { price } => {
            let response = client.admin_set_price(price).await.context("set price")?;
            print_action(&response, MessageKey::ActionDone, locale);
        }
        AdminCommand::Mint { address, amount } => {
            let response = client.admin_mint(&address, amount).await.context("mint tokens")?;
            print_action(&response, MessageKey::ActionDone, locale);
        }
        AdminCommand::KycRegister { address } => {
            let response = client
                .admin_kyc_register(&address)
                .await
                .context("register KYC")?;
            print_action(&response, MessageKey::ActionDone, locale);
        }
        AdminCommand::KycToggle { enabled } => {
            let response = client.admin_kyc_toggle(enabled).await.context("toggle KYC")?;
            print_action(&response, MessageKey::ActionDone, locale);
        }
        AdminCommand::DepositTry { username, amount } => {
            let response = client
                .admin_deposit_try(&username, amount)
                .await
                .context("deposit TRY")?;
            print_action(&response, MessageKey::ActionDone, locale);
        }
    }
    Ok(())
}

/// One-line summary of the session state
pub fn describe_session(session: &Session, locale: Locale) -> String {
    match &session.state {
        AuthState::Unauthenticated => MessageKey::StatusUnauthenticated.text(locale).to_string(),
        AuthState::Authenticating { address } => {
            format!("{} ({address})", MessageKey::StatusAuthenticating.text(locale))
        }
        AuthState::Authenticated { profile, mode } => {
            let label = match mode {
                SessionMode::Verified => MessageKey::StatusVerified.text(locale),
                SessionMode::AddressOnly { .. } => MessageKey::StatusAddressOnly.text(locale),
            };
            let admin = if profile.is_admin { " [admin]" } else { "" };
            format!("{label}: {}{admin}", profile.wallet_address)
        }
    }
}

fn print_session(session: &Session, locale: Locale) {
    let line = describe_session(session, locale);
    if session.is_verified() {
        println!("{}", style(line).green());
    } else {
        println!("{}", style(line).yellow());
    }
    if let Some(profile) = session.profile() {
        print_user(profile);
    }
}

fn print_user(user: &UserProfile) {
    let name = user.username.as_deref().unwrap_or("-");
    println!(
        "  {name:<16} {}  TRY {}  MERT {}",
        user.wallet_address,
        display_opt(user.try_balance),
        display_opt(user.token_balance)
    );
}

fn print_transactions(page: &Page<Transaction>, current: u32) {
    for tx in &page.items {
        println!(
            "  {:<4} {:>14} MERT {:>14} TRY  {:?}  {}",
            tx.side.as_str(),
            tx.token_amount,
            tx.try_amount,
            tx.status,
            tx.created_at.as_deref().map(format_timestamp).unwrap_or_default()
        );
    }
    println!("page {}/{}", current.max(1), page.total_pages);
}

fn print_action(response: &ActionResponse, success: MessageKey, locale: Locale) {
    let text = response
        .message
        .clone()
        .unwrap_or_else(|| success.text(locale).to_string());
    println!("{}", style(text).green());
}

/// Backend timestamps are RFC 3339 or SQLite `YYYY-MM-DD HH:MM:SS` (UTC)
fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => naive
            .and_utc()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_else(|| "-".to_string())
}
