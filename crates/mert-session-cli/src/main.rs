/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Wallet session actions and exchange calls
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mert_session_cli::cli::{self, Command, CommandContext};
use mert_session_cli::{CliConfig, MessageKey};

#[derive(Parser)]
#[command(name = "mert-session", version, about = "MERT Token wallet session client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    /// Hex EVM private key acting as the wallet
    #[arg(long = "private-key", env = "MERT_PRIVATE_KEY", hide_env_values = true, global = true)]
    private_key: Option<String>,
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Some(Command::Init { .. }) = &args.command {
        init_tracing(&args.log_level, None)?;
        let command = args.command.clone().context("init command")?;
        return cli::execute(command, &context(CliConfig::default(), &args)).await;
    }

    let config = load_config(args.config_path.as_deref())?;
    let _log_guard = init_tracing(&args.log_level, config.log_dir.as_deref())?;

    info!(
        config_path = ?args.config_path,
        api_base_url = %config.api_base_url,
        dry_run = args.dry_run,
        "starting mert-session"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        println!("{}", MessageKey::ConfigValid.text(config.locale));
        return Ok(());
    }

    let Some(command) = args.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = context(config, &args);
    setup_signal_handlers(ctx.shutdown.clone());

    cli::execute(command, &ctx).await
}

fn context(config: CliConfig, args: &Cli) -> CommandContext {
    CommandContext {
        config,
        private_key: args
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string),
        shutdown: CancellationToken::new(),
    }
}

fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "mert-session.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(None)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let config = CliConfig::load(path).context("load config")?;
    config.validate().context("validate config")?;
    Ok(config)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
