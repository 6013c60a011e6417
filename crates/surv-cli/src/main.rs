/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Wallet sign-in, backend queries and session monitoring
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::commands::{self, JobAction, StatusArg};
use surv_cli::{AppContext, SurvConfig};

#[derive(Parser, Debug)]
#[command(name = "surv", version, about = "Surv field-service command line client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,
    /// Also write logs to a daily file in DIR
    #[arg(long = "log-dir", value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,
    /// Validate the configuration and exit
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration file interactively
    Init {
        #[arg(long, short, default_value = "surv.yaml")]
        output: PathBuf,
    },
    /// Sign in with the local wallet
    Login {
        /// Unlock through the wallet host
        #[arg(long)]
        redirect: bool,
        /// Create a wallet without asking
        #[arg(long, short)]
        yes: bool,
    },
    /// Sign out of the wallet and the backend
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List jobs
    Jobs {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show or change one job
    Job {
        id: String,
        #[arg(value_enum, default_value_t = JobAction::Show)]
        action: JobAction,
    },
    /// List customers
    Customers {
        #[arg(long, short)]
        search: Option<String>,
        /// Filter locally instead of on the server
        #[arg(long)]
        local: bool,
    },
    /// Business overview; with a date range, also revenue and technicians
    Dashboard {
        #[arg(long, value_name = "YYYY-MM-DD")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        to: Option<NaiveDate>,
    },
    /// Check access to a resource
    Access {
        resource: String,
        #[arg(long, default_value = "read")]
        action: String,
    },
    /// Sign out when the wallet session expires
    Watch {
        #[arg(long, default_value = "/")]
        route: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_dir.as_deref())?;
    let command = args.command.unwrap_or(Command::Whoami);

    if let Command::Init { output } = command {
        return cli::init::run_init(output);
    }

    let config = load_config(args.config_path.as_deref())?;
    info!(
        api = %config.api_base_url,
        dry_run = args.dry_run,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let ctx = AppContext::new(config)?;
    match command {
        Command::Init { .. } => Ok(()),
        Command::Login { redirect, yes } => commands::login(&ctx, redirect, yes).await,
        Command::Logout => commands::logout(&ctx).await,
        Command::Whoami => commands::whoami(&ctx).await,
        Command::Jobs {
            status,
            from,
            to,
            limit,
        } => commands::jobs(&ctx, status, from, to, limit).await,
        Command::Job { id, action } => commands::job(&ctx, &id, action).await,
        Command::Customers { search, local } => {
            commands::customers(&ctx, search.as_deref(), local).await
        }
        Command::Dashboard { from, to } => commands::dashboard(&ctx, from, to).await,
        Command::Access { resource, action } => commands::access(&ctx, &resource, &action).await,
        Command::Watch { route } => {
            let shutdown = CancellationToken::new();
            setup_signal_handlers(shutdown.clone());
            commands::watch(&ctx, &route, shutdown).await
        }
    }
}

fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "surv.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<SurvConfig> {
    SurvConfig::load(path).context("load config")
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
