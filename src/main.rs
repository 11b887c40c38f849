//! # Rollcall: weekly attendance poll bot
//!
//! Usage:
//!   rollcall                      # Run bot, scheduler and gateway
//!   rollcall send-poll            # Open a poll right now
//!   rollcall status               # Show the open round
//!   rollcall clear                # Discard the open round
//!   rollcall next                 # Show upcoming trigger times
//!   rollcall init                 # Write a default config file

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use rollcall_bot::{Bot, BotEvent};
use rollcall_channels::{TelegramClient, TelegramPoller};
use rollcall_core::config::TransportMode;
use rollcall_core::traits::{Clock, Transport};
use rollcall_core::{IncomingEvent, RollcallConfig, RollcallError};
use rollcall_gateway::GatewayState;
use rollcall_poll::{RoundArchive, SnapshotStore};
use rollcall_scheduler::{FireLedger, SystemClock, TriggerEngine, spawn_trigger_loop};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rollcall",
    version,
    about = "📋 Rollcall: weekly attendance poll bot for Telegram"
)]
struct Cli {
    /// Config file (default: ~/.rollcall/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot, scheduler and HTTP gateway
    Run,
    /// Open a poll immediately (closing any open one)
    SendPoll,
    /// Print the open round and tracked participants
    Status,
    /// Discard the open round without a reminder
    Clear,
    /// Print the next fire time of every trigger
    Next,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rollcall_core::config::load_dotenv();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug,hyper=info,h2=info,reqwest=info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("ROLLCALL_CONFIG").ok().map(PathBuf::from));
    if let Some(Commands::Init { force }) = &cli.command {
        let path = config_path.unwrap_or_else(RollcallConfig::default_path);
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        RollcallConfig::default().save_to(&path)?;
        println!("📝 Wrote default config to {}", path.display());
        println!("   Set BOT_TOKEN and CHAT_ID (or edit [telegram]) before `rollcall run`.");
        return Ok(());
    }

    let mut config = match &config_path {
        Some(path) => RollcallConfig::load_from(path)?,
        None => RollcallConfig::load()?,
    };
    config.apply_env();

    let data_dir = config.storage.resolved_dir();
    std::fs::create_dir_all(&data_dir)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, data_dir).await,
        Commands::SendPoll => {
            config.validate()?;
            let mut bot = build_cli_bot(&config, &data_dir)?;
            match bot.open_round(true).await? {
                Some(id) => println!("✅ Poll #{id} opened"),
                None => println!("📊 A poll is already open"),
            }
            Ok(())
        }
        Commands::Status => {
            let snapshot = SnapshotStore::new(&data_dir).load();
            match &snapshot.poll {
                Some(poll) => {
                    println!("📊 Poll #{} opened {}", poll.id, poll.opened_at);
                    if let Some(due) = poll.expected_close_at {
                        println!("   Report due: {due}");
                    }
                    println!(
                        "   Answers: {} ({} yes)",
                        poll.answer_count(),
                        poll.affirmative_count()
                    );
                }
                None => println!("📭 No open poll"),
            }
            println!("👥 Tracked participants: {}", snapshot.directory.len());

            let archive = RoundArchive::open(&data_dir.join("rollcall.db"))?;
            for round in archive.recent(5)? {
                println!(
                    "   #{} {} ({} confirmed, delivered: {})",
                    round.poll_id,
                    round.outcome.as_str(),
                    round.summary.confirmed_count,
                    round.delivered
                );
            }
            Ok(())
        }
        Commands::Clear => {
            let mut bot = build_cli_bot(&config, &data_dir)?;
            match bot.clear() {
                Ok(id) => println!("🧹 Poll #{id} cleared"),
                Err(e) => println!("📭 {e}"),
            }
            Ok(())
        }
        Commands::Init { .. } => Ok(()),
        Commands::Next => {
            let engine = TriggerEngine::from_config(
                &config.schedule,
                FireLedger::open(&data_dir),
                chrono::Utc::now(),
            )?;
            for trigger in engine.triggers() {
                let next = trigger
                    .next_run
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".into());
                println!("⏰ {:<12} {:<28} → {next}", trigger.name, trigger.describe());
            }
            Ok(())
        }
    }
}

/// One-shot bot for `send-poll`/`clear`. Refused while `rollcall run` owns
/// the data directory.
fn build_cli_bot(config: &RollcallConfig, data_dir: &std::path::Path) -> Result<Bot> {
    match build_bot(config, data_dir) {
        Err(RollcallError::Busy(dir)) => anyhow::bail!(
            "rollcall is already running on {dir}; use /sendpoll or /clear in the chat instead"
        ),
        other => Ok(other?),
    }
}

fn build_bot(config: &RollcallConfig, data_dir: &std::path::Path) -> rollcall_core::Result<Bot> {
    let transport: Arc<dyn Transport> = Arc::new(TelegramClient::new(
        &config.telegram.bot_token,
        &config.telegram.chat_id,
    ));
    let archive = RoundArchive::open(&data_dir.join("rollcall.db"))?;
    let bot = Bot::new(
        config.clone(),
        Arc::new(SystemClock),
        transport,
        SnapshotStore::new(data_dir),
        Some(archive),
    )?;
    Ok(bot)
}

async fn run(config: RollcallConfig, data_dir: PathBuf) -> Result<()> {
    config.validate()?;
    tracing::info!("📋 Rollcall v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("📁 Data directory: {}", data_dir.display());

    let client = TelegramClient::new(&config.telegram.bot_token, &config.telegram.chat_id);
    match client.get_me().await {
        Ok(me) => tracing::info!("🤖 Logged in as @{}", me.username.unwrap_or_default()),
        Err(e) => tracing::warn!("⚠️ getMe failed: {e}"),
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bot = build_bot(&config, &data_dir)?;
    let (tx, rx) = mpsc::unbounded_channel::<BotEvent>();

    // Scheduler
    let engine = TriggerEngine::from_config(&config.schedule, FireLedger::open(&data_dir), clock.now())?;
    tokio::spawn(spawn_trigger_loop(
        engine,
        clock,
        config.schedule.check_interval_secs,
        tx.clone(),
    ));

    // Telegram updates
    let webhook_path = match config.telegram.mode {
        TransportMode::Polling => {
            let mut stream =
                TelegramPoller::new(client.clone(), config.telegram.poll_interval).start_polling();
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    if tx.send(BotEvent::from(event)).is_err() {
                        break;
                    }
                }
            });
            None
        }
        TransportMode::Webhook => {
            let url = format!(
                "{}{}",
                config.telegram.webhook_url.trim_end_matches('/'),
                config.telegram.webhook_path
            );
            client.set_webhook(&url, &config.telegram.webhook_secret).await?;
            tracing::info!("🔗 Webhook registered at {url}");
            Some(config.telegram.webhook_path.clone())
        }
    };

    // Gateway
    if config.gateway.enabled || webhook_path.is_some() {
        let (gw_tx, mut gw_rx) = mpsc::unbounded_channel::<IncomingEvent>();
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = gw_rx.recv().await {
                if tx.send(BotEvent::from(event)).is_err() {
                    break;
                }
            }
        });

        let state = Arc::new(GatewayState::new(gw_tx, &config.telegram.webhook_secret));
        let router = rollcall_gateway::build_router(state, webhook_path.as_deref());
        let host = config.gateway.host.clone();
        let port = config.gateway.port;
        tokio::spawn(async move {
            if let Err(e) = rollcall_gateway::start(&host, port, router).await {
                tracing::error!("❌ Gateway stopped: {e}");
            }
        });
    }

    drop(tx);

    tokio::select! {
        _ = bot.run(rx) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("👋 Shutting down");
        }
    }
    Ok(())
}
