//! Legislature bot: scheduler daemon and staff command line.
//!
//! ```bash
//! # Run the lifecycle scheduler
//! legislature-bot run
//!
//! # Submit and vote from the shell
//! legislature-bot propose --title "Parks Act" --body "..." --proposer 42
//! legislature-bot vote --bill 1 --voter 7 --choice yes
//!
//! # Staff overrides
//! legislature-bot open-debate --bill 1
//! legislature-bot start-vote --bill 1
//! legislature-bot veto --bill 1 --reason "Conflicts with the charter"
//! legislature-bot laws
//! ```

mod config;
mod daemon;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legislature::lifecycle::admin;
use legislature::{
    AdminReply, CastOutcome, EventBus, Legislature, LegislatureConfig, LogAnnouncer, ProposalId,
    ProposalStore, VoteChoice,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "LEGISLATURE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file and LEGISLATURE_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler daemon until interrupted
    Run,
    /// Submit a bill and open its debate
    Propose {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        proposer: i64,
    },
    /// Cast a ballot (yes, no, abstain)
    Vote {
        #[arg(long)]
        bill: ProposalId,
        #[arg(long)]
        voter: i64,
        #[arg(long)]
        choice: VoteChoice,
    },
    /// Open debate for a bill stuck in awaiting
    OpenDebate {
        #[arg(long)]
        bill: ProposalId,
    },
    /// Force voting open now
    StartVote {
        #[arg(long)]
        bill: ProposalId,
    },
    /// Force voting closed now and apply the tally
    EndVote {
        #[arg(long)]
        bill: ProposalId,
    },
    /// Veto a bill that has not concluded
    Veto {
        #[arg(long)]
        bill: ProposalId,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Move a bill to the archive
    Archive {
        #[arg(long)]
        bill: ProposalId,
    },
    /// Delete a bill and its ballots
    Remove {
        #[arg(long)]
        bill: ProposalId,
    },
    /// Show a bill's status and tally
    Show {
        #[arg(long)]
        bill: ProposalId,
    },
    /// List enacted laws, newest first
    Laws,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::resolve(args.config.as_deref(), args.db)?;
    let legislature = open(config)?;

    match args.command {
        Command::Run => {
            let resync = legislature.config().resync_interval();
            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, shutting down");
                }
                signal.cancel();
            });
            daemon::run(legislature, resync, shutdown).await
        }
        command => {
            let result = run_command(&legislature, command).await;
            // Timers armed here are picked up by the daemon's next resync.
            legislature.shutdown();
            result
        }
    }
}

fn open(config: LegislatureConfig) -> Result<Arc<Legislature>> {
    info!(database = %config.database_path.display(), "Opening proposal store");
    let store = ProposalStore::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?
        .shared();
    let announcer = Arc::new(LogAnnouncer::with_channels(config.channels.to_map()));
    Ok(Legislature::new(
        store,
        announcer,
        EventBus::new().shared(),
        config,
    ))
}

async fn run_command(legislature: &Legislature, command: Command) -> Result<()> {
    let reply = match command {
        Command::Run => anyhow::bail!("run is not a one-shot command"),
        Command::Propose {
            title,
            body,
            proposer,
        } => {
            let proposal = legislature.open_proposal(&title, &body, proposer).await?;
            AdminReply::success(format!(
                "Bill #{} submitted. Voting starts {}",
                proposal.id,
                proposal
                    .vote_start
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default()
            ))
        }
        Command::Vote {
            bill,
            voter,
            choice,
        } => {
            let message = match legislature.cast_vote(voter, bill, choice).await? {
                CastOutcome::Accepted => format!("Vote recorded: {} on Bill #{}", choice, bill),
                CastOutcome::AlreadyVoted {
                    existing: Some(existing),
                } => format!("Already voted {} on Bill #{}", existing, bill),
                CastOutcome::AlreadyVoted { existing: None } => {
                    format!("Already voted on Bill #{}", bill)
                }
                CastOutcome::VotingClosed => format!("Voting is not open for Bill #{}", bill),
            };
            AdminReply::success(message)
        }
        Command::OpenDebate { bill } => admin::open_debate(legislature, bill).await,
        Command::StartVote { bill } => admin::force_open_voting(legislature, bill).await,
        Command::EndVote { bill } => admin::force_close_voting(legislature, bill).await,
        Command::Veto { bill, reason } => admin::veto(legislature, bill, reason).await,
        Command::Archive { bill } => admin::archive(legislature, bill).await,
        Command::Remove { bill } => admin::remove(legislature, bill).await,
        Command::Show { bill } => admin::show(legislature, bill),
        Command::Laws => {
            let laws = admin::list_approved_laws(legislature)?;
            AdminReply::success(admin::format_laws(&laws))
        }
    };

    println!("{}", reply.message);
    if !reply.is_success() {
        anyhow::bail!("{:?}", reply.status);
    }
    Ok(())
}
