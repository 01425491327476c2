//! CLI binary for homecue.
//!
//! Tasks and users live in a JSON snapshot; every command loads it, works on
//! the in-memory store and writes it back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use homecue_core::app::{App, AppBuilder};
use homecue_core::domain::{HouseHealthScore, Task, TaskId, TaskStatus, UserId};
use homecue_core::impls::{InMemoryTaskStore, InMemoryUserDirectory, Snapshot};
use homecue_core::HomecueConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// homecue: background jobs for home-maintenance tasks.
#[derive(Parser)]
#[command(name = "homecue", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "homecue.toml")]
    config: PathBuf,

    /// Snapshot file; overrides `store.snapshot_path`.
    #[arg(short, long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler until Ctrl+C or SIGTERM.
    Run,

    /// Run every job once and print what happened.
    Tick,

    /// Show the house-health score of a user.
    Health {
        #[arg(long)]
        user: i64,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List a user's open tasks.
    Tasks {
        #[arg(long)]
        user: i64,

        /// Only tasks due today.
        #[arg(long, conflicts_with = "days")]
        today: bool,

        /// Tasks due within this many days.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Set the status of a task (pending, completed, overdue).
    SetStatus { task: i64, status: TaskStatus },

    /// Flip a task between completed and pending.
    Toggle { task: i64 },

    /// Delete a task.
    Delete { task: i64 },
}

/// Loaded stores plus the wired application.
struct Session {
    app: App,
    store: Arc<InMemoryTaskStore>,
    users: Arc<InMemoryUserDirectory>,
    snapshot_path: PathBuf,
}

impl Session {
    fn open(config: HomecueConfig, snapshot_path: PathBuf) -> anyhow::Result<Self> {
        let snapshot = Snapshot::load(&snapshot_path)
            .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;
        info!(
            path = %snapshot_path.display(),
            tasks = snapshot.tasks.len(),
            users = snapshot.users.len(),
            "snapshot loaded"
        );

        let (store, users) = snapshot.into_stores();
        let store = Arc::new(store);
        let users = Arc::new(users);
        let app = AppBuilder::new(store.clone(), users.clone())
            .config(config)
            .build()?;

        Ok(Self {
            app,
            store,
            users,
            snapshot_path,
        })
    }

    async fn save(&self) -> anyhow::Result<()> {
        Snapshot::capture(&self.store, &self.users)
            .await
            .save(&self.snapshot_path)
            .with_context(|| format!("saving snapshot {}", self.snapshot_path.display()))?;
        info!(path = %self.snapshot_path.display(), "snapshot saved");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let snapshot_path = cli
        .data
        .clone()
        .unwrap_or_else(|| config.store.snapshot_path.clone());
    let mut session = Session::open(config, snapshot_path)?;

    match cli.command {
        Command::Run => run_until_shutdown(&mut session).await,
        Command::Tick => tick(&session).await,
        Command::Health { user, json } => health(&session, UserId::new(user), json).await,
        Command::Tasks { user, today, days } => {
            list_tasks(&session, UserId::new(user), today, days).await
        }
        Command::SetStatus { task, status } => {
            let task = session.app.tasks.set_status(TaskId::new(task), status).await?;
            print_task(&task);
            session.save().await
        }
        Command::Toggle { task } => {
            let task = session.app.tasks.toggle_completion(TaskId::new(task)).await?;
            print_task(&task);
            session.save().await
        }
        Command::Delete { task } => {
            let id = TaskId::new(task);
            if !session.app.tasks.delete_task(id).await? {
                anyhow::bail!("task not found: {id}");
            }
            println!("deleted {id}");
            session.save().await
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<HomecueConfig> {
    let config = HomecueConfig::load_or_default(path)
        .with_context(|| format!("loading config {}", path.display()))?
        .with_env();
    config.validate()?;
    Ok(config)
}

async fn run_until_shutdown(session: &mut Session) -> anyhow::Result<()> {
    info!("homecue v{} starting", env!("CARGO_PKG_VERSION"));
    session.app.scheduler.start();

    shutdown_signal().await;
    info!("shutdown requested");

    session.app.scheduler.stop_and_join().await;
    session.save().await
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn tick(session: &Session) -> anyhow::Result<()> {
    let summary = session.app.scheduler.run_once().await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    session.save().await
}

async fn health(session: &Session, user: UserId, json: bool) -> anyhow::Result<()> {
    let score = session.app.tasks.house_health(user).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        print_health(&score);
    }
    Ok(())
}

fn print_health(score: &HouseHealthScore) {
    let status = score.status();
    println!("House health for {}: {}/100", score.user_id, score.overall_score);
    println!("{}", status.message());
    println!();
    println!("  daily     {:>3}", score.daily_score);
    println!("  weekly    {:>3}", score.weekly_score);
    println!("  monthly   {:>3}", score.monthly_score);
    println!("  seasonal  {:>3}", score.seasonal_score);
    println!("  annual    {:>3}", score.annual_score);
    println!();
    for line in score.recommendations() {
        println!("- {line}");
    }
}

async fn list_tasks(session: &Session, user: UserId, today: bool, days: u32) -> anyhow::Result<()> {
    let tasks = if today {
        session.app.tasks.tasks_due_today(user).await?
    } else {
        session.app.tasks.upcoming_tasks(user, days).await?
    };
    if tasks.is_empty() {
        println!("nothing due");
    }
    for task in &tasks {
        print_task(task);
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!(
        "{:<8} {:<10} {:<9} {:<6} {}",
        task.id.to_string(),
        task.status.as_str(),
        task.frequency.as_str(),
        task.priority.as_str(),
        task.title,
    );
    println!("         due {}", task.due_date.format("%Y-%m-%d %H:%M UTC"));
}
