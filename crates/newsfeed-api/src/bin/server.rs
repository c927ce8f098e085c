//! newsfeed preferences server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `NEWSFEED_*` environment variables, opens the SQLite store and either
//! serves the JSON API or runs one administrative command.
//!
//! ```text
//! server                                         # serve
//! server report
//! server migrate --dry-run perspective --from liberal --to progressive
//! server migrate fact-checking --enabled true --user u1 --user u2
//! server migrate create-missing --batch-size 50
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};
use newsfeed_api::{AppState, ServerConfig};
use newsfeed_core::preferences::{AiModel, Perspective, Tone};
use newsfeed_service::{MigrationOptions, PreferenceMigrator};
use newsfeed_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Newsfeed preferences server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print adoption and value distribution statistics.
  Report,
  /// Run a bulk preference migration.
  Migrate(MigrateArgs),
}

#[derive(Args)]
struct MigrateArgs {
  /// Report the affected users without writing anything.
  #[arg(long, global = true)]
  dry_run: bool,

  /// Users per bulk update; defaults to `migration_batch_size`.
  #[arg(long, global = true)]
  batch_size: Option<usize>,

  #[command(subcommand)]
  target: MigrateTarget,
}

#[derive(Subcommand)]
enum MigrateTarget {
  /// Move every user at one perspective to another.
  Perspective {
    #[arg(long)]
    from: Perspective,
    #[arg(long)]
    to:   Perspective,
  },
  /// Move every user at one tone to another.
  Tone {
    #[arg(long)]
    from: Tone,
    #[arg(long)]
    to:   Tone,
  },
  /// Move every user at one AI model to another.
  AiModel {
    #[arg(long)]
    from: AiModel,
    #[arg(long)]
    to:   AiModel,
  },
  /// Switch fact checking on or off, for the listed users or everyone.
  FactChecking {
    #[arg(long, action = ArgAction::Set)]
    enabled: bool,
    #[arg(long = "user")]
    users:   Vec<String>,
  },
  /// Reset the listed users to default preferences.
  Reset {
    #[arg(long = "user", required = true)]
    users: Vec<String>,
  },
  /// Create default preferences for registered users that have none.
  CreateMissing,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(cli.config).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::Report => {
      let report = PreferenceMigrator::new(store)
        .generate_report()
        .await
        .context("failed to generate report")?;
      print_json(&report)
    }
    Command::Migrate(args) => {
      let options = MigrationOptions {
        dry_run:    args.dry_run,
        batch_size: args.batch_size.unwrap_or(server_cfg.migration_batch_size),
      };
      migrate(PreferenceMigrator::new(store), args.target, options).await
    }
  }
}

async fn serve(store: Arc<SqliteStore>, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = newsfeed_api::router(AppState::new(store, &server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn migrate(
  migrator: PreferenceMigrator<SqliteStore>,
  target: MigrateTarget,
  options: MigrationOptions,
) -> anyhow::Result<()> {
  let result = match target {
    MigrateTarget::Perspective { from, to } => {
      migrator.migrate_perspective(from, to, options).await
    }
    MigrateTarget::Tone { from, to } => migrator.migrate_tone(from, to, options).await,
    MigrateTarget::AiModel { from, to } => {
      migrator.migrate_ai_model(from, to, options).await
    }
    MigrateTarget::FactChecking { enabled, users } => {
      let targets = (!users.is_empty()).then_some(users.as_slice());
      migrator.migrate_fact_checking(enabled, options, targets).await
    }
    MigrateTarget::Reset { users } => migrator.reset_to_defaults(&users, options).await,
    MigrateTarget::CreateMissing => migrator.create_missing_preferences(options).await,
  };

  print_json(&result)?;
  if !result.success {
    anyhow::bail!("migration finished with {} error(s)", result.errors.len());
  }
  Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
