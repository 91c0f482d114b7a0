//! profiles-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `PROFILES_*` environment variables, opens the SQLite store, and serves the
//! REST API over HTTP.
//!
//! # Creating an administrator
//!
//! ```sh
//! cargo run -p profiles-api --bin profiles-server -- create-superuser \
//!   --email admin@example.com --name Admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use profiles_api::ServerConfig;
use profiles_core::manager;
use profiles_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Profiles REST API server")]
struct Cli {
  /// TOML settings file; missing is fine.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the REST API (the default).
  Serve,
  /// Create a staff + superuser account. The password is read from stdin.
  CreateSuperuser {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name:  String,
  },
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

  let server_cfg = load_config(cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("cannot open profiles database {}", store_path.display()))?;
  tracing::debug!(path = %store_path.display(), "store opened");

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::CreateSuperuser { email, name } => {
      let password = read_password()?;
      let account =
        manager::create_privileged_account(&store, &email, &name, &password)
          .await
          .context("failed to create superuser")?;
      println!("Created superuser {account} ({})", account.account_id);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = profiles_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("cannot listen on {address}"))?;
  tracing::info!(%address, "profiles API listening");

  axum::serve(listener, app).await.context("HTTP server stopped")
}

/// Layer `PROFILES_*` environment variables over the optional TOML file.
fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("PROFILES"))
    .build()
    .context("invalid configuration sources")?
    .try_deserialize()
    .context("invalid server configuration")
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "a superuser must have a password");
  Ok(password)
}

/// `~/…` store paths resolve against `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
