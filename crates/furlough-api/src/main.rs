//! Furlough server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), overlays
//! `FURLOUGH_*` environment variables, opens the SQLite store, creates the
//! bootstrap administrator if configured, and serves the JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use furlough_api::{AppState, ServerConfig, auth::JwtKeys};
use furlough_core::credentials::Argon2Hasher;
use furlough_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Furlough leave-request server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FURLOUGH"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(
    Arc::new(store),
    Arc::new(Argon2Hasher::default()),
    JwtKeys::new(&server_cfg.jwt_secret, server_cfg.token_ttl_secs),
    &server_cfg.directory(),
  );

  if let Some(admin) = server_cfg.bootstrap_admin() {
    match state
      .directory
      .bootstrap_admin(admin)
      .await
      .context("failed to create bootstrap admin")?
    {
      Some(account) => {
        tracing::info!(account_id = %account.account_id, "created bootstrap admin")
      }
      None => tracing::debug!("bootstrap admin already present"),
    }
  }

  let app = furlough_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

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
