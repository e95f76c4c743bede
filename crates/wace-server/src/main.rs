//! wace server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `WACE_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # User administration
//!
//! ```text
//! server --create-user ama --email ama@example.com --staff
//! server --reset-password ama
//! ```
//!
//! Both read the new password from stdin.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wace_api::auth::hash_password;
use wace_core::{account::NewUser, store::CourseStore as _};
use wace_signer::Signer;
use wace_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "WASSCE exam-prep content server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create a user with this username and exit.
  #[arg(long, value_name = "USERNAME", requires = "email")]
  create_user: Option<String>,

  /// Email for `--create-user`.
  #[arg(long)]
  email: Option<String>,

  /// Give the user created with `--create-user` staff rights.
  #[arg(long, requires = "create_user")]
  staff: bool,

  /// Set a new password for this user, revoke their tokens, and exit.
  #[arg(long, value_name = "USERNAME", conflicts_with = "create_user")]
  reset_password: Option<String>,
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

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash(&password)?);
    return Ok(());
  }

  let server_cfg = wace_server::load_config(&cli.config, None)?;
  let content = server_cfg.content.options()?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(username) = cli.create_user {
    let email = cli.email.unwrap_or_default().trim().to_lowercase();
    return create_user(&store, username, email, cli.staff).await;
  }
  if let Some(username) = cli.reset_password {
    return reset_password(&store, &username).await;
  }

  let signer = Signer::from_settings(server_cfg.spaces.clone(), server_cfg.content.signing_failure);
  if signer.is_configured() {
    tracing::info!("video URL signing enabled");
  }

  let app = wace_server::app(Arc::new(store), Arc::new(signer), content);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn create_user(
  store: &SqliteStore,
  username: String,
  email: String,
  is_staff: bool,
) -> anyhow::Result<()> {
  if store.username_taken(&username).await? {
    anyhow::bail!("username {username:?} already exists");
  }
  if store.email_taken(&email).await? {
    anyhow::bail!("email {email:?} already registered");
  }

  let password_hash = hash(&read_password()?)?;
  let user = store
    .add_user(NewUser {
      username,
      email,
      first_name: String::new(),
      last_name: String::new(),
      password_hash,
      is_staff,
    })
    .await
    .context("failed to create user")?;

  tracing::info!(user_id = user.user_id, username = %user.username, is_staff, "user created");
  Ok(())
}

async fn reset_password(store: &SqliteStore, username: &str) -> anyhow::Result<()> {
  let user = store
    .find_user(username)
    .await?
    .with_context(|| format!("no user named {username:?}"))?;

  let password_hash = hash(&read_password()?)?;
  store.set_password_hash(user.user_id, password_hash).await?;
  let revoked = store.revoke_user_tokens(user.user_id).await?;

  tracing::info!(user_id = user.user_id, revoked, "password reset");
  Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
  if password.is_empty() {
    anyhow::bail!("password must not be empty");
  }
  hash_password(password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
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
