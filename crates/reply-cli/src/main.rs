//! Reply CLI - sign in to Reply.sh, manage websites and copy embed snippets.
//!
//! Every command is one or two backend calls; the session credential is kept
//! in the store chosen by configuration between runs.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reply_core::config::CredentialStoreKind;
use reply_core::{ApiClient, Config, SessionStore};

#[derive(Debug, Parser)]
#[command(name = "reply", version, about = "Reply.sh chatbot website manager")]
struct Cli {
    /// Backend base URL (overrides config file and REPLY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where to keep the session credential: keyring, file or memory
    #[arg(long, global = true)]
    store: Option<CredentialStoreKind>,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long, global = true, env = "REPLY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in with email/password, an emailed one-time code, or Google
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show whether a session is stored and where
    Status,
    /// Manage registered websites
    #[command(subcommand)]
    Websites(WebsitesCommand),
    /// Show the resolved configuration
    Config {
        /// Write it to the config file so flags and env values stick
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted for when omitted)
    #[arg(long)]
    pub email: Option<String>,

    /// Sign in with a one-time code sent by email instead of a password
    #[arg(long, conflicts_with = "google")]
    pub otp: bool,

    /// Sign in with Google in the browser
    #[arg(long)]
    pub google: bool,

    /// Paste the redirect URL instead of listening for it locally
    #[arg(long, requires = "google")]
    pub no_listen: bool,
}

#[derive(Debug, Subcommand)]
pub enum WebsitesCommand {
    /// List your websites
    List,
    /// Register a website domain (without http:// or https://)
    Add { domain: String },
    /// Remove a website
    Delete { id: String },
    /// Print the embed snippet for a website
    Snippet { id: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "reply.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_ref());

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(kind) = cli.store {
        config.credential_store = kind;
    }
    info!(api_url = %config.api_url, "reply starting");

    let api = ApiClient::new(&config)?;
    let store = SessionStore::from_config(&config);

    match cli.command {
        Command::Login(args) => commands::login(&config, api, store, &args).await,
        Command::Logout => commands::logout(&store),
        Command::Whoami => commands::whoami(&api, &store).await,
        Command::Status => commands::status(&config, &store),
        Command::Websites(cmd) => commands::websites(api, store, cmd).await,
        Command::Config { save } => commands::show_config(&config, save),
    }
}
