//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod chat;
pub mod settings;

use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::auth::AuthManager;
use crate::cli::ask::run_ask;
use crate::cli::chat::run_chat;
use crate::cli::settings::{format_all, run_set, run_unset, SetContext, SettingRegistry};
use crate::core::app::App;
use crate::core::chat_stream::build_http_client;
use crate::core::config::data::{path_display, Config, EnvOverrides};
use crate::core::mode::Mode;
use crate::core::session::StaticSession;
use crate::utils::logging::LoggingState;

#[derive(Parser)]
#[command(name = "datachat")]
#[command(about = "Ask questions about your data from the terminal")]
#[command(
    long_about = "Datachat streams answers from the chat-with-data analyze service. \
Questions run in one of two modes: 'general' needs no credentials, 'database' \
queries your data and needs a bearer token.\n\n\
Authentication:\n\
  Use 'datachat auth' to store a token in your system keyring.\n\
  --token or DATACHAT_TOKEN take precedence over the stored token.\n\n\
Environment Variables:\n\
  DATACHAT_API_URL      API base URL\n\
  DATACHAT_BACKEND_URL  Backend base URL, used when no API URL is set\n\
  DATACHAT_TOKEN        Bearer token for database mode\n\
  RUST_LOG              Diagnostic log filter (written to stderr)\n\n\
Chat commands:\n\
  /mode <general|database>  Switch mode\n\
  /attach <path>            Attach a file to the next question\n\
  /detach                   Drop the pending attachment\n\
  /log <filename>           Enable logging to specified file\n\
  /log                      Toggle logging pause/resume\n\
  Ctrl+C                    Cancel the answer being streamed"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(clap::Args, Clone, Default)]
pub struct GlobalArgs {
    /// Mode for this run, overriding the configured default
    #[arg(short = 'm', long, global = true, value_enum)]
    pub mode: Option<Mode>,

    /// API base URL, overriding configuration and environment
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token for database mode
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Increase diagnostic output on stderr (repeatable)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and stream the answer to stdout
    Ask {
        /// File to analyze alongside the question
        #[arg(short = 'f', long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// The question (may be empty when a file is given)
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Start an interactive conversation (default)
    Chat,
    /// Store a bearer token in the system keyring
    Auth,
    /// Remove the stored bearer token
    Deauth {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Set configuration values, or list them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.global.verbose);

    let runtime = tokio::runtime::Runtime::new()?;
    run_then_shutdown(runtime, async_main(args))
}

/// Blocking stdin reads cannot be cancelled, so leaving the chat prompt must
/// not wait on them when the runtime goes away.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn run_then_shutdown<F: Future>(runtime: Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    output
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let Args { command, global } = args;

    match command.unwrap_or(Commands::Chat) {
        Commands::Ask { file, question } => {
            let (app, session) = bootstrap(&global)?;
            run_ask(app, session, question.join(" "), file).await
        }
        Commands::Chat => {
            let (app, session) = bootstrap(&global)?;
            run_chat(app, session).await
        }
        Commands::Auth => {
            if let Err(e) = AuthManager::new().interactive_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth { yes } => {
            if let Err(e) = AuthManager::new().interactive_deauth(yes) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let registry = SettingRegistry::new();
            let ctx = SetContext::from_default_path()?;
            let Some(key) = key else {
                let config = Config::load_from_path(&ctx.config_path)?;
                println!("Configuration ({}):", path_display(&ctx.config_path));
                println!("{}", format_all(&registry, &config));
                return Ok(());
            };
            match run_set(&registry, &key, &value, &ctx) {
                Ok(message) => println!("{message}"),
                Err(err) => {
                    err.print();
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let registry = SettingRegistry::new();
            let ctx = SetContext::from_default_path()?;
            match run_unset(&registry, &key, &ctx) {
                Ok(message) => println!("{message}"),
                Err(err) => {
                    err.print();
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

/// Resolve configuration, credentials and transcript logging into a ready [`App`].
fn bootstrap(global: &GlobalArgs) -> Result<(App, StaticSession), Box<dyn Error>> {
    let config = Config::load()?;
    let env = EnvOverrides::from_env();

    let mut settings = config.resolve(&env, global.api_url.as_deref());
    if let Some(mode) = global.mode {
        settings.default_mode = mode;
    }
    debug!(api_base = %settings.api_base, mode = %settings.default_mode, "Resolved client settings");

    let client = build_http_client(settings.connect_timeout)?;
    let credential = AuthManager::new()
        .resolve_credential(global.token.as_deref(), env.token.as_deref())
        .map(|(credential, source)| {
            debug!(source = source.describe(), "Loaded bearer token");
            credential
        });
    let session = StaticSession::new(credential);
    let logging = LoggingState::new(global.log.clone())?;

    Ok((App::new(&settings, client, logging), session))
}

#[cfg(test)]
mod tests;
