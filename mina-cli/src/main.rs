use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use gateway_client::{Credentials, TokenFileAccount};
use mina_sdk::logging::{self, LoggingMode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod commands;

use commands::Session;

/// Control Mina cloud smart speakers
///
/// Credentials and the target device come from the environment. Every run
/// prints exactly one result (or one error) on standard output.
#[derive(Parser, Debug)]
#[command(name = "micli")]
#[command(about = "Control Mina cloud smart speakers from the command line")]
#[command(version)]
pub struct Args {
    /// Account user name
    #[arg(long, env = "MI_USER", hide_env_values = true)]
    pub user: Option<String>,

    /// Account password
    #[arg(long, env = "MI_PASS", hide_env_values = true)]
    pub pass: Option<String>,

    /// Target device: device id, miot id, name or alias
    #[arg(long, env = "MI_DID")]
    pub did: Option<String>,

    /// Session token file (default: ~/.mi.token)
    #[arg(long, env = "MI_TOKEN")]
    pub token: Option<PathBuf>,

    /// Extra hardware models that take the music payload, comma separated
    #[arg(long, env = "MI_MUSIC_API_HARDWARE", value_delimiter = ',')]
    pub music_api_hardware: Vec<String>,

    /// Increase log verbosity (-v development, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List devices, or speak TEXT on every device
    Mina {
        text: Vec<String>,
    },
    /// Speak TEXT on the targeted devices
    Say {
        #[arg(required = true)]
        text: Vec<String>,
        /// `all` or a 1-based position in the device listing
        #[arg(long, default_value = "all")]
        target: String,
        /// Set this volume before speaking
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,
    },
    /// Set the device volume
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
    /// Show the player state
    Status,
    /// Show recent voice interactions
    Ask,
    /// Play URL, or resume playback when no URL is given
    Play {
        url: Option<String>,
    },
    Pause,
    Stop,
    /// Play URL on repeat
    Loop {
        url: String,
    },
    /// Play every URL listed in FILE
    #[command(name = "play_list")]
    PlayList {
        file: PathBuf,
        #[arg(long)]
        shuffle: bool,
    },
    /// Play the playlist a remote catalog URL answers with
    #[command(name = "play_remote")]
    PlayRemote {
        url: String,
        #[arg(long)]
        shuffle: bool,
    },
}

impl Command {
    /// Whether the command addresses the single device named by MI_DID
    pub fn needs_device(&self) -> bool {
        !matches!(self, Command::Mina { .. } | Command::Say { .. })
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub device: Option<String>,
    pub token_path: Option<PathBuf>,
    pub music_api_hardware: Vec<String>,
    pub logging: Option<LoggingMode>,
    pub command: Command,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            credentials: Credentials::new(args.user.unwrap_or_default(), args.pass.unwrap_or_default()),
            device: args.did.filter(|did| !did.trim().is_empty()),
            token_path: args.token.or_else(TokenFileAccount::default_token_path),
            music_api_hardware: args.music_api_hardware,
            // no -v leaves the choice to MI_LOG_MODE
            logging: (args.verbose > 0).then(|| LoggingMode::from_verbosity(args.verbose)),
            command: args.command,
        }
    }
}

impl Config {
    /// Check everything that can be checked before opening a network session
    pub fn validate(&self) -> Result<()> {
        self.credentials
            .validate()
            .map_err(|e| anyhow!("{}; set MI_USER and MI_PASS", e))?;

        if self.token_path.is_none() {
            return Err(anyhow!("no home directory; set MI_TOKEN to the session token file"));
        }

        if self.command.needs_device() && self.device.is_none() {
            return Err(anyhow!("MI_DID is not set; run `micli mina` to list devices"));
        }

        if let Command::Say { target, .. } = &self.command {
            target.parse::<mina_sdk::BroadcastTarget>()?;
        }

        Ok(())
    }

    pub fn device(&self) -> Result<&str> {
        self.device
            .as_deref()
            .ok_or_else(|| anyhow!("MI_DID is not set"))
    }
}

fn init_logging(mode: Option<LoggingMode>) -> Result<()> {
    match mode {
        Some(mode) => logging::init_logging(mode)?,
        None => logging::init_logging_from_env()?,
    }
    Ok(())
}

async fn run(config: Config, cancel: CancellationToken) -> Result<String> {
    config.validate()?;
    init_logging(config.logging)?;
    debug!(command = ?config.command, device = ?config.device, "starting");

    // one HTTP session per invocation, dropped on every exit path
    let session = Session::open(&config, cancel)?;
    session.execute(&config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from(Args::parse());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    match run(config, cancel).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
