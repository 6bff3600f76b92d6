//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::render::OutputFormat;

/// freetime - find the slots where everyone is free
#[derive(Debug, Parser)]
#[command(name = "freetime")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "FREETIME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the credential record
    #[arg(long, global = true, env = "FREETIME_CREDENTIAL")]
    pub credential: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the intervals in which every attendee is free
    Free {
        /// Comma-separated attendees; bare names get the default domain
        #[arg(long, short, required = true)]
        attendees: Vec<String>,

        /// Whose calendar issues the availability request
        #[arg(long, short)]
        organizer: Option<String>,

        /// Window start, YYYY/MM/DD HH:MM (default: today 00:00)
        #[arg(long, short)]
        start: Option<String>,

        /// Window end, YYYY/MM/DD HH:MM (default: tomorrow 00:00)
        #[arg(long, short)]
        end: Option<String>,

        /// Slot length in minutes (must divide 60)
        #[arg(long)]
        slot: Option<u32>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Show a user's profile
    Me {
        /// User to look up
        #[arg(long, short, default_value = "me")]
        address: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List people related to the signed-in user
    People {
        /// Only keep principal names ending with this suffix
        #[arg(long, short)]
        domain: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List a user's events
    Events {
        /// User whose calendar to read
        #[arg(long, short, default_value = "me")]
        address: String,

        /// Window start, YYYY/MM/DD HH:MM (default: today 00:00)
        #[arg(long, short)]
        start: Option<String>,

        /// Window end, YYYY/MM/DD HH:MM (default: tomorrow 00:00)
        #[arg(long, short)]
        end: Option<String>,

        /// Show every column
        #[arg(long, short = 'D')]
        detail: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Write a fresh credential record
    Init {
        /// Access token
        #[arg(long, env = "FREETIME_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Refresh token, needed to renew the access token
        #[arg(long, env = "FREETIME_REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: Option<String>,

        /// OAuth client ID
        #[arg(long, env = "FREETIME_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret
        #[arg(long, env = "FREETIME_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        /// Overwrite an existing record
        #[arg(long)]
        force: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration and credential paths
    Path,
}
