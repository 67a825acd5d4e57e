use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "skype-chat-updates",
    about = "Decode and dispatch Skype chat-update events"
)]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Decode newline-delimited messages and dispatch them to the built-in handlers
    Dispatch {
        /// Read messages from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Decode newline-delimited messages and print them as JSON
    Decode {
        /// Read messages from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Dispatch { input: None })
    }
}
