use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "localavatars")]
#[command(author, version, about = "Locally hosted user avatars")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Create a user account and print its API token
    AddUser {
        #[arg(long)]
        login: String,

        #[arg(long)]
        email: String,

        /// Defaults to the login
        #[arg(long)]
        display_name: Option<String>,

        /// subscriber, author, editor, or administrator
        #[arg(long, default_value = "subscriber")]
        role: String,
    },

    /// Remove every local avatar, its files, and all ratings
    Sweep {
        /// Required to actually delete anything
        #[arg(long)]
        yes: bool,
    },

    /// Display version information
    Version,
}
