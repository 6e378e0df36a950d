pub mod init;
pub mod password;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediadesk")]
#[command(version)]
#[command(about = "Admin control plane for a folder-scoped media store", long_about = None)]
pub struct Cli {
    #[arg(short, long, env = "MEDIADESK_CONFIG", default_value = "mediadesk.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config file
    Init {
        #[arg(default_value = "mediadesk.toml")]
        path: PathBuf,
    },
    /// Run the HTTP server
    Serve {
        /// Overrides `server.host`
        #[arg(short = 'H', long)]
        host: Option<String>,
        /// Overrides `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print an argon2 hash for `auth.password_hash`
    HashPassword,
}
