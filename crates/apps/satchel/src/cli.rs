//! Command-line parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "satchel",
    version,
    about = "Satchel - Google account credential manager",
    arg_required_else_help = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Client secrets JSON (default: ~/.config/satchel/credentials.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub secrets: Option<PathBuf>,

    /// Token file (default: ~/.config/satchel/token.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub token: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Authorize with Google and store the token.
    Login,
    /// Delete the stored token.
    Logout,
    /// Show whether a usable token is stored.
    Status,
}
