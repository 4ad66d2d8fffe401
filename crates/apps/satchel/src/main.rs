//! Satchel - Google account credential manager
//!
//! Runs the OAuth flow once so the Drive, Docs, Gmail and Calendar clients
//! can reuse the stored token.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use google::{AuthConfig, AuthManager, Credential};
use log::{error, info};
use std::process::ExitCode;

mod cli;

use cli::{Args, Command};

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let mut auth_config =
        AuthConfig::from_default_paths().context("Failed to resolve default config paths")?;
    if let Some(secrets) = args.secrets {
        auth_config.client_secrets_path = secrets;
    }
    if let Some(token) = args.token {
        auth_config.token_path = token;
    }
    let manager = AuthManager::new(auth_config);

    match args.command {
        Command::Login => {
            let credential = manager.authenticate().context("Login failed")?;
            info!("Logged in; token stored at {}", manager.store().path().display());
            print_status(&credential);
        }
        Command::Logout => {
            manager.revoke().context("Logout failed")?;
            println!("Logged out");
        }
        Command::Status => match manager.store().load().context("Failed to read token")? {
            Some(credential) if manager.is_authenticated() => print_status(&credential),
            Some(_) => println!("Stored token cannot be used; run `satchel login`"),
            None => println!("Not logged in"),
        },
    }

    Ok(())
}

fn print_status(credential: &Credential) {
    let expiry = match credential.expiry {
        Some(expiry) if expiry > Utc::now() => {
            format!("expires in {} min", (expiry - Utc::now()).num_minutes())
        }
        Some(_) => "expired, will refresh on next use".to_string(),
        None => "no expiry recorded".to_string(),
    };
    println!("Logged in ({expiry})");
    println!("Scopes:");
    for scope in &credential.scopes {
        println!("  {scope}");
    }
}
