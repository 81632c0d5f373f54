use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credential_authority::timing::measure_login_latency;
use credential_authority::{AuthConfig, CredentialAuthority};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// In-process credential authority driver.
#[derive(Parser, Debug)]
#[command(name = "credential-authority", version, about)]
struct Cli {
    /// TOML file with authority settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a user, then log in with the right password, a wrong one,
    /// and an unknown username
    Demo {
        #[arg(long, default_value = "alice")]
        username: String,
        #[arg(long, default_value = "correcthorse")]
        password: String,
    },
    /// Compare login latency for unknown users and wrong passwords
    Timing {
        #[arg(long, default_value_t = 50)]
        trials: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => AuthConfig::load(path)?,
        None => AuthConfig::default(),
    };
    let authority = CredentialAuthority::with_config(config)?;

    match cli.command {
        Commands::Demo { username, password } => run_demo(&authority, &username, &password),
        Commands::Timing { trials } => run_timing(&authority, trials),
    }
}

fn run_demo(authority: &CredentialAuthority, username: &str, password: &str) -> Result<()> {
    authority
        .register_user(username, password.as_bytes())
        .with_context(|| format!("Failed to register '{username}'"))?;
    println!("registered {username}");

    match authority.login(username, password.as_bytes()) {
        Ok(session) => println!(
            "login {username}: session for {} expires {} ({}s after issue)",
            session.username,
            session.expires_at,
            (session.expires_at - session.created_at).num_seconds()
        ),
        Err(e) => println!("login {username}: {e}"),
    }

    let wrong = format!("{password}-wrong");
    match authority.login(username, wrong.as_bytes()) {
        Ok(_) => println!("login {username} with wrong password: unexpectedly succeeded"),
        Err(e) => println!("login {username} with wrong password: {e}"),
    }

    let stranger = format!("{username}-unregistered");
    match authority.login(&stranger, password.as_bytes()) {
        Ok(_) => println!("login {stranger}: unexpectedly succeeded"),
        Err(e) => println!("login {stranger}: {e}"),
    }

    Ok(())
}

fn run_timing(authority: &CredentialAuthority, trials: usize) -> Result<()> {
    let username = "timing-user";
    authority
        .register_user(username, b"timing-user-password")
        .context("Failed to register timing user")?;

    let report = measure_login_latency(authority, username, trials)
        .context("Trial count must be at least 1")?;
    println!("{report}");
    Ok(())
}
