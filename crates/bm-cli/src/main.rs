use std::path::Path;

use anyhow::{Context, Result};
use bm_client::Repository;
use bm_core::{Diaper, Feed};
use chrono::{Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bm_cli::commands::{self, auth, diaper, feed, status, today};
use bm_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Signup {
            email,
            password,
            confirm,
        } => {
            let client = commands::auth_client(&config)?;
            let sessions = commands::session_store(&config);
            auth::sign_up(&mut stdout, &client, &sessions, email, password, confirm, Utc::now())
                .await?;
        }
        Commands::Login { email, password } => {
            let client = commands::auth_client(&config)?;
            let sessions = commands::session_store(&config);
            auth::log_in(&mut stdout, &client, &sessions, email, password, Utc::now()).await?;
        }
        Commands::Logout => {
            auth::log_out(&mut stdout, &commands::session_store(&config))?;
        }
        Commands::Status => {
            status::run(&mut stdout, &commands::session_store(&config), Utc::now())?;
        }
        Commands::Today { json } => {
            let store = commands::open_store(&config)?;
            let session = commands::require_session(&config, Utc::now()).await?;
            let feeds = Repository::<_, Feed>::new(&store, &session);
            let diapers = Repository::<_, Diaper>::new(&store, &session);
            today::run(
                &mut stdout,
                &feeds,
                &diapers,
                *json,
                &Local::now(),
                &today::local_zone_name(),
            )
            .await?;
        }
        Commands::Feed(action) => {
            let store = commands::open_store(&config)?;
            let session = commands::require_session(&config, Utc::now()).await?;
            let repo = Repository::new(&store, &session);
            feed::run(&mut stdout, &repo, action, config.window_days, &Local::now()).await?;
        }
        Commands::Diaper(action) => {
            let store = commands::open_store(&config)?;
            let session = commands::require_session(&config, Utc::now()).await?;
            let repo = Repository::new(&store, &session);
            diaper::run(&mut stdout, &repo, action, config.window_days, &Local::now()).await?;
        }
    }

    Ok(())
}
