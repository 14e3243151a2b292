use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtanks_stats::{Config, RtanksClient, UpstreamStatus};

#[derive(Parser)]
#[command(name = "rtanks-stats")]
#[command(version)]
#[command(about = "Player statistics from the RTanks ratings site")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    /// Ratings site base URL (overrides config file)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show statistics for one player
    Player { username: String },
    /// Show two players side by side
    Compare { first: String, second: String },
    /// Fetch the current online player count once
    Online,
    /// Poll the online player count and print changes until Ctrl-C
    Watch,
    /// Check whether the ratings site is reachable
    Status,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let log_filter = format!("rtanks_stats={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(base_url) = cli.base_url {
        config.scraper.base_url = base_url;
        config.validate()?;
    }
    if matches!(cli.command, Command::Watch) {
        config.poller.enabled = true;
    }

    let client = RtanksClient::new(&config)?;
    let result = run(&client, cli.command).await;
    client.close().await;
    result
}

async fn run(client: &RtanksClient, command: Command) -> Result<()> {
    match command {
        Command::Player { username } => match client.get_player_data(&username).await? {
            Some(player) => print_json(player.as_ref())?,
            None => eprintln!("Player '{username}' not found"),
        },
        Command::Compare { first, second } => {
            let (a, b) = client.compare_players(&first, &second).await?;
            match (a, b) {
                (Some(a), Some(b)) => print_json(&[a.as_ref(), b.as_ref()])?,
                (None, None) => eprintln!("Neither '{first}' nor '{second}' was found"),
                (None, Some(_)) => eprintln!("Player '{first}' not found"),
                (Some(_), None) => eprintln!("Player '{second}' not found"),
            }
        }
        Command::Online => {
            let count = client.refresh_online_count().await?;
            println!("{count}");
        }
        Command::Watch => {
            let mut updates = client.subscribe_online_count();
            client.start_poller();
            info!("Watching online player count, press Ctrl-C to stop");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *updates.borrow_and_update();
                        print_json(&current)?;
                    }
                }
            }
        }
        Command::Status => {
            let status = client.check_website_status().await;
            print_json(&status)?;
            if let UpstreamStatus::Offline { reason } = status {
                anyhow::bail!("Ratings site is offline: {reason}");
            }
        }
    }
    Ok(())
}
