use advert_subscribers::config;
use advert_subscribers::db::{self, SqliteStore};
use advert_subscribers::{SqlSubscriberRepository, Subscriber, SubscriberRepository, Subscription};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a subscriber and print its generated id
    Register {
        #[arg(long)]
        telegram_id: String,
    },
    /// Subscribe an existing subscriber to an advert
    Subscribe {
        #[arg(long)]
        subscriber_id: String,
        #[arg(long)]
        advert_id: String,
    },
    /// List the subscribers of an advert
    Subscribers {
        #[arg(long)]
        advert_id: String,
        /// Print JSON instead of one line per subscriber
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let pool = db::init_pool(&cfg.database).await?;
    let repo = SqlSubscriberRepository::new(SqliteStore::new(pool))
        .with_tables(cfg.database.tables.clone());

    match args.command {
        Command::Register { telegram_id } => {
            anyhow::ensure!(!telegram_id.trim().is_empty(), "telegram id must be non-empty");
            let sub = repo.insert_subscriber(Subscriber::new(telegram_id)).await?;
            info!(id = %sub.id, "registered subscriber");
            println!("{}", sub.id);
        }
        Command::Subscribe {
            subscriber_id,
            advert_id,
        } => {
            repo.insert_subscription(&Subscription::new(subscriber_id, advert_id))
                .await?;
        }
        Command::Subscribers { advert_id, json } => {
            let subs = repo.get_advert_subscribers(&advert_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&subs)?);
            } else {
                for s in &subs {
                    println!("{}\t{}", s.id, s.telegram_id);
                }
            }
        }
    }

    Ok(())
}
