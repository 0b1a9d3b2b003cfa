//! CLI administration tool for quicklink.
//!
//! Inspects and maintains the mapping store without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Store totals
//! cargo run --bin admin -- stats
//!
//! # Show one mapping, including expired ones
//! cargo run --bin admin -- show abc123
//!
//! # Delete expired mappings
//! cargo run --bin admin -- purge
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string

use quicklink::application::services::StatsService;
use quicklink::config::mask_connection_string;
use quicklink::domain::repositories::MappingRepository;
use quicklink::infrastructure::persistence::PgMappingRepository;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing quicklink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mapping and click totals
    Stats,
    /// Show a single mapping
    Show {
        /// Short code to look up
        code: String,
    },
    /// Delete all expired mappings
    Purge {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let repo: Arc<dyn MappingRepository> =
        Arc::new(PgMappingRepository::new(Arc::new(pool.clone())));

    match cli.command {
        Commands::Stats => handle_stats(repo).await?,
        Commands::Show { code } => show_mapping(repo, &code).await?,
        Commands::Purge { yes } => purge_expired(repo, yes).await?,
        Commands::Db { action } => handle_db_action(action, &pool, &database_url).await?,
    }

    Ok(())
}

/// Prints store-wide totals.
async fn handle_stats(repo: Arc<dyn MappingRepository>) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let summary = StatsService::new(repo)
        .summary()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    println!(
        "  Mappings:      {}",
        summary.mappings.to_string().bright_green().bold()
    );
    println!(
        "  Expired:       {}",
        summary.expired.to_string().yellow().bold()
    );
    println!(
        "  Clicks:        {}",
        summary.clicks.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Prints one mapping as stored.
///
/// Reads the repository directly, so expired mappings are shown (and left in place)
/// instead of being reported as gone.
async fn show_mapping(repo: Arc<dyn MappingRepository>, code: &str) -> Result<()> {
    let mapping = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load mapping: {}", e))?;

    let Some(mapping) = mapping else {
        println!("{} {}", "❌ No mapping for code".red(), code.bright_white());
        return Ok(());
    };

    let status = if mapping.is_expired() {
        "EXPIRED".red()
    } else {
        "LIVE".green()
    };

    println!("{}", "🔗 Mapping".bright_blue().bold());
    println!();
    println!("  Code:       {}", mapping.short_code.cyan());
    println!("  URL:        {}", mapping.original_url.bright_white());
    println!("  Status:     {}", status);
    println!(
        "  Clicks:     {}",
        mapping.clicks.to_string().bright_green().bold()
    );
    println!(
        "  Created:    {}",
        mapping.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match mapping.expires_at {
        Some(expires_at) => println!(
            "  Expires:    {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("  Expires:    {}", "never".bright_black()),
    }
    if let Some(ip) = &mapping.created_ip {
        println!("  Created by: {}", ip.bright_black());
    }
    if let Some(user_agent) = &mapping.user_agent {
        println!("  User agent: {}", user_agent.bright_black());
    }
    println!();

    Ok(())
}

/// Deletes expired mappings after confirmation.
async fn purge_expired(repo: Arc<dyn MappingRepository>, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge Expired Mappings".bright_blue().bold());
    println!();

    let now = Utc::now();
    let stats_service = StatsService::new(repo);

    let summary = stats_service
        .summary()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    if summary.expired == 0 {
        println!("{}", "  Nothing to purge".green());
        return Ok(());
    }

    println!(
        "  {} expired mapping(s) will be deleted",
        summary.expired.to_string().yellow().bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete them?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = stats_service
        .purge_expired(now)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge mappings: {}", e))?;

    println!(
        "{} {}",
        "✅ Deleted".green().bold(),
        format!("{removed} mapping(s)").bright_white()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, database_url: &str) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());
            sqlx::query("SELECT 1").fetch_one(pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let table_size: String = sqlx::query_scalar(
                "SELECT pg_size_pretty(pg_total_relation_size('mappings'))",
            )
            .fetch_one(pool)
            .await
            .context("Table 'mappings' not found; has the server run its migrations?")?;

            println!(
                "  Connection: {}",
                mask_connection_string(database_url).bright_white()
            );
            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Table size: {}", table_size.bright_white());
            println!();
        }
    }

    Ok(())
}
