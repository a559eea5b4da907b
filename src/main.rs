mod browser;
mod db;
mod extract;
mod infer;
mod intercept;
mod normalize;
mod sources;

use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "jobharvest", about = "Job listing scraper: python.org + simplify.jobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Scrape all sources and persist new listings
    Run {
        /// Only run the named source (python.org | simplify)
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Show store statistics
    Stats,
    /// Show the most recently scraped jobs
    Recent {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Filter by source site (e.g. "Python.org")
        #[arg(long)]
        site: Option<String>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            println!("Schema ready.");
            Ok(())
        }
        Commands::Run { source } => {
            // the store is the one fatal precondition: no connection, no run
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            info!("job scraper starting run");
            let stealth = browser::StealthBrowser::launch()?;
            let total = sources::run_all(stealth.tab(), &conn, source.as_deref());
            info!("run complete, {} new jobs inserted in total", total);
            println!("Inserted {} new jobs.", total);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            println!("Total jobs: {}", stats.total);
            println!("With wage:  {}", stats.with_wage);
            println!("Remote:     {}", stats.remote);
            for (site, count) in &stats.by_site {
                println!("  {:<14} {}", site, count);
            }
            Ok(())
        }
        Commands::Recent { limit, site, json } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_recent(&conn, site.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No jobs stored yet. Run 'run' first.");
                return Ok(());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:<20} | {:<10} | {:<8} | {:<20}",
                "#", "Title", "Company", "Where", "Level", "Location"
            );
            println!("{}", "-".repeat(108));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<32} | {:<20} | {:<10} | {:<8} | {:<20}",
                    i + 1,
                    truncate(&r.title, 32),
                    truncate(&r.company_name, 20),
                    truncate(&r.location_requirement, 10),
                    truncate(r.experience_level.as_deref().unwrap_or("-"), 8),
                    truncate(&r.location, 20),
                );
            }
            println!("\n{} jobs | dedup key: source_url", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
