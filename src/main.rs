use clap::{Parser, Subcommand};
use stay_scout::browser::ChromePage;
use stay_scout::flows;
use stay_scout::pages::{Guests, SearchParams};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stay-scout", about = "Search-and-reserve checks against a live rental site")]
struct Cli {
    /// JSON file with search parameters; defaults apply for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(long, default_value = "search_report.json")]
    report: PathBuf,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search and list the highest-rated and cheapest results
    Rank,
    /// Search, open the best listing and go through reservation
    Reserve {
        /// Number of children to book for, replacing the configured value
        #[arg(long)]
        children: Option<u32>,
    },
}

/// Guests to reserve for: the configured party, with `--children` taking precedence
fn reservation_guests(configured: Guests, children: Option<u32>) -> Guests {
    match children {
        Some(children) => configured.with_children(children),
        None => configured,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let params = match &cli.config {
        Some(path) => SearchParams::from_file(path)?,
        None => SearchParams::default(),
    };

    info!("🏠 Stay Scout");
    info!("Searching {} from {} to {}", params.location, params.checkin, params.checkout);

    let page = ChromePage::launch(!cli.headed, params.action_timeout())?;

    let json = match cli.command {
        Command::Rank => {
            let report = flows::rank_listings(&page, &params)?;
            info!(
                "✅ {} cards, {} highest rated, {} cheapest ({:?})",
                report.aggregation.all_cards.len(),
                report.aggregation.ranking.highest_rated.len(),
                report.aggregation.ranking.cheapest.len(),
                report.aggregation.outcome
            );
            serde_json::to_string_pretty(&report)?
        }
        Command::Reserve { children } => {
            let guests = reservation_guests(params.guests, children);
            let params = params.with_guests(guests);
            let report = flows::reserve_best(&page, &params)?;
            info!(
                "✅ Reservation step done for {} ({:?})",
                report.selected.url.as_deref().unwrap_or("-"),
                report.outcome
            );
            serde_json::to_string_pretty(&report)?
        }
    };

    tokio::fs::write(&cli.report, json).await?;
    info!("💾 Saved report to {}", cli.report.display());

    Ok(())
}
