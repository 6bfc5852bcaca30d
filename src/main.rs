// TaraRide driver dashboard - command line
// Runs one fetch-then-aggregate cycle and prints the result

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tararide_dashboard::api::fetcher::{FirestoreFetcher, MemoryFetcher, RecordFetcher};
use tararide_dashboard::api::firebase::FirebaseClient;
use tararide_dashboard::dashboard::controller::DashboardController;
use tararide_dashboard::dashboard::presenter::{render_overview, render_reviews, DashboardView};
use tararide_dashboard::dashboard::session::resolve_session;
use tararide_dashboard::models::RideStatus;
use tararide_dashboard::utils::config::Config;
use tararide_dashboard::utils::month::MonthWindow;

#[derive(Debug, Parser)]
#[command(name = "tararide-dashboard", about = "Driver performance dashboard")]
struct Cli {
    /// Signed-in driver uid
    #[arg(long, global = true)]
    driver: Option<String>,

    /// Account email, used as the greeting fallback
    #[arg(long, global = true)]
    email: Option<String>,

    /// Read records from a JSON export instead of Firestore
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monthly performance summary
    Summary {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// 1-12, defaults to the current month
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Rides filtered by status, with totals and chart data
    Rides {
        #[arg(long, default_value = "completed")]
        status: RideStatus,
    },
    /// A random sample of well-rated reviews of the driver's rides
    Reviews {
        #[arg(long, default_value_t = 4)]
        min_rating: u8,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "tararide_dashboard=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match &cli.snapshot {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            let fetcher = MemoryFetcher::from_json(&raw)?;
            info!("Loaded snapshot from {}", path.display());
            run(Arc::new(fetcher), &cli, &config).await
        }
        None => {
            let http_client = reqwest::Client::builder()
                .user_agent("TaraRide-Dashboard/1.0")
                .build()
                .context("building HTTP client")?;
            let firebase = FirebaseClient::from_file(http_client, &config.firebase_key_path)
                .context("loading Firebase credentials")?;
            info!("Firebase client initialized for {}", firebase.project_id());
            run(Arc::new(FirestoreFetcher::new(Arc::new(firebase))), &cli, &config).await
        }
    }
}

async fn run<F: RecordFetcher>(fetcher: Arc<F>, cli: &Cli, config: &Config) -> Result<()> {
    let session = resolve_session(fetcher.as_ref(), cli.driver.as_deref(), cli.email.as_deref())
        .await
        .context("resolving driver session")?;
    let controller = DashboardController::new(fetcher, session);

    match &cli.command {
        Command::Summary { year, month } => {
            let current = MonthWindow::current(config.utc_offset);
            let window = MonthWindow::new(
                year.unwrap_or(current.year),
                month.map(|m| m - 1).unwrap_or(current.month),
                config.utc_offset,
            );

            // A single-shot run is never superseded
            let summary = controller.refresh(window).await.unwrap_or_default();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", DashboardView::from_summary(&summary, &window, config).render_text());
            }
        }
        Command::Rides { status } => {
            let overview = controller.status_overview(*status).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print!("{}", render_overview(&overview, *status, config));
            }
        }
        Command::Reviews { min_rating, limit } => {
            let reviews = controller
                .featured_reviews(*min_rating, *limit, &mut rand::rng())
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reviews)?);
            } else {
                print!("{}", render_reviews(&reviews, config));
            }
        }
    }

    Ok(())
}
