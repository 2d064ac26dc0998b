mod api;
mod config;
mod console;
mod coordinator;
mod history;
mod model;
mod panels;
mod shell;
mod view_state;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use api::types::{DEFAULT_SLACK_TEST_MESSAGE, HistoryQuery};
use api::{ApiError, ContentService, HttpServiceClient, InsightsService};
use config::{ConfigError, DashboardConfig};
use console::{Console, ConsoleError};
use coordinator::{GenerationCoordinator, SubmitError};
use history::HistoryStore;
use model::{GenerationRequest, Platform};
use panels::{AbTestingPanel, MetricsPanel, SentimentPanel};
use shell::DashboardShell;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "trendforge", about = "TrendForgeAI operator dashboard")]
struct Cli {
    #[arg(long, env = "TRENDFORGE_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the service is up.
    Ping,
    /// Generate one post and print the result.
    Generate {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        platform: Platform,
        #[arg(long)]
        product_info: String,
        #[arg(long, default_value_t = 1)]
        num_variations: u32,
    },
    /// List past generations.
    History {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Print one insight panel.
    Panel {
        #[arg(value_enum)]
        which: PanelKind,
    },
    /// Send the performance report to Slack.
    SlackReport,
    /// Send a Slack test notification.
    SlackTest {
        #[arg(long, default_value = DEFAULT_SLACK_TEST_MESSAGE)]
        message: String,
    },
    /// Interactive session.
    Dashboard,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PanelKind {
    Sentiment,
    Metrics,
    Ab,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    let client = Arc::new(HttpServiceClient::new(&config)?);
    tracing::debug!(base_url = client.base_url(), "service client ready");

    match cli.command {
        Command::Ping => run_ping(&client).await,
        Command::Generate { topic, platform, product_info, num_variations } => {
            let request = GenerationRequest::new(topic, platform, product_info).with_num_variations(num_variations);
            run_generate(client, request).await
        }
        Command::History { page, page_size, platform } => {
            let query = HistoryQuery { page, page_size, platform };
            print_json(&client.history(&query).await?)
        }
        Command::Panel { which } => run_panel(client, which).await,
        Command::SlackReport => print_json(&MetricsPanel::new(client).send_report().await?),
        Command::SlackTest { message } => print_json(&MetricsPanel::new(client).send_test(Some(&message)).await?),
        Command::Dashboard => {
            let shell = DashboardShell::open(client.clone(), client);
            Console::new(shell).run().await?;
            Ok(())
        }
    }
}

async fn run_ping(client: &HttpServiceClient) -> Result<(), CliError> {
    let health = client.health().await?;
    println!("{}", health.status);
    Ok(())
}

async fn run_generate(client: Arc<HttpServiceClient>, request: GenerationRequest) -> Result<(), CliError> {
    let history = HistoryStore::new(client.clone());
    let coordinator = GenerationCoordinator::new(client, history);
    let result = coordinator.submit(request).await?;
    print_json(&result)?;

    coordinator.await_refresh().await;
    let snapshot = coordinator.history().snapshot();
    match &snapshot.error {
        Some(err) => eprintln!("notice: {err}"),
        None => eprintln!("history: {} entries", snapshot.entries.len()),
    }
    Ok(())
}

async fn run_panel(client: Arc<HttpServiceClient>, which: PanelKind) -> Result<(), CliError> {
    match which {
        PanelKind::Sentiment => print_json(&SentimentPanel::new(client).load().await?),
        PanelKind::Metrics => print_json(&MetricsPanel::new(client).load().await?),
        PanelKind::Ab => print_json(&AbTestingPanel::new(client).load().await?),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
