use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use ticketsmith_cli::app;
use ticketsmith_core::{Settings, TicketCategory};

#[derive(Parser)]
#[command(name = "ticketsmith")]
#[command(about = "Ticketsmith - turn a short request into a feature or bug ticket")]
#[command(version)]
struct Cli {
    /// Draft a single ticket for this request and exit
    request: Option<String>,

    /// Ticket category (feature, bug)
    #[arg(short, long, default_value = "feature")]
    category: TicketCategory,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Path to a config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Let the model open the conversation first
    #[arg(long)]
    greet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(ref model) = cli.model {
        settings.model.name = model.clone();
    }
    tracing::debug!(model = %settings.model.name, "settings loaded");

    let controller = settings.build_controller()?;

    match cli.request {
        Some(request) => app::run_single_request(controller, cli.category, &request, cli.greet).await,
        None => app::run_interactive(controller, cli.category, cli.greet).await,
    }
}
