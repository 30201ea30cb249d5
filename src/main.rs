use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use outlet_atlas::api::{ApiClient, Backend};
use outlet_atlas::app::App;
use outlet_atlas::config::{Config, Settings, API_URL_ENV};
use outlet_atlas::query_panel::relay_query;
use outlet_atlas::{handler, tui, ui};

#[derive(Parser)]
#[command(name = "outlets")]
#[command(about = "Map of retail outlets with service areas, plus an AI query panel")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides the environment and config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log file used by the interactive view
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every outlet the backend knows about
    List,
    /// Print the answer currently stored by the backend
    Answer,
    /// Send a query, then print the stored answer
    Ask {
        /// Your question
        query: String,
    },
    /// Check that the backend is reachable
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {e:#}", "Ignoring config file".yellow());
        Config::default()
    });
    let settings = Settings::resolve(cli.api_url, cli.log_file, config)?;
    let client = ApiClient::new(&settings.api_url)
        .with_context(|| format!("Set a valid URL with --api-url or {API_URL_ENV}"))?;

    match cli.command {
        None => {
            init_file_logging(&settings.log_file)?;
            run_tui(client).await
        }
        Some(command) => {
            init_stderr_logging();
            match command {
                Commands::List => list_outlets(&client).await,
                Commands::Answer => print_answer(&client).await,
                Commands::Ask { query } => ask(&client, &query).await,
                Commands::Ping => ping(&client).await,
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("outlet_atlas=info,outlets=info"))
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_tui(client: ApiClient) -> Result<()> {
    let api_url = client.base_url().to_string();
    let backend: Arc<dyn Backend> = Arc::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(backend, events.sender(), api_url);
    app.mount();
    tracing::info!(api_url = %app.api_url, "interactive view started");

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    app.unmount();
    tui::restore()?;
    result
}

async fn list_outlets(client: &ApiClient) -> Result<()> {
    let outlets = client.outlets().await.context("Failed to fetch outlets")?;

    println!("\n{}", "Outlets".bold().yellow());
    println!("{}", "=".repeat(40).dimmed());

    if outlets.is_empty() {
        println!("{}", "No outlets found".red());
        return Ok(());
    }

    for outlet in &outlets {
        println!(
            "\n{} {}",
            format!("#{}", outlet.id).dimmed(),
            outlet.name.bold().green()
        );
        println!("  {}", outlet.address);
        println!("  {}", outlet.telephone);
        println!(
            "  {} {}",
            format!("({:.5}, {:.5})", outlet.latitude, outlet.longitude).dimmed(),
            outlet.waze_link.cyan()
        );
    }

    println!("\n{} outlets", outlets.len().to_string().bold());
    Ok(())
}

async fn print_answer(client: &ApiClient) -> Result<()> {
    let answer = client.stored_answer().await.context("Failed to fetch stored answer")?;
    if answer.llmresponse.is_empty() {
        println!("{}", "No answer stored yet".dimmed());
    } else {
        println!("{}", answer.llmresponse);
    }
    Ok(())
}

async fn ask(client: &ApiClient, query: &str) -> Result<()> {
    if query.is_empty() {
        println!("{}", "Nothing to ask".yellow());
        return Ok(());
    }

    println!("Asking: {}", query.cyan());
    let outcome = relay_query(client, query).await;

    match (outcome.posted, outcome.answer) {
        (false, _) => anyhow::bail!("The backend did not accept the query"),
        (true, None) => anyhow::bail!("Query sent, but the stored answer could not be fetched"),
        (true, Some(answer)) => {
            println!("{}", "Response:".bold().green());
            println!("{}", answer.llmresponse);
            Ok(())
        }
    }
}

async fn ping(client: &ApiClient) -> Result<()> {
    let body: serde_json::Value = client
        .get("/")
        .await
        .with_context(|| format!("Backend at {} is not reachable", client.base_url()))?;

    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("ok");
    println!("{} {}", "✓".green(), message);
    Ok(())
}
