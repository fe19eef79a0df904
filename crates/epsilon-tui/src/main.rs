use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use epsilon_core::{Config, Controller};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "epsilon")]
#[command(about = "Chat with a simulated assistant in your terminal")]
#[command(version)]
struct Cli {
    /// Seed for response selection and typing delays (reproducible sessions)
    #[arg(long)]
    seed: Option<u64>,

    /// Shortest simulated typing delay in milliseconds
    #[arg(long)]
    min_delay_ms: Option<u64>,

    /// Longest simulated typing delay in milliseconds
    #[arg(long)]
    max_delay_ms: Option<u64>,

    /// Write logs here instead of the config directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective configuration to disk and exit
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// Command-line flags take precedence over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(min) = self.min_delay_ms {
            config.min_delay_ms = min;
        }
        if let Some(max) = self.max_delay_ms {
            config.max_delay_ms = max;
        }
    }
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => {
            let dir = Config::config_dir()?;
            std::fs::create_dir_all(&dir)?;
            dir.join("epsilon.log")
        }
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("epsilon_core=info,epsilon_tui=info"));

    // The terminal belongs to the UI, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.clone())?;

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Config::new()
        }
    };
    cli.apply(&mut config);

    if cli.init_config {
        let path = config.save()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let (controller, completions) = Controller::from_config(&config)?;
    tracing::info!(
        min_delay_ms = config.min_delay_ms,
        max_delay_ms = config.max_delay_ms,
        seeded = config.seed.is_some(),
        "starting chat"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let width = terminal.size()?.width;

    let mut app = App::new(controller, &config, width);
    let mut events = EventHandler::new(completions);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    tracing::info!(messages = app.controller.session().messages().len(), "chat closed");
    Ok(())
}
