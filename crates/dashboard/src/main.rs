use std::fs::{self, OpenOptions};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use coingecko_client::CoinGeckoClient;
use coinboard::{App, CredentialStore, DashboardConfig, FileStore, KeySlot};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use insight_client::InsightClient;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, config, tracing
    dotenvy::dotenv().ok();
    let config = DashboardConfig::from_env()?;
    init_tracing(&config)?;

    // Panic hook: give the terminal back before reporting
    std::panic::set_hook(Box::new(|info| {
        let _ = restore_terminal();
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting Coinboard");
    tracing::info!("  Market data: {}", config.market_url);
    tracing::info!("  Refresh interval: {}s", config.refresh_interval.as_secs());
    tracing::info!("  Credentials: {}", config.credentials_file.display());

    // 2. Credentials, seeded from the environment when provided
    let mut credentials = CredentialStore::new(
        FileStore::open(&config.credentials_file).context("Failed to open credential store")?,
    );
    if let Some(key) = &config.market_key_seed {
        credentials.set(KeySlot::Market, key)?;
    }
    if let Some(key) = &config.insight_key_seed {
        credentials.set(KeySlot::Insight, key)?;
    }

    // 3. Clients
    let market = Arc::new(CoinGeckoClient::new(config.market_url.clone(), config.http_timeout));
    let insights = Arc::new(InsightClient::new(
        config.insight_url.clone(),
        config.http_timeout * 2,
    ));
    let (mut app, channels) = App::new(market, insights, credentials, config.refresh_interval);

    // 4. Terminal
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || forward_input(input_tx));

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = coinboard::app::run(&mut terminal, &mut app, channels, input_rx).await;

    restore_terminal()?;
    terminal.show_cursor()?;
    tracing::info!("Coinboard stopped");
    result
}

fn init_tracing(config: &DashboardConfig) -> Result<()> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Cannot open log file {}", config.log_file.display()))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false);
    if json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}

/// Blocking reader feeding terminal events into the async loop.
fn forward_input(tx: mpsc::UnboundedSender<Event>) {
    loop {
        match event::poll(Duration::from_millis(200)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("Terminal read failed: {}", e);
                    return;
                }
            },
            Ok(false) => {
                if tx.is_closed() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Terminal poll failed: {}", e);
                return;
            }
        }
    }
}
