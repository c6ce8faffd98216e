use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::Event;
use tokio::sync::mpsc;

use autotrade_chart::backend::rest::{spawn_fetch, MinuteDataClient, MinuteDataQuery};
use autotrade_chart::chart::Reconciler;
use autotrade_chart::config::Config;
use autotrade_chart::event::AppEvent;
use autotrade_chart::input::{parse_main_command, UiCommand};
use autotrade_chart::ui::{self, AppState};

struct Fetcher {
    client: Arc<MinuteDataClient>,
    query: MinuteDataQuery,
    tx: mpsc::Sender<AppEvent>,
}

impl Fetcher {
    fn trigger(&self, app_state: &mut AppState) {
        let seq = app_state.session.begin_fetch();
        tracing::info!(seq, stock_code = %self.query.stock_code, "Requesting minute data");
        spawn_fetch(self.client.clone(), self.query.clone(), seq, self.tx.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists (or set AUTOTRADE_CONFIG_PATH)");
            std::process::exit(1);
        }
    };

    // Log to file so it doesn't interfere with TUI
    let log_file = std::fs::File::create("autotrade-chart.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        base_url = %config.backend.base_url,
        stock_code = %config.chart.stock_code,
        "Starting autotrade-chart"
    );

    let reconciler = Reconciler::new(config.chart.normalizer()?);
    let mut query = MinuteDataQuery::new(&config.chart.stock_code);
    if let Some(date) = config.chart.trade_date()? {
        query = query.on(date);
    }

    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(64);
    let fetcher = Fetcher {
        client: Arc::new(MinuteDataClient::new(&config.backend)?),
        query,
        tx: app_tx,
    };

    let mut app_state = AppState::new(&config.chart.stock_code, reconciler);
    app_state.push_log(format!(
        "autotrade-chart started | {} | {}",
        config.chart.stock_code, config.backend.base_url
    ));
    fetcher.trigger(&mut app_state);

    let auto_refresh = (config.ui.auto_refresh_secs > 0)
        .then(|| Duration::from_secs(config.ui.auto_refresh_secs));
    let mut last_refresh = Instant::now();

    let mut terminal = ratatui::init();
    let result: Result<()> = async {
        loop {
            while let Ok(event) = app_rx.try_recv() {
                app_state.apply(event);
            }

            terminal.draw(|frame| ui::render(frame, &app_state))?;

            if crossterm::event::poll(Duration::from_millis(config.ui.refresh_rate_ms))? {
                if let Event::Key(key) = crossterm::event::read()? {
                    match parse_main_command(&key.code) {
                        Some(UiCommand::Quit) => {
                            tracing::info!("User quit");
                            break;
                        }
                        Some(UiCommand::Refresh) => {
                            fetcher.trigger(&mut app_state);
                            last_refresh = Instant::now();
                        }
                        None => {}
                    }
                }
            }

            if let Some(every) = auto_refresh {
                if last_refresh.elapsed() >= every {
                    fetcher.trigger(&mut app_state);
                    last_refresh = Instant::now();
                }
            }
        }
        Ok(())
    }
    .await;

    ratatui::restore();
    result
}
