mod accumulator;
mod action;
mod app;
mod config;
mod controller;
mod dump;
mod error;
mod event;
mod fetcher;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::controller::EndOfListPolicy;
use crate::event::Event;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::tui::EventHandler;

#[derive(Debug, Parser)]
#[command(name = "pagewalk", version, about)]
struct Cli {
    /// Collection endpoint, queried with `page` and `pageSize`
    #[arg(long)]
    endpoint: Option<String>,

    /// Items requested per page
    #[arg(long)]
    page_size: Option<u32>,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Stop requesting pages after a page shorter than the page size
    #[arg(long)]
    stop_on_short_page: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse the collection in the terminal (default)
    Browse,
    /// Print items as JSON lines without a UI
    Dump {
        /// Number of pages to request
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.source.endpoint = endpoint.clone();
        }
        if let Some(page_size) = self.page_size {
            config.list.page_size = page_size.max(1);
        }
        if let Some(timeout) = self.timeout {
            config.source.timeout_secs = Some(timeout);
        }
        if self.stop_on_short_page {
            config.list.end_policy = EndOfListPolicy::StopOnShortPage;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    cli.apply(&mut config);

    let fetcher = HttpFetcher::new(config.source.endpoint.clone(), config.timeout())?;
    info!(
        endpoint = fetcher.endpoint(),
        page_size = config.list.page_size,
        "using collection"
    );

    match cli.command.unwrap_or(Command::Browse) {
        Command::Dump { pages } => {
            let mut stdout = std::io::stdout().lock();
            dump::run(&fetcher, config.load_options(), pages, &mut stdout).await?;
            Ok(())
        }
        Command::Browse => {
            // Set up panic hook to restore terminal
            let original_hook = panic::take_hook();
            panic::set_hook(Box::new(move |panic_info| {
                let _ = tui::restore();
                original_hook(panic_info);
            }));

            let result = run(&config, Arc::new(fetcher)).await;

            // Restore terminal
            tui::restore()?;

            result
        }
    }
}

async fn run(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(config, fetcher, action_tx.clone());
    app.viewport_rows = terminal.size()?.height;

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.unmount();
    Ok(())
}
