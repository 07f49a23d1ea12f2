#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

mod app;
mod explorer;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use fossil_client::grpc::{GrpcStore, GrpcStoreConfig};
use fossil_client::{KeyValueStore, DEFAULT_MAX_MESSAGE_BYTES};
use fossil_core::types::{DEFAULT_COLLECTION, DEFAULT_KEY_PAGE_SIZE};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use crate::app::{App, Settings};

#[derive(Debug, Parser, Clone)]
#[command(name = "fossil-tui")]
#[command(about = "Terminal browser for FossilDB keys and versioned records")]
struct Args {
    /// FossilDB host.
    #[arg(long, env = "FOSSIL_ADDRESS", default_value = "localhost")]
    address: String,
    /// FossilDB gRPC port.
    #[arg(long, env = "FOSSIL_PORT", default_value_t = 7155)]
    port: u16,
    /// Collection shown at startup.
    #[arg(long, env = "FOSSIL_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,
    /// Keys per page.
    #[arg(long, env = "FOSSIL_PAGE_SIZE", default_value_t = DEFAULT_KEY_PAGE_SIZE)]
    page_size: u32,
    /// Directory for saved versions and out.bin.
    #[arg(long, env = "FOSSIL_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,
    /// gRPC max message size (both decode/encode).
    #[arg(
        long,
        env = "FOSSIL_GRPC_MAX_MESSAGE_BYTES",
        default_value_t = DEFAULT_MAX_MESSAGE_BYTES
    )]
    grpc_max_message_bytes: usize,
    /// Log file; the terminal itself is owned by the UI.
    #[arg(long, env = "FOSSIL_LOG_FILE", default_value = "fossil-tui.log")]
    log_file: PathBuf,
    /// Health-check, print one page of keys and exit.
    #[arg(long, env = "FOSSIL_TUI_HEADLESS", default_value_t = false)]
    headless: bool,
}

async fn run_headless(mut app: App<GrpcStore>) -> Result<()> {
    app.refresh_keys().await;
    println!("{}", app.status);
    for key in &app.keys {
        println!("{key}");
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_ui(mut app: App<GrpcStore>) -> Result<()> {
    enable_raw_mode()?;
    let mut out = io::stdout();
    out.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    app.refresh_keys().await;

    let result: Result<()> = async {
        while !app.quit {
            terminal.draw(|f| ui::render(f, &app))?;
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key).await;
                    }
                }
            }
        }
        Ok(())
    }
    .await;

    restore_terminal(&mut terminal)?;
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    fossil_observe::logging::init_tracing_to_file(&args.log_file)?;

    let mut cfg = GrpcStoreConfig::from_host_port(&args.address, args.port);
    cfg.max_message_bytes = args.grpc_max_message_bytes;
    let mut store = match GrpcStore::connect(&cfg).await {
        Ok(store) => store,
        Err(err) => anyhow::bail!("could not connect to FossilDB at {}: {err}", cfg.url),
    };
    if let Err(err) = store.health().await {
        anyhow::bail!("FossilDB at {} is not healthy: {err}", cfg.url);
    }
    info!(url = %cfg.url, "connected");

    let stats = store.stats();
    let settings = Settings {
        collection: args.collection.clone(),
        page_size: args.page_size,
        out_dir: args.out_dir.clone(),
    };
    let app = App::new(store, settings).with_rpc_stats(stats);

    if args.headless {
        return run_headless(app).await;
    }
    run_ui(app).await
}
