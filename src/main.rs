use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::info;

use servicewatch::{
    events, export, logging, ui, ApiClient, App, Overrides, QueryCache, Settings, Theme,
    ThemeChoice, TimeRange,
};

/// Event poll timeout while the dependency map is animating.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Event poll timeout otherwise.
const IDLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "servicewatch", version)]
#[command(about = "Terminal dashboard for service health, dependencies and traces")]
struct Args {
    /// Base URL of the metrics API [default: http://localhost:8000]
    #[arg(short, long)]
    api_url: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Auto-refresh interval (e.g., "30s", "1m") [default: 30s]
    #[arg(short, long)]
    refresh: Option<String>,

    /// Initial time range: 15m, 1h or 24h [default: 1h]
    #[arg(short, long)]
    time_range: Option<TimeRange>,

    /// Color theme [default: auto]
    #[arg(long, value_enum)]
    theme: Option<ThemeChoice>,

    /// Write logs to this file (the terminal is used by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the services list to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            refresh_interval: self.refresh.clone(),
            time_range: self.time_range,
            theme: self.theme,
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;

    let runtime = Runtime::new()?;
    let client = ApiClient::new(
        &settings.api_url,
        settings.access_token.clone(),
        settings.request_timeout,
    )?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        logging::init_stderr()?;
        return export_to_file(&runtime, &client, &settings, export_path);
    }

    let _log_guard = match settings.log_file {
        Some(ref path) => Some(logging::init_file(path)?),
        None => None,
    };
    info!(
        api_url = %settings.api_url,
        refresh = ?settings.refresh_interval,
        time_range = %settings.time_range,
        "starting servicewatch"
    );

    // Detect the theme before the terminal enters raw mode
    let theme = Theme::from_choice(settings.theme);
    let queries = QueryCache::new(
        Arc::new(client),
        runtime.handle().clone(),
        settings.refresh_interval,
    );
    let app = App::new(queries, settings.time_range, theme);

    let result = run_tui(app);
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.update();

        terminal.draw(|frame| ui::draw(frame, app))?;

        let timeout = if app.is_animating() {
            FRAME_INTERVAL
        } else {
            IDLE_INTERVAL
        };
        if let Some(event) = events::poll_event(timeout)? {
            events::handle_event(app, event);
        }
    }

    info!("servicewatch exiting");
    Ok(())
}

/// Fetch the services list once and write it to `export_path`
fn export_to_file(
    runtime: &Runtime,
    client: &ApiClient,
    settings: &Settings,
    export_path: &Path,
) -> Result<()> {
    let services = runtime.block_on(client.services(settings.time_range))?;
    export::write_export(export_path, &services, settings.time_range)?;

    info!(services = services.len(), "export complete");
    println!("Exported {} services to: {}", services.len(), export_path.display());
    Ok(())
}
