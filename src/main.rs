use flyby::app::AppState;
use flyby::cli::{self, Invocation};
use flyby::command::{Command, LoginRequest};
use flyby::concourse::executor::{self, FlyConnector, INSTALL_HINT};
use flyby::concourse::Connector;
use flyby::config::FlyrcStore;
use flyby::events::{AppEvent, EventHandler};
use flyby::scheduler::Scheduler;
use flyby::tui;

use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;

const TICK_RATE: Duration = Duration::from_millis(100);

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "flyby v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("flyby")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local").join("state").join("flyby")
    } else {
        std::env::temp_dir().join("flyby")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = match cli::parse(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Exit { code, message } => {
            println!("{}", message.trim_end());
            std::process::exit(code);
        }
    };

    if args.verbose {
        setup_verbose_logging()?;
    }

    if let Err(e) = executor::check_fly_available() {
        tracing::error!("{e}");
        eprintln!("Error: fly CLI not found in PATH");
        eprintln!("Please install the Concourse fly CLI and ensure it's in your PATH");
        eprintln!("{INSTALL_HINT}");
        std::process::exit(1);
    }

    let store = FlyrcStore::open_default()?;
    tracing::debug!(path = ?store.path(), "opened target store");

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle("flyby"))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let connector: Arc<dyn Connector> = Arc::new(FlyConnector);
    let mut state = AppState::new(Box::new(store), connector.clone());

    let events = EventHandler::new(TICK_RATE);
    let scheduler = Scheduler::new(events.sender(), connector.clone(), args.count as usize);

    let result = run_app(&mut terminal, &mut state, events, &scheduler, connector.as_ref()).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    scheduler: &Scheduler,
    connector: &dyn Connector,
) -> Result<()> {
    loop {
        terminal.draw(|f| tui::render::render(f, state))?;

        let Some(event) = events.next().await else {
            tracing::warn!("event channel closed");
            return Ok(());
        };

        let mut pending = state.handle_event(event);
        while !pending.is_empty() {
            let mut next = Vec::new();
            for cmd in pending {
                match scheduler.dispatch(cmd) {
                    None => {}
                    Some(Command::Login(req)) => {
                        let finished = run_login(terminal, &mut events, connector, &req)?;
                        next.extend(state.handle_event(finished));
                    }
                    Some(other) => tracing::warn!(command = ?other, "command left unhandled"),
                }
            }
            pending = next;
        }

        if state.should_quit() {
            events.stop();
            return Ok(());
        }
    }
}

/// Hands the terminal to `fly login` and takes it back afterwards.
fn run_login(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    events: &mut EventHandler,
    connector: &dyn Connector,
    req: &LoginRequest,
) -> Result<AppEvent> {
    events.pause();
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    let result = tokio::task::block_in_place(|| {
        connector.login_interactive(&req.target, &req.api_url, &req.team)
    });
    if let Err(e) = &result {
        tracing::warn!(target_name = %req.target, error = %e, "interactive login failed");
    }

    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    terminal.clear()?;
    events.resume(TICK_RATE);

    Ok(AppEvent::LoginFinished {
        origin: req.origin,
        target: req.target.clone(),
        result,
    })
}
