//! snippy - terminal snippet manager
//!
//! With arguments, runs one CLI command and exits. Without, opens the
//! terminal UI over the same library.

use anyhow::Context;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};
use snippy::app::App;
use snippy::config::Config;
use snippy::session::Session;
use snippy::{cli, handlers, logging};
use std::io;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    color_eyre::install()?;
    run().map_err(|e| eyre!("{:#}", e))
}

fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    let log_dir = config.data_dir()?.join("snippy");
    let log_path = logging::init(&log_dir, &config.log.level)?;
    info!(log = %log_path.display(), guest = config.is_guest(), "snippy starting");

    let mut session = Session::open(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return cli::execute_cli(&mut session, &args);
    }

    run_tui(App::new(session))
}

fn run_tui(mut app: App) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = app.session.save() {
        error!(error = %e, "final save failed");
    }
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.needs_redraw {
            terminal.clear().context("Failed to clear terminal")?;
            app.needs_redraw = false;
        }
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handlers::keys::handle_key_events(key, app) {
                    return Ok(());
                }
            }
        }
        app.tick();
    }
}
