pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::LevelFilter;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use steer::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    headless,
    plant::PlantOrder,
    runtime::{
        AppEvent, CrosstermEventSource, FixedTicker, Runner, Scheduler, ThreadScheduler,
    },
    session::{Mode, Settings},
    signal::TargetFunction,
};

/// Redraw interval when no timer is running
const IDLE_REDRAW_MS: u64 = 250;

/// Slider step for the coarse arrow keys
const COARSE_STEP: i32 = 5;

/// terminal control-loop trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Track a moving target by hand, or watch a PID controller do it, on a simulated first- or second-order plant. Hits inside the margin score a point per tick."
)]
pub struct Cli {
    /// control mode (defaults to the last one used)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// target waveform for humanil and closedL-auto
    #[clap(short = 't', long = "target", value_enum)]
    target_function: Option<TargetFunction>,

    /// plant model order
    #[clap(short = 'p', long, value_enum)]
    plant: Option<PlantOrder>,

    /// number of seconds before a run times out
    #[clap(short = 's', long)]
    timeout: Option<u64>,

    /// run a single session without a terminal and print the result
    #[clap(long)]
    headless: bool,

    /// fixed input (-150..=150) used by --headless runs
    #[clap(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-150..=150)
    )]
    input: i32,

    /// level written to the log file
    #[clap(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Cli {
    /// Stored config with command-line overrides applied
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(f) = self.target_function {
            cfg.target_function = f;
        }
        if let Some(plant) = self.plant {
            cfg.plant = plant;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_seconds = timeout;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App<S: Scheduler> {
    pub game: Game<S>,
}

impl<S: Scheduler> App<S> {
    pub fn new(settings: Settings, cfg: &Config, scheduler: S) -> Self {
        Self {
            game: Game::new(settings, cfg.session_config(), scheduler),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Continue;
        }
        let game = &mut self.game;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            // ctrl+c to quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return KeyOutcome::Quit
            }
            KeyCode::Char(' ') | KeyCode::Enter => game.start_stop(),
            KeyCode::Char('r') => game.reset(),
            KeyCode::Char('m') => {
                game.set_mode(game.config().mode.next());
            }
            KeyCode::Char('M') => {
                game.set_mode(game.config().mode.prev());
            }
            KeyCode::Char('f') => {
                game.set_target_function(game.config().target_function.next());
            }
            KeyCode::Char('F') => {
                game.set_target_function(game.config().target_function.prev());
            }
            KeyCode::Char('0') => {
                game.set_user_input(0);
            }
            KeyCode::Right => {
                game.adjust_user_input(COARSE_STEP);
            }
            KeyCode::Left => {
                game.adjust_user_input(-COARSE_STEP);
            }
            KeyCode::Up => {
                game.adjust_user_input(1);
            }
            KeyCode::Down => {
                game.adjust_user_input(-1);
            }
            _ => {}
        }
        KeyOutcome::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = steer::logging::init(cli.log_level.into(), &path) {
            eprintln!("warning: logging disabled, cannot write {}: {e}", path.display());
        }
    }

    let store = FileConfigStore::new();
    let cfg = cli.apply_to(store.load());
    let settings = match cfg.settings() {
        Ok(settings) => settings,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    if cli.headless {
        let session = cfg.session_config();
        if let Some(summary) = headless::run_session(settings.clone(), session, cli.input) {
            println!("{}", headless::format_summary(&session, &settings, &summary));
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty (use --headless)").exit();
    }

    let events = CrosstermEventSource::new();
    let scheduler = ThreadScheduler::new(events.sender());
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(IDLE_REDRAW_MS)));
    let mut app = App::new(settings, &cfg, scheduler);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    // remember the last selection, not the command-line overrides
    let mut stored = store.load();
    stored.mode = app.game.config().mode;
    stored.target_function = app.game.config().target_function;
    if let Err(e) = store.save(&stored) {
        log::warn!("could not save preferences to {}: {e}", store.path().display());
    }

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<ThreadScheduler>,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Timer(id) => {
                // stale timers change nothing and need no redraw
                if app.game.on_timer(id) {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Tick | AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.handle_key(key) == KeyOutcome::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui<S: Scheduler>(app: &App<S>, f: &mut Frame) {
    f.render_widget(app, f.area());
}
