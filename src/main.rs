mod ui;

use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use autotype::{
    app::App,
    app_dirs::AppDirs,
    batch,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{TickEvent, TypingController},
    device::{EnigoKeyboard, EnigoPointer, KeystrokeSink, PointerSource},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, Ticker},
    source,
};
use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// type text into any window with synthetic keystrokes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Simulates keyboard typing when copy-paste is unavailable. Text comes from stdin, a file, or an interactive editor, and is typed into whichever window has focus after a short delay."
)]
#[clap(group(ArgGroup::new("source").required(true).args(["stdin", "file", "gui"])))]
pub struct Cli {
    /// read lines from stdin and type each one
    #[clap(long)]
    stdin: bool,

    /// type the contents of a file
    #[clap(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// open the interactive editor
    #[clap(long, visible_alias = "editor")]
    gui: bool,

    /// seconds to wait before typing starts [default: 5]
    #[clap(short = 'd', long, value_name = "SECONDS")]
    delay: Option<u64>,

    /// milliseconds between keystrokes [default: 50]
    #[clap(short = 'i', long, value_name = "MS")]
    interval: Option<u64>,

    /// config file to load defaults from
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Stdin,
    File(PathBuf),
    Editor,
}

impl Cli {
    fn mode(&self) -> Mode {
        match (&self.file, self.stdin) {
            (Some(path), _) => Mode::File(path.clone()),
            (None, true) => Mode::Stdin,
            (None, false) => Mode::Editor,
        }
    }

    /// Explicit flags win over the config file
    fn apply_to(&self, config: &mut Config) {
        if let Some(delay) = self.delay {
            config.delay_secs = delay;
        }
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = cli.mode();

    let store = cli.config_store();
    let mut config = store.load();
    cli.apply_to(&mut config);

    setup_logging(&config, mode == Mode::Editor)?;
    info!(?mode, delay_secs = config.delay_secs, interval_ms = config.interval_ms, "starting");

    match mode {
        Mode::Stdin => run_stdin(config.delay(), config.interval()),
        Mode::File(path) => run_file(&path, config.delay(), config.interval()),
        Mode::Editor => run_editor(config, &store),
    }
}

/// Configure tracing; the editor owns the terminal so it always logs to a file
fn setup_logging(config: &Config, interactive: bool) -> Result<()> {
    let level = match config.log_level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    // enigo is kept at error-only so typed text never reaches the log
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},enigo=error")));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if interactive || config.log_to_file {
        let path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("autotype.log"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;
        subscriber.with_ansi(false).with_writer(file).init();
    } else {
        subscriber.with_writer(io::stderr).init();
    }

    Ok(())
}

fn run_stdin(delay: Duration, interval: Duration) -> Result<()> {
    println!("[>] Reading from stdin");

    let mut reader = stdin().lock();
    let mut stdout = io::stdout();
    let mut keyboard: Option<EnigoKeyboard> = None;

    while let Some(line) = source::prompt_line(&mut reader, &mut stdout, "> ")? {
        if line.is_empty() {
            continue;
        }
        if keyboard.is_none() {
            keyboard = Some(EnigoKeyboard::connect().context("Failed to set up keyboard input")?);
        }
        batch::countdown(delay, &mut io::stderr(), thread::sleep)?;
        if let Some(kb) = keyboard.as_mut() {
            kb.type_text(&line, interval)?;
        }
    }

    println!();
    info!("stdin closed");
    Ok(())
}

fn run_file(path: &Path, delay: Duration, interval: Duration) -> Result<()> {
    println!("[>] Reading from file: {}", path.display());

    let text = source::load_file(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    if text.is_empty() {
        warn!("{} is empty, nothing to type", path.display());
        return Ok(());
    }

    let mut keyboard = EnigoKeyboard::connect().context("Failed to set up keyboard input")?;
    batch::countdown(delay, &mut io::stderr(), thread::sleep)?;
    keyboard.type_text(&text, interval)?;
    Ok(())
}

fn run_editor(mut config: Config, store: &impl ConfigStore) -> Result<()> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let keyboard = EnigoKeyboard::connect().context("Failed to set up keyboard input")?;
    let pointer = EnigoPointer::connect().context("Failed to set up pointer tracking")?;
    let mut app = App::new(TypingController::new(keyboard, pointer), &config);
    let initial = (app.delay_secs, app.interval_ms);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    // ctrl+enter is only distinguishable with the kitty protocol
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if (app.delay_secs, app.interval_ms) != initial {
        app.apply_to(&mut config);
        if let Err(e) = store.save(&config) {
            warn!("could not save settings: {e}");
        }
    }

    result
}

fn start_tui<B, K, P>(terminal: &mut Terminal<B>, app: &mut App<K, P>) -> Result<()>
where
    B: Backend,
    K: KeystrokeSink,
    P: PointerSource,
{
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(app.tick_interval()),
    );

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        runner.ticker_mut().set_interval(app.tick_interval());

        match runner.step() {
            AppEvent::Tick(elapsed) => {
                // device failures end the session; there is nothing to retry against
                if app.on_tick(elapsed)? != TickEvent::Idle {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                app.on_key(key);
                if app.should_quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    info!("editor closed");
    Ok(())
}
