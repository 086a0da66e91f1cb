mod plain;
mod ui;

use std::fs::{self, OpenOptions};
use std::io::{self, stdin, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quiver::app::{App, Control, SaveStatus};
use quiver::app_dirs::AppDirs;
use quiver::config::{BackendKind, Config, ConfigStore, FileConfigStore};
use quiver::history::HistoryStore;
use quiver::query::{self, Selector, TimeBucket};
use quiver::runtime::{AppEvent, CrosstermEventSource, Runner};
use quiver::session::SessionConfig;
use quiver::{summarize, DistanceLabel, SessionId, Stats, Timestamp, VolleySize};

const TICK_RATE_MS: u64 = 250;

/// archery practice tracker with a terminal target and shooting history
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Score archery volleys on a terminal target, keep every arrow in a history log, and review it by distance, time window or session."
)]
struct Cli {
    /// history file to use instead of the configured one
    #[clap(long, global = true)]
    history: Option<PathBuf>,

    /// history storage format
    #[clap(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// record a practice session (default)
    Record(RecordArgs),
    /// browse the shooting history on a target
    Dashboard,
    /// print statistics for part of the history
    Stats(StatsArgs),
    /// list recorded distances and sessions
    List,
}

#[derive(clap::Args, Debug, Default)]
struct RecordArgs {
    /// shooting distance label, e.g. 18m
    #[clap(short = 'd', long)]
    distance: Option<DistanceLabel>,

    /// arrows per volley (3 or 6)
    #[clap(short = 'v', long)]
    volley_size: Option<VolleySize>,

    /// read `x y` impacts from stdin instead of opening the target
    #[clap(long)]
    plain: bool,

    /// store the distance and volley size as defaults for later sessions
    #[clap(long)]
    remember: bool,
}

#[derive(clap::Args, Debug)]
struct StatsArgs {
    /// shooting distance label
    #[clap(short = 'd', long)]
    distance: DistanceLabel,

    /// time window to include
    #[clap(short = 'b', long, value_enum, default_value_t = BucketArg::All, conflicts_with = "session")]
    bucket: BucketArg,

    /// a single session id, e.g. 2024-06-01_09-30
    #[clap(short = 's', long)]
    session: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum BucketArg {
    #[clap(name = "7d")]
    Days7,
    #[clap(name = "15d")]
    Days15,
    #[clap(name = "30d")]
    Days30,
    #[clap(name = "90d")]
    Days90,
    #[clap(name = "365d")]
    Days365,
    All,
}

impl From<BucketArg> for TimeBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Days7 => TimeBucket::Last7Days,
            BucketArg::Days15 => TimeBucket::Last15Days,
            BucketArg::Days30 => TimeBucket::LastMonth,
            BucketArg::Days90 => TimeBucket::Last3Months,
            BucketArg::Days365 => TimeBucket::LastYear,
            BucketArg::All => TimeBucket::AllTime,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum BackendArg {
    Csv,
    Sqlite,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Csv => BackendKind::Csv,
            BackendArg::Sqlite => BackendKind::Sqlite,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let (config_store, config) = load_config(&cli);
    let store = HistoryStore::load(config.history_backend()).context("failed to load history")?;

    match cli.command {
        None => record(RecordArgs::default(), &config_store, &config, store),
        Some(Command::Record(args)) => record(args, &config_store, &config, store),
        Some(Command::Dashboard) => {
            require_tty()?;
            run_tui(App::dashboard(store)).map(|_| ())
        }
        Some(Command::Stats(args)) => print_stats(&args, &store),
        Some(Command::List) => print_list(&store),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("QUIVER_LOG").unwrap_or_else(|_| EnvFilter::new("quiver=info"));
    let log_file = AppDirs::log_path().and_then(|path| {
        fs::create_dir_all(path.parent()?).ok()?;
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
    match log_file {
        Some(file) => builder.with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(io::sink).init(),
    }
}

fn load_config(cli: &Cli) -> (FileConfigStore, Config) {
    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = match store.load() {
        Ok(config) => config,
        Err(e) => {
            warn!("ignoring config {}: {e}", store.path().display());
            eprintln!("Ignoring config file {}: {e}", store.path().display());
            Config::default()
        }
    };

    if let Some(path) = &cli.history {
        config.history_path = Some(path.clone());
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    (store, config)
}

fn require_tty() -> Result<()> {
    if !stdin().is_terminal() {
        bail!("stdin must be a tty (use `record --plain` to pipe impacts)");
    }
    Ok(())
}

fn record(
    args: RecordArgs,
    config_store: &impl ConfigStore,
    config: &Config,
    mut store: HistoryStore,
) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let distance = match args.distance {
        Some(distance) => distance,
        None => match config.distance() {
            Ok(Some(distance)) => distance,
            Ok(None) => plain::prompt_distance(&mut input, &mut out)?,
            Err(e) => {
                writeln!(out, "{e}")?;
                plain::prompt_distance(&mut input, &mut out)?
            }
        },
    };
    let volley_size = match args.volley_size {
        Some(size) => size,
        None => match config.volley_size() {
            Ok(Some(size)) => size,
            Ok(None) => plain::prompt_volley_size(&mut input, &mut out)?,
            Err(e) => {
                writeln!(out, "{e}")?;
                plain::prompt_volley_size(&mut input, &mut out)?
            }
        },
    };

    if args.remember {
        remember_defaults(config_store, &distance, volley_size)?;
    }

    let session = SessionConfig::new(distance, volley_size);
    info!("recording at {} with volleys of {}", session.distance, volley_size);

    if args.plain {
        return plain::run(&mut input, &mut out, session, &mut store);
    }

    drop(input);
    require_tty()?;
    let app = run_tui(App::capture(session, store))?;
    if let Some(status) = &app.save_status {
        print_session_report(&mut out, &app.session_stats.clone().unwrap_or_default(), status)?;
    }
    Ok(())
}

fn remember_defaults(
    config_store: &impl ConfigStore,
    distance: &DistanceLabel,
    volley_size: VolleySize,
) -> Result<()> {
    // written without the command line overrides of history path and backend
    let mut saved = config_store.load().unwrap_or_default();
    saved.distance = Some(distance.to_string());
    saved.volley_size = Some(volley_size.into());
    config_store
        .save(&saved)
        .context("failed to save config")?;
    info!("remembered {distance} with volleys of {volley_size}");
    Ok(())
}

fn print_session_report(
    out: &mut impl Write,
    stats: &Stats,
    status: &SaveStatus,
) -> Result<()> {
    writeln!(out, "\nSESSION STATISTICS")?;
    for line in stats.lines() {
        writeln!(out, "{line}")?;
    }
    match status {
        SaveStatus::Saved { path, .. } => writeln!(out, "Results saved to: {path}")?,
        SaveStatus::Failed(e) => bail!("could not save session: {e}"),
    }
    Ok(())
}

fn print_stats(args: &StatsArgs, store: &HistoryStore) -> Result<()> {
    let selector = match &args.session {
        Some(id) => Selector::Session(SessionId::from(id.as_str())),
        None => Selector::TimeRange(args.bucket.into()),
    };
    let shots = query::filter(store.shots(), &args.distance, &selector, Timestamp::now());

    let mut out = io::stdout().lock();
    writeln!(out, "Distance: {}  |  {}", args.distance, selector.label())?;
    for line in summarize(&shots).lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn print_list(store: &HistoryStore) -> Result<()> {
    let mut out = io::stdout().lock();
    let distances = query::available_distances(store.shots());
    if distances.is_empty() {
        writeln!(out, "No arrows recorded yet.")?;
    }
    for distance in distances {
        writeln!(out, "{distance}")?;
        for session in query::available_sessions(store.shots(), &distance) {
            writeln!(out, "  {session}")?;
        }
    }
    Ok(())
}

fn run_tui(mut app: App) -> Result<App> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|_| app)
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| ui::draw(app, f))?;
    loop {
        match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Tick => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_record_flags() {
        let cli = Cli::try_parse_from(["quiver", "record", "-d", " 18m ", "-v", "3", "--plain"]).unwrap();
        match cli.command {
            Some(Command::Record(args)) => {
                assert_eq!(args.distance.unwrap().as_str(), "18m");
                assert_eq!(args.volley_size, Some(VolleySize::Three));
                assert!(args.plain);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_bad_volley_size() {
        assert!(Cli::try_parse_from(["quiver", "record", "-v", "4"]).is_err());
    }

    #[test]
    fn cli_stats_bucket() {
        let cli = Cli::try_parse_from(["quiver", "stats", "-d", "30m", "-b", "90d"]).unwrap();
        match cli.command {
            Some(Command::Stats(args)) => {
                assert_eq!(TimeBucket::from(args.bucket), TimeBucket::Last3Months);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn remember_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        store
            .save(&Config {
                backend: BackendKind::Sqlite,
                ..Config::default()
            })
            .unwrap();

        remember_defaults(&store, &"30m".parse().unwrap(), VolleySize::Three).unwrap();

        let saved = store.load().unwrap();
        assert_eq!(saved.distance.as_deref(), Some("30m"));
        assert_eq!(saved.volley_size, Some(3));
        assert_eq!(saved.backend, BackendKind::Sqlite);
        assert_eq!(saved.history_path, None);
    }

    #[test]
    fn global_history_flag() {
        let cli = Cli::try_parse_from(["quiver", "list", "--history", "/tmp/h.csv", "--backend", "sqlite"]).unwrap();
        let (_, config) = load_config(&Cli {
            config: Some(PathBuf::from("/nonexistent/quiver/config.json")),
            ..cli
        });
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/h.csv")));
        assert_eq!(config.backend, BackendKind::Sqlite);
    }
}
