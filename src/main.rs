use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use sociacube::{
    app::{App, Outcome},
    app_dirs::DataPaths,
    clock::{Clock, MonotonicClock},
    config::{Config, ConfigStore, FileConfigStore},
    controller::TimerController,
    export,
    logging,
    puzzle::PuzzleVariant,
    remote::{FirestoreRemote, RemoteMirror},
    runtime::{Runner, TerminalInput, TimerEvent},
    scramble::Scrambler,
    session::SolveSession,
    store::SqliteStore,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Arc,
};

/// terminal speedcubing timer with inspection, rolling averages and history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speedcubing timer: WCA-style inspection countdown, scrambles, Ao5/Ao12 and a per-puzzle solve history."
)]
pub struct Cli {
    /// puzzle to time
    #[clap(short = 'p', long, value_enum)]
    puzzle: Option<PuzzleVariant>,

    /// inspection countdown in seconds (0 starts timing immediately)
    #[clap(short = 'i', long)]
    inspection: Option<u32>,

    /// username, used as the key for synced solves
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// display name shown instead of the username
    #[clap(long)]
    name: Option<String>,

    /// email stored with the profile
    #[clap(long)]
    email: Option<String>,

    /// firestore project to mirror solves into (needs --user)
    #[clap(long)]
    sync: Option<String>,

    /// keep history, log and config in this directory
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// write the puzzle's history as CSV to this path ("-" for stdout) and exit
    #[clap(long)]
    export: Option<PathBuf>,

    /// save the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags given on the command line win over the stored config
    fn apply(&self, config: &mut Config) {
        if let Some(puzzle) = self.puzzle {
            config.puzzle = puzzle;
        }
        if let Some(secs) = self.inspection {
            config.inspection_secs = secs;
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(email) = &self.email {
            config.email = Some(email.clone());
        }
        if let Some(project) = &self.sync {
            config.firestore_project = Some(project.clone());
            config.sync_enabled = true;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let paths = DataPaths::resolve(cli.data_dir.as_deref());

    if cli.export.is_some() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging(&paths.log)?;
    }

    let config_store = FileConfigStore::with_path(&paths.config);
    let mut config = config_store.load();
    cli.apply(&mut config);
    if cli.save_config {
        config_store.save(&config)?;
        tracing::info!(path = %config_store.path().display(), "config saved");
    }

    if let Some(target) = &cli.export {
        return export_history(&paths, &config, target);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let session = open_session(&paths, &config)?;
    let controller = TimerController::new(
        MonotonicClock::new(),
        session,
        Scrambler::new(),
        config.inspection_secs,
    );
    let mut app = App::new(controller);
    tracing::info!(puzzle = %config.puzzle, "timer started");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.controller.dispose();
    app.controller.session_mut().wait_for_remote();

    result
}

fn open_session(paths: &DataPaths, config: &Config) -> Result<SolveSession, Box<dyn Error>> {
    let store = SqliteStore::open(&paths.db)?;
    let mirror = match config.sync_project() {
        Some(project) if config.identity().user_id().is_some() => {
            tracing::info!(project, "mirroring solves to firestore");
            RemoteMirror::new(Arc::new(FirestoreRemote::from_env(project)?))
        }
        Some(_) => {
            tracing::warn!("sync needs a username; solves stay local");
            RemoteMirror::disabled()
        }
        None => RemoteMirror::disabled(),
    };
    Ok(SolveSession::new(
        config.puzzle,
        Box::new(store),
        mirror,
        config.identity(),
    ))
}

fn export_history(paths: &DataPaths, config: &Config, target: &Path) -> Result<(), Box<dyn Error>> {
    let session = SolveSession::new(
        config.puzzle,
        Box::new(SqliteStore::open(&paths.db)?),
        RemoteMirror::disabled(),
        config.identity(),
    );
    let history = session.history();

    if target == Path::new("-") {
        export::write_csv(history, io::stdout().lock())?;
    } else {
        export::write_csv(history, File::create(target)?)?;
    }
    tracing::info!(puzzle = %config.puzzle, solves = history.len(), target = %target.display(), "history exported");
    Ok(())
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(TerminalInput::spawn());

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        // sleep no longer than the next countdown step or display refresh
        match runner.step(app.until_due()) {
            TimerEvent::Due => {
                if app.on_tick() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            TimerEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            TimerEvent::Command(command) => match app.on_command(command) {
                Outcome::Quit => break,
                Outcome::Redraw => {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
                Outcome::Ignored => {}
            },
        }
    }

    Ok(())
}
