//! Command-line host for the task list core.
//!
//! # Responsibility
//! - Resolve configuration from `TASKLIST_*` variables, overridden by flags.
//! - Start logging, open the store and run the one-time seed import.
//! - Drive the projection and edit model from the foreground queue.
//!
//! # Invariants
//! - A store that cannot be opened ends the process with exit code 1.
//! - A failed seed fetch is reported but never blocks the subcommand.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, LabelLocale};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasklist_core::service::edit_model::format_created_date;
use tasklist_core::{
    init_logging, BootstrapOutcome, ChangeNotifier, Completion, CoreConfig, CountLabelFormatter,
    EditOutcome, EnglishCountLabel, ForegroundQueue, HttpSeedSource, LogLevel, LoggingError,
    ProjectionEvent, RussianCountLabel, SeedBootstrap, SqliteImportFlag, StoreError, StoreHandle,
    Task, TaskEditModel, TaskId, TaskListProjection, TaskStore,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug)]
enum CliError {
    Config(LoggingError),
    Io(std::io::Error),
    Store(StoreError),
    NotFound(TaskId),
    Timeout(&'static str),
    Rejected(&'static str),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Store(err) => write!(f, "task store unavailable: {err}"),
            Self::NotFound(id) => write!(f, "task '{id}' not found"),
            Self::Timeout(operation) => write!(f, "{operation} did not finish in time"),
            Self::Rejected(operation) => write!(f, "{operation} was rejected by the store"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn main() {
    if let Err(err) = run() {
        error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Everything one invocation needs after startup.
struct Session {
    queue: Arc<ForegroundQueue>,
    store: Arc<dyn TaskStore>,
    notifier: ChangeNotifier,
    projection: TaskListProjection,
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(config.log_level, &config.log_dir(), true)?;
    info!(
        "event=cli_start module=cli status=ok data_dir={}",
        config.data_dir().display()
    );

    let handle = StoreHandle::new(config.db_path());
    let sqlite = handle.initialize()?;
    let store: Arc<dyn TaskStore> = sqlite;
    let flag = Arc::new(SqliteImportFlag::open(handle.path())?);

    let queue = ForegroundQueue::new();
    let notifier = ChangeNotifier::new();
    let projection = TaskListProjection::new(Arc::clone(&store), queue.clone(), formatter(cli.labels));
    projection.watch(&notifier);

    let source = HttpSeedSource::new(config.seed_url.clone());
    info!("event=cli_seed module=cli status=start endpoint={}", source.endpoint());
    let bootstrap = SeedBootstrap::new(
        Arc::new(source),
        Arc::clone(&store),
        flag,
        notifier.clone(),
    );
    let outcome = wait_for(&queue, "seed import", |done| bootstrap.run(done))?;
    report_bootstrap(&outcome, matches!(cli.command, Commands::Import));

    let session = Session {
        queue,
        store,
        notifier,
        projection,
    };

    match cli.command {
        Commands::List(args) => list(&session, args.search.as_deref()),
        Commands::Add(args) => add(&session, args.title, args.description),
        Commands::Edit(args) => edit(&session, args.id, args.title, args.description),
        Commands::Toggle(args) => toggle(&session, args.id),
        Commands::Delete(args) => delete(&session, args.id),
        Commands::Import => Ok(()),
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, CliError> {
    let mut config = CoreConfig::from_env()?;
    config.data_dir = absolute(config.data_dir)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = absolute(dir.clone())?;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = LogLevel::parse(level)?;
    }
    if let Some(url) = &cli.seed_url {
        config.seed_url = url.clone();
    }
    Ok(config)
}

fn absolute(path: PathBuf) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn formatter(locale: LabelLocale) -> Box<dyn CountLabelFormatter> {
    match locale {
        LabelLocale::English => Box::new(EnglishCountLabel),
        LabelLocale::Russian => Box::new(RussianCountLabel),
    }
}

/// Starts an asynchronous call and drains the queue until it resolves.
fn wait_for<T: Send + 'static>(
    queue: &Arc<ForegroundQueue>,
    operation: &'static str,
    start: impl FnOnce(Completion<T>),
) -> Result<T, CliError> {
    let slot = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    start(Completion::new(queue.clone(), move |value| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(value);
        }
    }));

    let filled = || slot.lock().map(|slot| slot.is_some()).unwrap_or(false);
    if !queue.run_until(WAIT_TIMEOUT, filled) {
        return Err(CliError::Timeout(operation));
    }
    let value = slot.lock().ok().and_then(|mut slot| slot.take());
    value.ok_or(CliError::Timeout(operation))
}

/// Drains the queue until the projection reports `matches`.
fn wait_for_projection(
    session: &Session,
    operation: &'static str,
    start: impl FnOnce(),
    matches: impl Fn(&ProjectionEvent) -> bool + Send + Sync + 'static,
) -> Result<(), CliError> {
    let seen = Arc::new(AtomicBool::new(false));
    let sink = Arc::clone(&seen);
    let subscription = session.projection.subscribe(move |event| {
        if matches(event) {
            sink.store(true, Ordering::SeqCst);
        }
    });

    start();
    let finished = session
        .queue
        .run_until(WAIT_TIMEOUT, || seen.load(Ordering::SeqCst));
    session.projection.unsubscribe(subscription);
    if finished {
        Ok(())
    } else {
        Err(CliError::Timeout(operation))
    }
}

fn report_bootstrap(outcome: &BootstrapOutcome, verbose: bool) {
    match outcome {
        BootstrapOutcome::Imported(count) => println!("imported {count} seed tasks"),
        BootstrapOutcome::ImportedFlagUnset { count, error } => {
            warn!("event=cli_seed module=cli status=error error_code=flag_write_failed error={error}");
            println!("imported {count} seed tasks");
            eprintln!("warning: import marker could not be saved: {error}");
        }
        BootstrapOutcome::FetchFailed(err) => {
            warn!("event=cli_seed module=cli status=error error={err}");
            eprintln!("warning: seed import skipped, will retry next launch: {err}");
        }
        BootstrapOutcome::StoreFailed(err) => {
            warn!("event=cli_seed module=cli status=error error={err}");
            eprintln!("warning: seed import could not be saved: {err}");
        }
        BootstrapOutcome::AlreadyImported if verbose => println!("seed data already imported"),
        BootstrapOutcome::InProgress if verbose => println!("seed import already running"),
        BootstrapOutcome::AlreadyImported | BootstrapOutcome::InProgress => {}
    }
}

fn list(session: &Session, search: Option<&str>) -> Result<(), CliError> {
    let projection = &session.projection;
    projection.reload();
    if let Some(term) = search {
        projection.search(term);
    }

    for index in 0..projection.row_count() {
        if let Some(task) = projection.task_at(index) {
            print_task(&task);
        }
    }
    println!("{}", projection.count_label());
    Ok(())
}

fn add(session: &Session, title: String, description: String) -> Result<(), CliError> {
    let mut model = TaskEditModel::new(None, Arc::clone(&session.store), session.notifier.clone());
    model.update(title, description);
    let outcome = wait_for(&session.queue, "create", |done| model.commit(done))?;
    print_outcome(outcome)
}

fn edit(
    session: &Session,
    id: TaskId,
    title: Option<String>,
    description: Option<String>,
) -> Result<(), CliError> {
    let task = find_task(session, id)?;
    let title = title.unwrap_or_else(|| task.title.clone());
    let description = description.unwrap_or_else(|| task.description.clone());

    let mut model = TaskEditModel::new(
        Some(task),
        Arc::clone(&session.store),
        session.notifier.clone(),
    );
    model.update(title, description);
    let outcome = wait_for(&session.queue, "edit", |done| model.commit(done))?;
    print_outcome(outcome)
}

fn toggle(session: &Session, id: TaskId) -> Result<(), CliError> {
    find_task(session, id)?;
    wait_for_projection(
        session,
        "toggle",
        || session.projection.toggle_completion(id),
        move |event| *event == ProjectionEvent::TaskUpdated(id),
    )?;

    let task = find_visible(session, id).ok_or(CliError::NotFound(id))?;
    print_task(&task);
    Ok(())
}

fn delete(session: &Session, id: TaskId) -> Result<(), CliError> {
    find_task(session, id)?;
    wait_for_projection(
        session,
        "delete",
        || session.projection.delete(id),
        |event| *event == ProjectionEvent::DataUpdated,
    )?;

    if find_visible(session, id).is_some() {
        return Err(CliError::Rejected("delete"));
    }
    println!("deleted {id}");
    println!("{}", session.projection.count_label());
    Ok(())
}

fn find_task(session: &Session, id: TaskId) -> Result<Task, CliError> {
    session.projection.reload();
    find_visible(session, id).ok_or(CliError::NotFound(id))
}

fn find_visible(session: &Session, id: TaskId) -> Option<Task> {
    session
        .projection
        .all_tasks()
        .into_iter()
        .find(|task| task.id == id)
}

fn print_outcome(outcome: EditOutcome) -> Result<(), CliError> {
    match outcome {
        EditOutcome::Created(task) => {
            println!("created");
            print_task(&task);
        }
        EditOutcome::Updated(id) => println!("updated {id}"),
        EditOutcome::Deleted(id) => println!("deleted {id} (title and description were empty)"),
        EditOutcome::Discarded => println!("nothing to save"),
        EditOutcome::Failed => return Err(CliError::Rejected("commit")),
    }
    Ok(())
}

fn print_task(task: &Task) {
    let mark = if task.is_completed { "x" } else { " " };
    let origin = if task.is_imported() { "seed" } else { "local" };
    println!(
        "[{mark}] {}  {origin}  {}  {}",
        task.title,
        format_created_date(task.created_at),
        task.id
    );
    if !task.description.is_empty() {
        println!("      {}", task.description);
    }
}
