mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppData, AppEvent, AppModel};
use crate::cli::CliInvocation;
use crate::domain::ProjectRecord;
use crate::infra::{
    ProjectsSignal, WatchSignal, load_dataset, resolve_dataset_path, spawn_project_resolver,
    watch_dataset,
};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::ExecutableCommand;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;

/// Simulated latency of the project lookup, so the slug-badge fallback is
/// actually observable in the TUI.
const PROJECT_RESOLVE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            crate::cli::print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            crate::cli::print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            crate::cli::print_version();
            Ok(())
        }
        CliInvocation::Tui { dataset } => Ok(run_tui(dataset)?),
        CliInvocation::Command(command) => Ok(crate::cli::run_command(command)?),
    }
}

fn run_tui(dataset: Option<PathBuf>) -> Result<(), crate::app::AppError> {
    let dataset_path = match dataset {
        Some(path) => path,
        None => resolve_dataset_path()?,
    };

    let (data, project_records) = load_data(&dataset_path);
    let mut model = AppModel::new(data);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut model, &dataset_path, project_records);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, crate::app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), crate::app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Loads the dataset into app data, never failing: load errors become the
/// error view.
fn load_data(dataset_path: &Path) -> (AppData, Vec<ProjectRecord>) {
    match load_dataset(dataset_path) {
        Ok(dataset) => {
            let records = dataset.projects.clone();
            (
                AppData::from_dataset(dataset_path.to_path_buf(), dataset),
                records,
            )
        }
        Err(error) => (
            AppData::from_error(dataset_path.to_path_buf(), error.to_string()),
            Vec::new(),
        ),
    }
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    dataset_path: &Path,
    project_records: Vec<ProjectRecord>,
) -> Result<(), crate::app::AppError> {
    let (projects_tx, projects_rx) = channel::<ProjectsSignal>();
    let _ = spawn_project_resolver(project_records, PROJECT_RESOLVE_DELAY, projects_tx.clone());

    let watcher = match watch_dataset(dataset_path) {
        Ok(watcher) => Some(watcher),
        Err(error) => {
            model.notice = Some(format!("Auto-reload disabled: {error} (Ctrl+R to reload)"));
            None
        }
    };

    loop {
        if let Some(watcher) = &watcher {
            let mut changed = false;
            while let Some(signal) = watcher.try_recv() {
                match signal {
                    WatchSignal::Changed => changed = true,
                    WatchSignal::Error(error) => {
                        model.notice = Some(format!("Watch error: {error}"));
                    }
                }
            }
            if changed {
                reload(model, dataset_path, &projects_tx);
            }
        }

        while let Ok(ProjectsSignal::Resolved(projects)) = projects_rx.try_recv() {
            model.apply_projects(projects);
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let (next, command) = app::update(model.clone(), AppEvent::Key(key));
                    *model = next;
                    match command {
                        AppCommand::None => {}
                        AppCommand::Quit => return Ok(()),
                        AppCommand::Reload => {
                            reload(model, dataset_path, &projects_tx);
                            model.notice = Some("Dataset reloaded".to_string());
                        }
                        AppCommand::CopyEventId(id) => {
                            copy_to_clipboard(model, &id);
                        }
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }
}

fn reload(model: &mut AppModel, dataset_path: &Path, projects_tx: &Sender<ProjectsSignal>) {
    let (data, project_records) = load_data(dataset_path);
    *model = model.with_data(data);
    let _ = spawn_project_resolver(project_records, PROJECT_RESOLVE_DELAY, projects_tx.clone());
}

fn copy_to_clipboard(model: &mut AppModel, id: &str) {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(id.to_string())) {
        Ok(()) => model.notice = Some(format!("Copied event id {id}")),
        Err(error) => model.notice = Some(format!("Clipboard unavailable: {error}")),
    }
}
