mod thread_selector;

use crate::domain::{
    MetaTypes, Organization, ProjectLookup, ProjectRecord, get_sort_field,
};
use crate::infra::DatasetEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub use thread_selector::{MAX_VISIBLE_THREADS, ThreadSelectorState, ThreadSelectorUpdate};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ResolveDatasetPath(#[from] crate::infra::ResolveDatasetPathError),
}

/// Everything loaded from the dataset plus the project lookup's current
/// state.
#[derive(Clone, Debug)]
pub struct AppData {
    pub dataset_path: PathBuf,
    pub organization: Organization,
    pub fields: Vec<String>,
    pub meta: MetaTypes,
    pub events: Vec<DatasetEvent>,
    pub projects: ProjectLookup,
    pub load_error: Option<String>,
}

impl AppData {
    pub fn from_dataset(dataset_path: PathBuf, dataset: crate::infra::Dataset) -> Self {
        Self {
            dataset_path,
            organization: dataset.organization,
            fields: dataset.fields,
            meta: dataset.meta,
            events: dataset.events,
            projects: ProjectLookup::loading(),
            load_error: None,
        }
    }

    pub fn from_error(dataset_path: PathBuf, error: String) -> Self {
        Self {
            dataset_path,
            organization: Organization {
                slug: String::new(),
            },
            fields: Vec::new(),
            meta: MetaTypes::new(),
            events: Vec::new(),
            projects: ProjectLookup::default(),
            load_error: Some(error),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GridSort {
    /// Column the user sorted on.
    pub field: String,
    /// Resolved sort key (may differ from the column, e.g. `issue.id`).
    pub sort_key: String,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GridView {
    pub selected_row: usize,
    pub selected_col: usize,
    pub sort: Option<GridSort>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum View {
    Grid(GridView),
    Error,
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: AppData,
    pub view: View,
    pub notice: Option<String>,
    pub help_open: bool,
    pub thread_selector: Option<ThreadSelectorState>,
    /// Chosen thread per event id, kept across selector reopens.
    pub active_threads: BTreeMap<String, u64>,
}

impl AppModel {
    pub fn new(data: AppData) -> Self {
        let view = if data.load_error.is_some() {
            View::Error
        } else {
            View::Grid(GridView::default())
        };
        Self {
            data,
            view,
            notice: None,
            help_open: false,
            thread_selector: None,
            active_threads: BTreeMap::new(),
        }
    }

    /// Carries the old view state onto freshly loaded data, clamping the
    /// selection to the new bounds.
    pub fn with_data(&self, data: AppData) -> Self {
        let view = if data.load_error.is_some() {
            View::Error
        } else {
            match &self.view {
                View::Grid(grid) => {
                    let mut next = grid.clone();
                    next.selected_row = next
                        .selected_row
                        .min(data.events.len().saturating_sub(1));
                    next.selected_col = next
                        .selected_col
                        .min(data.fields.len().saturating_sub(1));
                    View::Grid(next)
                }
                View::Error => View::Grid(GridView::default()),
            }
        };
        Self {
            data,
            view,
            notice: None,
            help_open: self.help_open,
            thread_selector: None,
            active_threads: self.active_threads.clone(),
        }
    }

    pub fn apply_projects(&mut self, projects: Vec<ProjectRecord>) {
        self.data.projects = ProjectLookup::resolved(projects);
    }

    /// Event indices in display order, honoring the current sort.
    pub fn row_order(&self) -> Vec<usize> {
        let View::Grid(grid) = &self.view else {
            return Vec::new();
        };
        let mut order: Vec<usize> = (0..self.data.events.len()).collect();
        if let Some(sort) = &grid.sort {
            order.sort_by(|&a, &b| {
                let left = self.data.events[a].data.get(&sort.sort_key);
                let right = self.data.events[b].data.get(&sort.sort_key);
                let ordering = compare_values(left, right);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        order
    }

    pub fn selected_event(&self) -> Option<&DatasetEvent> {
        let View::Grid(grid) = &self.view else {
            return None;
        };
        let order = self.row_order();
        order
            .get(grid.selected_row)
            .and_then(|&index| self.data.events.get(index))
    }

    pub fn selected_field(&self) -> Option<&str> {
        let View::Grid(grid) = &self.view else {
            return None;
        };
        self.data.fields.get(grid.selected_col).map(String::as_str)
    }

    pub fn active_thread_for(&self, event_id: &str) -> Option<u64> {
        self.active_threads.get(event_id).copied()
    }
}

/// Raw-value ordering for sorting: numbers numerically, strings lexically,
/// absent values last.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => value_sort_text(left).cmp(&value_sort_text(right)),
        },
    }
}

fn value_sort_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Reload,
    CopyEventId(String),
}

pub fn update(mut model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    let AppEvent::Key(key) = event;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return (model, AppCommand::Quit);
    }
    if ctrl && key.code == KeyCode::Char('r') {
        return (model, AppCommand::Reload);
    }

    // Overlays swallow keys before the grid sees them.
    if let Some(selector) = &mut model.thread_selector {
        match selector.handle_key(key) {
            ThreadSelectorUpdate::Stay => {}
            ThreadSelectorUpdate::Close => model.thread_selector = None,
            ThreadSelectorUpdate::Pick(thread_id) => {
                let event_id = selector.event_id.clone();
                model.active_threads.insert(event_id, thread_id);
                model.thread_selector = None;
                model.notice = Some(format!("Active thread set to #{thread_id}"));
            }
        }
        return (model, AppCommand::None);
    }

    if model.help_open {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?')) {
            model.help_open = false;
        }
        return (model, AppCommand::None);
    }

    match key.code {
        KeyCode::F(1) | KeyCode::Char('?') => {
            model.help_open = true;
            (model, AppCommand::None)
        }
        KeyCode::Char('q') => (model, AppCommand::Quit),
        _ => match &model.view {
            View::Grid(_) => update_grid(model, key),
            View::Error => update_error(model, key),
        },
    }
}

fn update_error(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => (model, AppCommand::Quit),
        _ => (model, AppCommand::None),
    }
}

fn update_grid(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let row_count = model.data.events.len();
    let col_count = model.data.fields.len();

    let View::Grid(grid) = &mut model.view else {
        return (model, AppCommand::None);
    };

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            grid.selected_row = grid.selected_row.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if grid.selected_row + 1 < row_count {
                grid.selected_row += 1;
            }
        }
        KeyCode::Left | KeyCode::Char('h') => {
            grid.selected_col = grid.selected_col.saturating_sub(1);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if grid.selected_col + 1 < col_count {
                grid.selected_col += 1;
            }
        }
        KeyCode::Home => grid.selected_row = 0,
        KeyCode::End => grid.selected_row = row_count.saturating_sub(1),
        KeyCode::Char('s') => {
            let Some(field) = model.data.fields.get(grid.selected_col).cloned() else {
                return (model, AppCommand::None);
            };
            match get_sort_field(&field, Some(&model.data.meta)) {
                Some(sort_key) => {
                    let direction = match &grid.sort {
                        Some(current) if current.field == field => current.direction.toggle(),
                        _ => SortDirection::Ascending,
                    };
                    grid.sort = Some(GridSort {
                        field: field.clone(),
                        sort_key,
                        direction,
                    });
                    grid.selected_row = 0;
                }
                None => {
                    model.notice = Some(format!("Column '{field}' is not sortable"));
                }
            }
        }
        KeyCode::Char('y') => {
            let id = model
                .selected_event()
                .and_then(|event| event.data.text("id"))
                .map(str::to_string);
            return match id {
                Some(id) => (model, AppCommand::CopyEventId(id)),
                None => {
                    model.notice = Some("Selected event has no id to copy".to_string());
                    (model, AppCommand::None)
                }
            };
        }
        KeyCode::Char('t') | KeyCode::Enter => {
            let selected = model.selected_event().map(|event| {
                let event_id = event
                    .data
                    .text("id")
                    .map_or_else(|| "<unknown>".to_string(), str::to_string);
                (event_id, event.detail.clone())
            });
            match selected {
                Some((_, detail)) if detail.threads.is_empty() => {
                    model.notice = Some("Selected event has no threads".to_string());
                }
                Some((event_id, detail)) => {
                    let active = model.active_thread_for(&event_id);
                    model.thread_selector =
                        Some(ThreadSelectorState::open(event_id, &detail, active));
                }
                None => {}
            }
        }
        _ => {}
    }

    (model, AppCommand::None)
}
