use notify::event::EventKind;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{Receiver, channel};
use thiserror::Error;

#[derive(Clone, Debug)]
pub enum WatchSignal {
    Changed,
    Error(String),
}

#[derive(Debug)]
pub struct DatasetWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<WatchSignal>,
}

impl DatasetWatcher {
    pub fn try_recv(&self) -> Option<WatchSignal> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, Error)]
pub enum WatchDatasetError {
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// Watches the dataset file's parent directory (editors replace the file
/// on save, which unregisters a file-level watch) and signals when the
/// dataset itself changes.
pub fn watch_dataset(path: &Path) -> Result<DatasetWatcher, WatchDatasetError> {
    let (tx, rx) = channel::<WatchSignal>();

    let file_name = path.file_name().map(|name| name.to_os_string());
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                if should_trigger_reload(&event, file_name.as_deref()) {
                    let _ = tx.send(WatchSignal::Changed);
                }
            }
            Err(error) => {
                let _ = tx.send(WatchSignal::Error(error.to_string()));
            }
        },
        Config::default(),
    )?;

    let watch_root = path.parent().unwrap_or(path);
    watcher.watch(watch_root, RecursiveMode::NonRecursive)?;

    Ok(DatasetWatcher {
        _watcher: watcher,
        rx,
    })
}

fn should_trigger_reload(event: &notify::Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    if event.paths.is_empty() {
        return true;
    }

    event
        .paths
        .iter()
        .any(|path| path.file_name() == file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind};
    use std::path::PathBuf;

    #[test]
    fn access_events_never_trigger_a_reload() {
        let event = notify::Event::new(EventKind::Access(AccessKind::Read))
            .add_path(PathBuf::from("/data/events.json"));
        assert!(!should_trigger_reload(
            &event,
            Some(std::ffi::OsStr::new("events.json"))
        ));
    }

    #[test]
    fn modifications_to_other_files_are_ignored() {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/data/other.json"));
        assert!(!should_trigger_reload(
            &event,
            Some(std::ffi::OsStr::new("events.json"))
        ));

        let matching = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/data/events.json"));
        assert!(should_trigger_reload(
            &matching,
            Some(std::ffi::OsStr::new("events.json"))
        ));
    }
}
