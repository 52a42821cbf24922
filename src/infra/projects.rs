use crate::domain::ProjectRecord;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Outcome of the background slug→project resolution.
#[derive(Clone, Debug)]
pub enum ProjectsSignal {
    Resolved(Vec<ProjectRecord>),
}

/// Resolves the dataset's project records off the UI thread and posts the
/// result back over `tx`.
///
/// Project resolution is asynchronous from the grid's point of view:
/// renderers see a loading lookup and degrade to slug badges until the
/// signal lands. `delay` exists so the TUI behaves like it would against a
/// remote project store; the CLI passes zero.
pub fn spawn_project_resolver(
    projects: Vec<ProjectRecord>,
    delay: Duration,
    tx: Sender<ProjectsSignal>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let _ = tx.send(ProjectsSignal::Resolved(projects));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn resolver_delivers_projects_over_the_channel() {
        let (tx, rx) = channel();
        let handle = spawn_project_resolver(
            vec![ProjectRecord {
                id: 1,
                slug: "backend".to_string(),
                platform: None,
            }],
            Duration::ZERO,
            tx,
        );
        handle.join().unwrap();

        let ProjectsSignal::Resolved(projects) = rx.recv().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].slug, "backend");
    }
}
