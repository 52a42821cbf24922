use crate::domain::{EventDetail, Thread};

/// One entry of the thread-selector dropdown, rebuilt per render pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DropdownEntry {
    pub thread_id: u64,
    pub label: String,
    pub info: Option<String>,
    /// Exception summary, present only for crashed threads.
    pub exception: Option<String>,
    pub crashed: bool,
    pub current: bool,
    /// Lowercased haystack the search filter matches against.
    pub filter_text: String,
}

impl DropdownEntry {
    pub fn matches(&self, filter: &str) -> bool {
        filter.is_empty() || self.filter_text.contains(&filter.to_lowercase())
    }
}

pub fn thread_label(thread: &Thread) -> String {
    match thread.name.as_deref() {
        Some(name) if !name.is_empty() => format!("#{}: {}", thread.id, name),
        _ => format!("#{}: <unnamed>", thread.id),
    }
}

/// Keeps the last two path components so deep build paths stay readable.
pub fn trim_filename(filename: &str) -> String {
    let parts: Vec<&str> = filename.split('/').filter(|part| !part.is_empty()).collect();
    match parts.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [.., parent, file] => format!("{parent}/{file}"),
    }
}

/// Where the thread currently is: top frame function plus trimmed filename.
pub fn thread_info(thread: &Thread) -> Option<String> {
    let frame = thread.frame.as_ref()?;
    match (frame.function.as_deref(), frame.filename.as_deref()) {
        (Some(function), Some(filename)) => {
            Some(format!("{function} ({})", trim_filename(filename)))
        }
        (Some(function), None) => Some(function.to_string()),
        (None, Some(filename)) => Some(trim_filename(filename)),
        (None, None) => None,
    }
}

/// Exception summary for a crashed thread, from the event's exception
/// values. Non-crashed threads never show one.
pub fn thread_exception(detail: &EventDetail, thread: &Thread) -> Option<String> {
    if !thread.crashed {
        return None;
    }
    detail
        .exceptions
        .iter()
        .find(|exception| exception.thread_id == Some(thread.id))
        .map(|exception| match exception.value.as_deref() {
            Some(value) if !value.is_empty() => format!("{}: {value}", exception.kind),
            _ => exception.kind.clone(),
        })
}

/// Builds the dropdown entries for every thread on the event.
pub fn dropdown_entries(detail: &EventDetail) -> Vec<DropdownEntry> {
    detail
        .threads
        .iter()
        .map(|thread| {
            let label = thread_label(thread);
            let info = thread_info(thread);
            let exception = thread_exception(detail, thread);

            let mut filter_text = label.clone();
            if let Some(info) = &info {
                filter_text.push(' ');
                filter_text.push_str(info);
            }
            if let Some(exception) = &exception {
                filter_text.push(' ');
                filter_text.push_str(exception);
            }

            DropdownEntry {
                thread_id: thread.id,
                label,
                info,
                exception,
                crashed: thread.crashed,
                current: thread.current,
                filter_text: filter_text.to_lowercase(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExceptionValue, ThreadFrame};

    fn thread(id: u64, name: Option<&str>, crashed: bool) -> Thread {
        Thread {
            id,
            name: name.map(str::to_string),
            crashed,
            current: false,
            frame: None,
        }
    }

    #[test]
    fn labels_carry_id_and_name() {
        assert_eq!(thread_label(&thread(7, Some("worker"), false)), "#7: worker");
        assert_eq!(thread_label(&thread(7, None, false)), "#7: <unnamed>");
        assert_eq!(thread_label(&thread(7, Some(""), false)), "#7: <unnamed>");
    }

    #[test]
    fn trims_filenames_to_two_components() {
        assert_eq!(trim_filename("/app/src/api/views.py"), "api/views.py");
        assert_eq!(trim_filename("views.py"), "views.py");
        assert_eq!(trim_filename(""), "");
    }

    #[test]
    fn thread_info_combines_function_and_filename() {
        let mut thread = thread(1, Some("main"), false);
        thread.frame = Some(ThreadFrame {
            function: Some("handle_request".to_string()),
            filename: Some("/app/src/api/views.py".to_string()),
        });
        assert_eq!(
            thread_info(&thread),
            Some("handle_request (api/views.py)".to_string())
        );
    }

    #[test]
    fn exception_shown_only_for_crashed_threads() {
        let detail = EventDetail {
            threads: vec![thread(1, Some("main"), true), thread(2, Some("io"), false)],
            exceptions: vec![
                ExceptionValue {
                    thread_id: Some(1),
                    kind: "ValueError".to_string(),
                    value: Some("bad input".to_string()),
                },
                ExceptionValue {
                    thread_id: Some(2),
                    kind: "Ignored".to_string(),
                    value: None,
                },
            ],
        };
        assert_eq!(
            thread_exception(&detail, &detail.threads[0]),
            Some("ValueError: bad input".to_string())
        );
        assert_eq!(thread_exception(&detail, &detail.threads[1]), None);
    }

    #[test]
    fn entries_filter_on_every_derived_part() {
        let mut crashed = thread(1, Some("main"), true);
        crashed.frame = Some(ThreadFrame {
            function: Some("render".to_string()),
            filename: Some("ui/grid.rs".to_string()),
        });
        let detail = EventDetail {
            threads: vec![crashed, thread(2, Some("io"), false)],
            exceptions: vec![ExceptionValue {
                thread_id: Some(1),
                kind: "PanicError".to_string(),
                value: None,
            }],
        };

        let entries = dropdown_entries(&detail);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].matches("panicerror"));
        assert!(entries[0].matches("grid.rs"));
        assert!(entries[0].matches(""));
        assert!(!entries[1].matches("panic"));
        assert!(entries[1].matches("IO"));
    }
}
