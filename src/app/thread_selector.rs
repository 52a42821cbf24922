use crate::domain::{DropdownEntry, EventDetail, dropdown_entries};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const MAX_VISIBLE_THREADS: usize = 10;

/// Searchable dropdown over one event's stack-trace threads.
///
/// Holds only view state (selection, scroll, filter); entries are derived
/// once on open and owned here. Picking an entry is reported to the owner
/// through [`ThreadSelectorUpdate::Pick`]; nothing else escapes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadSelectorState {
    pub event_id: String,
    pub entries: Vec<DropdownEntry>,
    /// Shown as the current choice until a new selection is made.
    pub active_thread_id: Option<u64>,
    pub selected: usize,
    pub offset: usize,
    pub filter: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ThreadSelectorUpdate {
    Stay,
    Close,
    /// The owner's selection callback: the chosen thread id.
    Pick(u64),
}

impl ThreadSelectorState {
    pub fn open(event_id: String, detail: &EventDetail, active_thread_id: Option<u64>) -> Self {
        let entries = dropdown_entries(detail);
        let active = active_thread_id
            .or_else(|| entries.iter().find(|entry| entry.current).map(|e| e.thread_id));
        let selected = active
            .and_then(|id| entries.iter().position(|entry| entry.thread_id == id))
            .unwrap_or(0);

        let mut state = Self {
            event_id,
            entries,
            active_thread_id: active,
            selected,
            offset: 0,
            filter: String::new(),
        };
        state.scroll_into_view();
        state
    }

    pub fn visible_entries(&self) -> Vec<&DropdownEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(&self.filter))
            .collect()
    }

    pub fn selected_entry(&self) -> Option<&DropdownEntry> {
        self.visible_entries().get(self.selected).copied()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ThreadSelectorUpdate {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => ThreadSelectorUpdate::Close,
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                self.scroll_into_view();
                ThreadSelectorUpdate::Stay
            }
            KeyCode::Down => {
                let total = self.visible_entries().len();
                if self.selected + 1 < total {
                    self.selected += 1;
                }
                self.scroll_into_view();
                ThreadSelectorUpdate::Stay
            }
            KeyCode::Enter => match self.selected_entry() {
                Some(entry) => {
                    let picked = entry.thread_id;
                    self.active_thread_id = Some(picked);
                    ThreadSelectorUpdate::Pick(picked)
                }
                None => ThreadSelectorUpdate::Close,
            },
            KeyCode::Backspace => {
                self.filter.pop();
                self.clamp_selection();
                ThreadSelectorUpdate::Stay
            }
            KeyCode::Char('u') if ctrl => {
                self.filter.clear();
                self.clamp_selection();
                ThreadSelectorUpdate::Stay
            }
            KeyCode::Char(ch) if !ctrl => {
                self.filter.push(ch);
                self.clamp_selection();
                ThreadSelectorUpdate::Stay
            }
            _ => ThreadSelectorUpdate::Stay,
        }
    }

    fn visible_height(&self) -> usize {
        self.visible_entries().len().clamp(1, MAX_VISIBLE_THREADS)
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_entries().len();
        if count == 0 {
            self.selected = 0;
            self.offset = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
        self.scroll_into_view();
    }

    fn scroll_into_view(&mut self) {
        let height = self.visible_height();
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected - height + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExceptionValue, Thread, ThreadFrame};

    fn detail(count: u64) -> EventDetail {
        EventDetail {
            threads: (0..count)
                .map(|id| Thread {
                    id,
                    name: Some(format!("worker-{id}")),
                    crashed: id == 1,
                    current: id == 2,
                    frame: Some(ThreadFrame {
                        function: Some("run".to_string()),
                        filename: Some("src/worker.rs".to_string()),
                    }),
                })
                .collect(),
            exceptions: vec![ExceptionValue {
                thread_id: Some(1),
                kind: "SegFault".to_string(),
                value: None,
            }],
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn opens_on_the_current_thread() {
        let state = ThreadSelectorState::open("ev1".to_string(), &detail(4), None);
        assert_eq!(state.active_thread_id, Some(2));
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn explicit_active_thread_wins_over_current_flag() {
        let state = ThreadSelectorState::open("ev1".to_string(), &detail(4), Some(3));
        assert_eq!(state.selected, 3);
    }

    #[test]
    fn enter_reports_the_picked_thread() {
        let mut state = ThreadSelectorState::open("ev1".to_string(), &detail(3), None);
        state.handle_key(key(KeyCode::Up));
        let update = state.handle_key(key(KeyCode::Enter));
        assert_eq!(update, ThreadSelectorUpdate::Pick(1));
        assert_eq!(state.active_thread_id, Some(1));
    }

    #[test]
    fn escape_closes_without_selecting() {
        let mut state = ThreadSelectorState::open("ev1".to_string(), &detail(3), None);
        assert_eq!(state.handle_key(key(KeyCode::Esc)), ThreadSelectorUpdate::Close);
        assert_eq!(state.active_thread_id, Some(2));
    }

    #[test]
    fn typing_filters_and_clamps_the_selection() {
        let mut state = ThreadSelectorState::open("ev1".to_string(), &detail(4), Some(3));
        for ch in "segfault".chars() {
            state.handle_key(key(KeyCode::Char(ch)));
        }
        // Only the crashed thread's entry mentions the exception.
        let visible = state.visible_entries();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].thread_id, 1);
        assert_eq!(state.selected, 0);

        assert_eq!(state.handle_key(key(KeyCode::Enter)), ThreadSelectorUpdate::Pick(1));
    }

    #[test]
    fn filter_with_no_matches_keeps_enter_harmless() {
        let mut state = ThreadSelectorState::open("ev1".to_string(), &detail(2), None);
        for ch in "zzz".chars() {
            state.handle_key(key(KeyCode::Char(ch)));
        }
        assert!(state.visible_entries().is_empty());
        assert_eq!(state.handle_key(key(KeyCode::Enter)), ThreadSelectorUpdate::Close);
    }

    #[test]
    fn scrolling_tracks_the_selection_past_the_window() {
        let mut state = ThreadSelectorState::open("ev1".to_string(), &detail(15), Some(0));
        for _ in 0..12 {
            state.handle_key(key(KeyCode::Down));
        }
        assert_eq!(state.selected, 12);
        assert_eq!(state.offset, 3);

        for _ in 0..12 {
            state.handle_key(key(KeyCode::Up));
        }
        assert_eq!(state.selected, 0);
        assert_eq!(state.offset, 0);
    }
}
