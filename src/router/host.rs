//! Host navigation facility.
//!
//! The router writes locations through [`NavigationHost`] and never inspects
//! history beyond the current entry. [`MemoryHistory`] is the session
//! history used by the CLI and tests.

use parking_lot::Mutex;

/// Current location plus a back/forward history stack.
pub trait NavigationHost: Send + Sync {
    /// Path of the current entry.
    fn current_path(&self) -> String;

    /// Add a new entry and make it current, discarding forward entries.
    fn push(&self, path: &str, state: Option<serde_json::Value>);

    /// Overwrite the current entry.
    fn replace(&self, path: &str, state: Option<serde_json::Value>);

    /// Step back. Returns `false` at the start of history.
    fn back(&self) -> bool;

    /// Step forward. Returns `false` at the end of history.
    fn forward(&self) -> bool;
}

/// A single history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Full path including any base path
    pub path: String,
    /// Opaque state stored with the entry
    pub state: Option<serde_json::Value>,
}

#[derive(Debug)]
struct HistoryStack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// In-memory session history.
#[derive(Debug)]
pub struct MemoryHistory {
    stack: Mutex<HistoryStack>,
}

impl MemoryHistory {
    /// Start a session at `initial_path`.
    pub fn new(initial_path: impl Into<String>) -> Self {
        let entry = HistoryEntry { path: initial_path.into(), state: None };
        Self { stack: Mutex::new(HistoryStack { entries: vec![entry], index: 0 }) }
    }

    /// Number of entries in the session.
    pub fn len(&self) -> usize {
        self.stack.lock().entries.len()
    }

    /// Whether the session has no entries (never true in practice).
    pub fn is_empty(&self) -> bool {
        self.stack.lock().entries.is_empty()
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.stack.lock().index
    }

    /// Copy of all entries.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.stack.lock().entries.clone()
    }

    /// The current entry.
    pub fn current(&self) -> HistoryEntry {
        let stack = self.stack.lock();
        stack.entries[stack.index].clone()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl NavigationHost for MemoryHistory {
    fn current_path(&self) -> String {
        let stack = self.stack.lock();
        stack.entries[stack.index].path.clone()
    }

    fn push(&self, path: &str, state: Option<serde_json::Value>) {
        let mut stack = self.stack.lock();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry { path: path.to_string(), state });
        stack.index = stack.entries.len() - 1;
    }

    fn replace(&self, path: &str, state: Option<serde_json::Value>) {
        let mut stack = self.stack.lock();
        let index = stack.index;
        stack.entries[index] = HistoryEntry { path: path.to_string(), state };
    }

    fn back(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.index == 0 {
            return false;
        }
        stack.index -= 1;
        true
    }

    fn forward(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.index + 1 >= stack.entries.len() {
            return false;
        }
        stack.index += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_traverse() {
        let history = MemoryHistory::new("/");
        history.push("/projects/a", None);
        history.push("/projects/b", None);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_path(), "/projects/b");

        assert!(history.back());
        assert_eq!(history.current_path(), "/projects/a");
        assert!(history.back());
        assert!(!history.back());
        assert_eq!(history.current_path(), "/");

        assert!(history.forward());
        assert_eq!(history.current_path(), "/projects/a");
    }

    #[test]
    fn test_push_discards_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push("/a", None);
        history.push("/b", None);
        history.back();
        history.push("/c", None);

        let paths: Vec<_> = history.entries().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/", "/a", "/c"]);
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let history = MemoryHistory::new("/start");
        history.replace("/", Some(serde_json::json!({ "from": "start" })));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().path, "/");
        assert_eq!(history.current().state, Some(serde_json::json!({ "from": "start" })));
    }
}
