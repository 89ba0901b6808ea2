/// Navigation seam
///
/// The session layer decides where the user should go (login page after a
/// failed refresh, home after logout). The embedding shell performs the
/// actual navigation by implementing [`Navigator`].

use std::sync::Mutex;

pub trait Navigator: Send + Sync {
    /// Full navigation to `path`, discarding in-memory page state.
    fn navigate(&self, path: &str);

    /// Replace the current route without adding a history entry.
    fn replace(&self, path: &str) {
        self.navigate(path);
    }
}

/// How a destination was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Navigate,
    Replace,
}

/// Navigator that records every destination and logs it.
/// Used by the headless driver and by tests.
#[derive(Default)]
pub struct NavigationHistory {
    entries: Mutex<Vec<(NavigationKind, String)>>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent destination
    pub fn current(&self) -> Option<String> {
        self.entries().last().map(|(_, path)| path.clone())
    }

    pub fn entries(&self) -> Vec<(NavigationKind, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn record(&self, kind: NavigationKind, path: &str) {
        tracing::info!(path = path, kind = ?kind, "Navigating");
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((kind, path.to_string()));
        }
    }
}

impl Navigator for NavigationHistory {
    fn navigate(&self, path: &str) {
        self.record(NavigationKind::Navigate, path);
    }

    fn replace(&self, path: &str) {
        self.record(NavigationKind::Replace, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_in_order() {
        let history = NavigationHistory::new();
        assert!(history.current().is_none());

        history.replace("/login");
        history.navigate("/");

        assert_eq!(history.current().as_deref(), Some("/"));
        assert_eq!(
            history.entries(),
            vec![
                (NavigationKind::Replace, "/login".to_string()),
                (NavigationKind::Navigate, "/".to_string()),
            ]
        );
    }
}
