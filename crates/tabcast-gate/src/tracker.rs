use crate::store::SessionStore;
use std::sync::Arc;

/// A protected section of the application: a flag name plus the path prefix
/// that defines membership.
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    path_prefix: String,
}

impl Section {
    pub fn new(name: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        let path_prefix = path_prefix.into();
        Self {
            name: name.into(),
            path_prefix: path_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Segment-aware membership: `/facilitator` contains `/facilitator` and
    /// `/facilitator/lessons`, but not `/facilitators`.
    pub fn contains(&self, path: &str) -> bool {
        match path.strip_prefix(&self.path_prefix) {
            Some("") | Some("/") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Inside,
    Outside,
}

/// Revokes a section's access flag when navigation leaves the section.
///
/// Only the Inside→Outside boundary crossing mutates the flag. Granting is
/// the access-grant flow's job; moving between two pages inside the section
/// never touches the flag, and the clear is idempotent.
pub struct AccessGateTracker {
    section: Section,
    store: Arc<dyn SessionStore>,
}

impl AccessGateTracker {
    pub fn new(section: Section, store: Arc<dyn SessionStore>) -> Self {
        Self { section, store }
    }

    pub fn classify(&self, path: &str) -> GateState {
        if self.section.contains(path) {
            GateState::Inside
        } else {
            GateState::Outside
        }
    }

    /// Entry point for the host's navigation observer. Compares section
    /// membership of the two paths, never path equality.
    pub fn on_navigation_change(&self, previous_path: &str, current_path: &str) {
        let previous = self.classify(previous_path);
        let current = self.classify(current_path);

        if previous == GateState::Inside && current == GateState::Outside {
            tracing::debug!(
                section = self.section.name(),
                from = previous_path,
                to = current_path,
                "left protected section, revoking access flag"
            );
            self.store.clear_flag(self.section.name());
        }
    }
}
