use parking_lot::RwLock;
use std::collections::HashMap;

/// Boolean access flags keyed by section name.
///
/// Flags are advisory (a UX gate, not a security boundary): writes are
/// last-write-wins and clearing an absent flag is a no-op. Implementations
/// scope their storage to the current session, so flags disappear with it.
pub trait SessionStore: Send + Sync {
    fn set_flag(&self, section: &str, value: bool);

    /// Absent flags read as `false`.
    fn flag(&self, section: &str) -> bool;

    fn clear_flag(&self, section: &str);
}

/// In-memory store owned by the host's session object; dropping the session
/// drops every flag with it.
#[derive(Default)]
pub struct MemorySessionStore {
    flags: RwLock<HashMap<String, bool>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn set_flag(&self, section: &str, value: bool) {
        self.flags.write().insert(section.to_string(), value);
    }

    fn flag(&self, section: &str) -> bool {
        self.flags.read().get(section).copied().unwrap_or(false)
    }

    fn clear_flag(&self, section: &str) {
        self.flags.write().remove(section);
    }
}
