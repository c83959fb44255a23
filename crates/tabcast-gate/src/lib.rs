mod store;
mod tracker;

pub use store::{MemorySessionStore, SessionStore};
pub use tracker::{AccessGateTracker, GateState, Section};
