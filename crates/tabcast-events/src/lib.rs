mod core;

pub use self::core::{EventCore, EventHandler, EventSubscription};
