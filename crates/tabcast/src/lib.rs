//! Best-effort, same-origin, advisory state synchronization across
//! execution contexts.
//!
//! Three pieces, smallest first:
//!
//! - [`EventCore`] — synchronous in-process publish/subscribe with
//!   per-handler fault isolation.
//! - [`CrossContextBus`] — broadcasts state patches to other contexts over
//!   a [`CrossContextTransport`], with a same-context fallback path so a
//!   single subscription sees a patch no matter which path carried it.
//! - [`AccessGateTracker`] — clears a session-scoped access flag when
//!   navigation leaves a protected section.
//!
//! None of this is a durable message bus: no delivery guarantee, no
//! cross-context ordering, no replay. Consumers treat broadcasts as hints
//! and re-query their authoritative source when in doubt.

pub use tabcast_bus::{
    ContextHub, ContextId, CrossContextBus, CrossContextTransport, LocalTransport, MessageHandler,
    NullTransport, PatchEnvelope, PatchSubscription, SharedChannelTransport, SubjectId,
    TransportError, TransportSubscription, PATCH_CHANNEL, PATCH_MESSAGE_TYPE,
};
pub use tabcast_events::{EventCore, EventHandler, EventSubscription};
pub use tabcast_gate::{AccessGateTracker, GateState, MemorySessionStore, Section, SessionStore};
