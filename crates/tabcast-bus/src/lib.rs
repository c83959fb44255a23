mod bus;
mod envelope;
mod error;
mod hub;
mod transport;

pub use bus::{CrossContextBus, PatchSubscription};
pub use envelope::{PatchEnvelope, SubjectId, PATCH_CHANNEL, PATCH_MESSAGE_TYPE};
pub use error::TransportError;
pub use hub::{ContextHub, ContextId};
pub use transport::{
    CrossContextTransport, LocalTransport, MessageHandler, NullTransport, SharedChannelTransport,
    TransportSubscription,
};
