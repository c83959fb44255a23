use crate::envelope::{PatchEnvelope, SubjectId, PATCH_CHANNEL};
use crate::hub::ContextHub;
use crate::transport::{
    CrossContextTransport, LocalTransport, NullTransport, SharedChannelTransport,
    TransportSubscription,
};
use serde_json::Value;
use std::sync::Arc;

/// Typed convenience layer over a [`CrossContextTransport`]: fixed channel,
/// fixed envelope, degrade-not-throw everywhere.
#[derive(Clone)]
pub struct CrossContextBus {
    transport: Arc<dyn CrossContextTransport>,
}

impl CrossContextBus {
    pub fn new(transport: Arc<dyn CrossContextTransport>) -> Self {
        Self { transport }
    }

    /// Bus over a shared hub; broadcasts reach the other contexts attached
    /// to the same hub plus this context's own subscribers.
    pub fn shared(hub: Arc<ContextHub>) -> Self {
        Self::new(Arc::new(SharedChannelTransport::new(hub)))
    }

    /// Same-context-only bus for environments without cross-context
    /// messaging.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalTransport::new()))
    }

    /// Fully inert bus for headless environments.
    pub fn disconnected() -> Self {
        Self::new(Arc::new(NullTransport))
    }

    /// Broadcasts a state patch for `subject_id`. Inputs are normalized
    /// (string-coerced id, object-coerced patch); never errors.
    pub fn broadcast_patch(&self, subject_id: impl Into<SubjectId>, patch: Value) {
        let envelope = PatchEnvelope::new(subject_id, patch);
        match serde_json::to_value(&envelope) {
            Ok(message) => self.transport.send(PATCH_CHANNEL, message),
            Err(e) => tracing::debug!(error = %e, "failed to encode patch envelope"),
        }
    }

    /// Subscribes `handler` to state patches from any delivery path.
    /// Messages on the channel that are not well-formed state patches are
    /// ignored, not forwarded.
    pub fn subscribe_patches<F>(&self, handler: F) -> PatchSubscription
    where
        F: Fn(PatchEnvelope) + Send + Sync + 'static,
    {
        let inner = self.transport.subscribe(
            PATCH_CHANNEL,
            Arc::new(move |message: &Value| {
                match serde_json::from_value::<PatchEnvelope>(message.clone()) {
                    Ok(envelope) if envelope.is_state_patch() => handler(envelope),
                    Ok(envelope) => {
                        tracing::trace!(kind = %envelope.kind, "ignoring message with foreign type tag");
                    }
                    Err(_) => {
                        tracing::trace!("ignoring malformed message on patch channel");
                    }
                }
            }),
        );

        PatchSubscription { inner }
    }
}

/// Disposer for a [`CrossContextBus::subscribe_patches`] registration.
pub struct PatchSubscription {
    inner: TransportSubscription,
}

impl PatchSubscription {
    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
