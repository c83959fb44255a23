use crate::hub::{ContextHub, ContextId, WireMessage};
use serde_json::Value;
use std::sync::Arc;
use tabcast_events::{EventCore, EventSubscription};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Best-effort delivery of a message to execution contexts other than the
/// sender's, with a same-context fallback.
///
/// Path exclusivity: a given message reaches a given subscriber via exactly
/// one path. The shared channel delivers only to *other* contexts (the
/// receive pump filters the sender's own origin, since the underlying
/// broadcast channel echoes to everyone), and the fallback delivers only
/// within the sending context. Subscribers therefore need no deduplication.
///
/// `send` is fire-and-forget: it returns immediately, never blocks, and
/// never surfaces an error. Shared-channel failures degrade to
/// same-context-only delivery.
pub trait CrossContextTransport: Send + Sync {
    fn send(&self, channel: &str, message: Value);

    /// Attaches `on_message` to both delivery paths so the subscription
    /// observes a message regardless of which path carried it.
    fn subscribe(&self, channel: &str, on_message: MessageHandler) -> TransportSubscription;
}

/// Disposer for a transport subscription.
///
/// Releases the shared-channel receiver (stopping its pump task) and the
/// same-context listener. Dropping without unsubscribing leaks the
/// same-context registration until the owning transport is torn down.
pub struct TransportSubscription {
    shared_task: Option<JoinHandle<()>>,
    local: Option<EventSubscription>,
}

impl TransportSubscription {
    fn inert() -> Self {
        Self {
            shared_task: None,
            local: None,
        }
    }

    pub fn unsubscribe(self) {
        if let Some(task) = self.shared_task {
            task.abort();
        }
        if let Some(local) = self.local {
            local.unsubscribe();
        }
    }
}

/// Shared-channel-backed transport for interactive environments.
///
/// Requires a tokio runtime: each subscription pumps its shared-channel
/// receiver on a spawned task. Hosts without a runtime (or without any
/// cross-context capability) should pick [`LocalTransport`] or
/// [`NullTransport`] instead.
pub struct SharedChannelTransport {
    hub: Arc<ContextHub>,
    context_id: ContextId,
    local: EventCore,
}

impl SharedChannelTransport {
    pub fn new(hub: Arc<ContextHub>) -> Self {
        Self {
            hub,
            context_id: ContextId::new(),
            local: EventCore::new(),
        }
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }
}

impl CrossContextTransport for SharedChannelTransport {
    fn send(&self, channel: &str, message: Value) {
        let wire = WireMessage {
            origin: self.context_id,
            payload: message.clone(),
        };
        match self.hub.try_publish(channel, wire) {
            Ok(delivered) => {
                tracing::trace!(channel, delivered, "published to shared channel");
            }
            Err(e) => {
                tracing::debug!(channel, error = %e, "shared channel unavailable, same-context delivery only");
            }
        }

        // The shared channel never serves the sender's own context, so the
        // fallback emit is the only way same-context listeners see this.
        self.local.emit(channel, &message);
    }

    fn subscribe(&self, channel: &str, on_message: MessageHandler) -> TransportSubscription {
        let fallback = Arc::clone(&on_message);
        let local = self.local.on(channel, move |payload| fallback(payload));

        let mut receiver = self.hub.attach(channel);
        let own = self.context_id;
        let channel_name = channel.to_string();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if message.origin == own {
                            // Own broadcasts arrive through the fallback path.
                            continue;
                        }
                        on_message(&message.payload);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!(channel = %channel_name, "shared channel closed, stopping receive pump");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(channel = %channel_name, missed = n, "shared channel subscriber lagged");
                    }
                }
            }
        });

        TransportSubscription {
            shared_task: Some(task),
            local: Some(local),
        }
    }
}

/// Same-context-only transport for environments without cross-context
/// messaging (tests, server-side rendering).
#[derive(Clone, Default)]
pub struct LocalTransport {
    local: EventCore,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CrossContextTransport for LocalTransport {
    fn send(&self, channel: &str, message: Value) {
        self.local.emit(channel, &message);
    }

    fn subscribe(&self, channel: &str, on_message: MessageHandler) -> TransportSubscription {
        let local = self.local.on(channel, move |payload| on_message(payload));
        TransportSubscription {
            shared_task: None,
            local: Some(local),
        }
    }
}

/// No-op transport for headless environments; subscriptions are inert.
#[derive(Clone, Copy, Default)]
pub struct NullTransport;

impl CrossContextTransport for NullTransport {
    fn send(&self, channel: &str, _message: Value) {
        tracing::trace!(channel, "null transport dropped message");
    }

    fn subscribe(&self, _channel: &str, _on_message: MessageHandler) -> TransportSubscription {
        TransportSubscription::inert()
    }
}
