use crate::error::TransportError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Identity of one execution context (one "tab").
///
/// Used by the shared-channel receive path to filter out a context's own
/// broadcasts, since the underlying broadcast channel echoes to every
/// attached receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WireMessage {
    pub origin: ContextId,
    pub payload: Value,
}

/// Registry of named shared channels reachable by a set of contexts.
///
/// One hub corresponds to one origin: every transport constructed over the
/// same hub can broadcast to the others. The hub is explicitly constructed
/// and owned by the host; it is not a process-wide singleton.
pub struct ContextHub {
    channels: RwLock<HashMap<String, broadcast::Sender<WireMessage>>>,
    capacity: usize,
}

impl ContextHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Attaches a receiver to `channel`, creating the channel on first use.
    pub(crate) fn attach(&self, channel: &str) -> broadcast::Receiver<WireMessage> {
        let mut channels = self.channels.write();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publishes onto `channel`, returning how many receivers got the message.
    ///
    /// A channel whose receivers have all detached is pruned here so that
    /// repeated broadcasts do not accumulate dead senders.
    pub(crate) fn try_publish(
        &self,
        channel: &str,
        message: WireMessage,
    ) -> Result<usize, TransportError> {
        let mut channels = self.channels.write();
        let Some(sender) = channels.get(channel) else {
            return Err(TransportError::NoReceivers(channel.to_string()));
        };

        if sender.receiver_count() == 0 {
            channels.remove(channel);
            return Err(TransportError::NoReceivers(channel.to_string()));
        }

        sender
            .send(message)
            .map_err(|_| TransportError::ChannelClosed)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}

impl Default for ContextHub {
    fn default() -> Self {
        Self::new()
    }
}
