use thiserror::Error;

/// Internal failures of the shared-channel path.
///
/// These never surface to callers of the public send/subscribe operations;
/// the transport layer logs and degrades instead, so every call site gets
/// the same swallow-and-continue behavior.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no receivers attached to channel '{0}'")]
    NoReceivers(String),

    #[error("shared channel closed")]
    ChannelClosed,
}
