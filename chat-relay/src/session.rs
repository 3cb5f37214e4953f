//! Per-connection relay loop.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    channel::{MessageSink, MessageSource},
    error::RelayError,
    registry::Registry,
};

/// The identity a channel has claimed for itself.
///
/// It is taken from the `sender_identity` of the latest message and never
/// checked against anything. Verified identity would replace this type
/// without touching the registry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeclaredIdentity(Option<String>);

impl DeclaredIdentity {
    pub fn declare(&mut self, identity: &str) {
        if self.0.as_deref() != Some(identity) {
            self.0 = Some(identity.to_owned());
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Drives one channel until it closes or fails.
pub struct Session<R, S> {
    source: R,
    sink: Arc<S>,
    identity: DeclaredIdentity,
}

impl<R, S> Session<R, S>
where
    R: MessageSource,
    S: MessageSink,
{
    pub fn new(source: R, sink: Arc<S>) -> Self {
        Self {
            source,
            sink,
            identity: DeclaredIdentity::default(),
        }
    }

    /// Receives, registers and fans out until the channel ends, then drops
    /// the last declared identity from the registry.
    ///
    /// A clean close returns `Ok(())`; a transport failure is returned as
    /// [`RelayError::Receive`] after the cleanup.
    pub async fn run(mut self, registry: &Registry<S>) -> Result<(), RelayError> {
        loop {
            let message = match self.source.receive().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    self.leave(registry).await;
                    return Ok(());
                }
                Err(err) => {
                    self.leave(registry).await;
                    return Err(RelayError::Receive(err));
                }
            };

            self.identity.declare(&message.sender_identity);
            info!(identity = %message.sender_identity, text = %message.text, "relaying message");

            let attempts = registry
                .relay(&message.sender_identity, Arc::clone(&self.sink), &message)
                .await;
            debug!(attempts, "fan-out complete");
        }
    }

    async fn leave(&self, registry: &Registry<S>) {
        // Only the latest identity is removed; earlier ones this channel used
        // stay behind until something else overwrites them.
        if let Some(identity) = self.identity.as_deref() {
            let removed = registry.remove(identity).await;
            info!(%identity, removed, "client disconnected");
        } else {
            debug!("channel closed before declaring an identity");
        }
    }
}
