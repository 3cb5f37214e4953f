//! In-memory channel halves for unit tests.

use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::sync::mpsc;

use crate::{
    channel::{MessageSink, MessageSource},
    message::ChatMessage,
};

/// Sink that records what it was asked to deliver, or refuses everything.
pub struct RecordingSink {
    received: Mutex<Vec<ChatMessage>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn received(&self) -> Vec<ChatMessage> {
        self.received.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MessageSink for RecordingSink {
    async fn send(&self, message: &ChatMessage) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "recipient gone"));
        }
        self.received.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Source fed by a test through an mpsc sender. Dropping the sender closes
/// the channel cleanly; pushing an `Err` simulates a transport failure.
pub struct ScriptedSource {
    inbound: mpsc::UnboundedReceiver<io::Result<ChatMessage>>,
}

impl ScriptedSource {
    pub fn new() -> (mpsc::UnboundedSender<io::Result<ChatMessage>>, Self) {
        let (tx, inbound) = mpsc::unbounded_channel();
        (tx, Self { inbound })
    }
}

impl MessageSource for ScriptedSource {
    async fn receive(&mut self) -> io::Result<Option<ChatMessage>> {
        self.inbound.recv().await.transpose()
    }
}
