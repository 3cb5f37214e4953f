//! The two halves of a client connection as the relay sees them.
//!
//! A [`MessageSource`] is the inbound half a session reads from; a
//! [`MessageSink`] is the outbound half the registry delivers to. The TCP
//! transport implements both with newline-delimited JSON, see
//! [`LineReader`] and [`LineWriter`].

use std::{future::Future, io};

use tokio::{
    io::{AsyncBufRead, AsyncWrite},
    sync::Mutex,
};

use crate::message::{ChatMessage, read_message, write_message};

/// Inbound half of a channel.
pub trait MessageSource: Send {
    /// Waits for the next message. `Ok(None)` means the peer closed the
    /// channel cleanly.
    fn receive(&mut self) -> impl Future<Output = io::Result<Option<ChatMessage>>> + Send;
}

/// Outbound half of a channel, shared between the owning session and the
/// registry.
pub trait MessageSink: Send + Sync + 'static {
    fn send(&self, message: &ChatMessage) -> impl Future<Output = io::Result<()>> + Send;
}

pub struct LineReader<R> {
    inner: R,
}

impl<R> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R> MessageSource for LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn receive(&mut self) -> io::Result<Option<ChatMessage>> {
        read_message(&mut self.inner).await
    }
}

/// Writes one JSON line per message. The mutex lets the sink sit behind an
/// `Arc` while the underlying writer needs `&mut`.
pub struct LineWriter<W> {
    inner: Mutex<W>,
}

impl<W> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

impl<W> MessageSink for LineWriter<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, message: &ChatMessage) -> io::Result<()> {
        let mut writer = self.inner.lock().await;
        write_message(&mut *writer, message).await
    }
}
