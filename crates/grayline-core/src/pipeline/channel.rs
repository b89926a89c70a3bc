//! Channels connecting the pipeline stages.
//!
//! Two flavours are used: a bounded queue, where a full buffer blocks the
//! sender (backpressure), and a rendezvous hand-off with no buffer at all,
//! where a send completes only once the receiver has taken the value.
//! Both signal end-of-stream by closing: once every sender is dropped the
//! receiver yields `None`.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

/// Create a bounded channel pair with the given buffer size.
///
/// When the buffer is full, the sender will block, providing backpressure
/// so an upstream stage cannot run arbitrarily far ahead.
pub fn bounded_channel<T>(capacity: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(capacity)
}

/// Create a zero-capacity channel pair.
///
/// `RendezvousSender::send` resolves only after `RendezvousReceiver::recv`
/// has taken the value, coupling the producer's rate to the consumer's.
pub fn rendezvous_channel<T>() -> (RendezvousSender<T>, RendezvousReceiver<T>) {
    // One slot holds the value while the sender waits for its acknowledgement;
    // the sender never has more than one value outstanding.
    let (tx, rx) = mpsc::channel(1);
    (RendezvousSender { inner: tx }, RendezvousReceiver { inner: rx })
}

/// The receiving half was dropped before taking the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverClosed;

impl fmt::Display for ReceiverClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("receiver closed")
    }
}

impl std::error::Error for ReceiverClosed {}

/// Sending half of a rendezvous channel.
#[derive(Debug)]
pub struct RendezvousSender<T> {
    inner: mpsc::Sender<(T, oneshot::Sender<()>)>,
}

impl<T> Clone for RendezvousSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> RendezvousSender<T> {
    /// Hand `value` to the receiver, waiting until it has been taken.
    pub async fn send(&self, value: T) -> Result<(), ReceiverClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.inner
            .send((value, ack_tx))
            .await
            .map_err(|_| ReceiverClosed)?;
        ack_rx.await.map_err(|_| ReceiverClosed)
    }
}

/// Receiving half of a rendezvous channel.
#[derive(Debug)]
pub struct RendezvousReceiver<T> {
    inner: mpsc::Receiver<(T, oneshot::Sender<()>)>,
}

impl<T> RendezvousReceiver<T> {
    /// Take the next value, releasing the sender waiting on it.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        let (value, ack) = self.inner.recv().await?;
        // The sender may have given up waiting; the value is still ours.
        let _ = ack.send(());
        Some(value)
    }
}
