//! Rendezvous hand-off between the discovery pass and the eviction worker.
//!
//! The receiver announces readiness by posting a one-shot slot on a
//! capacity-one ticket channel. `send` waits for a slot and moves the item
//! straight into it, so an item is only ever transferred to a consumer that
//! is already waiting for it. Nothing is buffered between the two sides.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// A failed hand-off. The item is handed back to the caller.
#[derive(Debug, Error)]
pub enum HandoffError<T> {
    /// Cancellation fired before a consumer took the item.
    #[error("hand-off cancelled")]
    Cancelled(T),

    /// The receiving side is gone.
    #[error("hand-off receiver closed")]
    Closed(T),
}

impl<T> HandoffError<T> {
    /// Recover the item that was not transferred.
    pub fn into_inner(self) -> T {
        match self {
            HandoffError::Cancelled(item) | HandoffError::Closed(item) => item,
        }
    }
}

/// Producing half of the hand-off.
#[derive(Debug)]
pub struct HandoffSender<T> {
    tickets: mpsc::Receiver<oneshot::Sender<T>>,
}

/// Consuming half of the hand-off.
#[derive(Debug)]
pub struct HandoffReceiver<T> {
    tickets: mpsc::Sender<oneshot::Sender<T>>,
}

/// Create a connected sender/receiver pair.
pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tickets: rx }, HandoffReceiver { tickets: tx })
}

impl<T> HandoffSender<T> {
    /// Hand `item` to the receiver, waiting until it is ready to take it.
    pub async fn send(&mut self, mut item: T, cancel: &CancellationToken) -> Result<(), HandoffError<T>> {
        loop {
            let slot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HandoffError::Cancelled(item)),
                slot = self.tickets.recv() => match slot {
                    Some(slot) => slot,
                    None => return Err(HandoffError::Closed(item)),
                },
            };

            // A slot whose receiver gave up (cancelled recv) bounces the item back.
            match slot.send(item) {
                Ok(()) => return Ok(()),
                Err(returned) => item = returned,
            }
        }
    }
}

impl<T> HandoffReceiver<T> {
    /// Wait for the next item. Returns `None` on cancellation or when the
    /// sender is gone.
    pub async fn recv(&mut self, cancel: &CancellationToken) -> Option<T> {
        let (slot_tx, slot_rx) = oneshot::channel();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            posted = self.tickets.send(slot_tx) => posted.ok()?,
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = slot_rx => item.ok(),
        }
    }
}
