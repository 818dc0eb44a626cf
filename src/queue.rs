//! Bounded outbound queue between the frame callback and the
//! thread that writes published frames to the transport.
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::{frame::ImageMessage, node::Publish};

/// Producer half of a bounded FIFO. Pushing onto a full queue
/// evicts the oldest entry; the producer never blocks.
///
/// Dropping the producer ends the stream: the consumer drains
/// what is left and then sees the end.
pub struct OutboundQueue<T> {
    tx: Sender<T>,
    // Held to pull the oldest entry on overflow.
    evict: Receiver<T>,
    closed: Arc<AtomicBool>,
    dropped: AtomicU64,
}

/// Consumer half of an [`OutboundQueue`]. Dropping it closes
/// the queue for the producer.
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
    closed: Arc<AtomicBool>,
}

impl<T> OutboundQueue<T> {
    pub fn bounded(capacity: usize) -> (Self, QueueReceiver<T>) {
        assert!(capacity > 0, "queue capacity must be positive");
        let (tx, rx) = channel::bounded(capacity);
        let closed = Arc::new(AtomicBool::new(false));
        let queue = OutboundQueue {
            tx,
            evict: rx.clone(),
            closed: closed.clone(),
            dropped: AtomicU64::new(0),
        };
        (queue, QueueReceiver { rx, closed })
    }

    /// Enqueue `item`. On success returns the entry evicted to
    /// make room, if any. Once the consumer is gone the item is
    /// handed back as `Err`.
    pub fn push(&self, mut item: T) -> Result<Option<T>, T> {
        if self.is_closed() {
            return Err(item);
        }
        let mut evicted = None;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return Ok(evicted),
                Err(TrySendError::Full(back)) => {
                    item = back;
                    if let Ok(old) = self.evict.try_recv() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        evicted = Some(old);
                    }
                }
                Err(TrySendError::Disconnected(back)) => return Err(back),
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Number of entries evicted by overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> QueueReceiver<T> {
    /// Block until an item is available. Returns `None` once
    /// the producer is gone and the queue is drained.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

impl<T> Iterator for QueueReceiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

impl<T> Drop for QueueReceiver<T> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl Publish for OutboundQueue<ImageMessage> {
    fn publish(&self, msg: ImageMessage) {
        match self.push(msg) {
            Ok(None) => {}
            Ok(Some(old)) => warn!(
                seq = old.header.seq,
                frame_id = %old.header.frame_id,
                "outbound queue full, dropped oldest frame"
            ),
            Err(msg) => warn!(seq = msg.header.seq, "publisher closed, dropping frame"),
        }
    }

    fn is_closed(&self) -> bool {
        OutboundQueue::is_closed(self)
    }
}
