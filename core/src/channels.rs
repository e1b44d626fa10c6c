//! A single-slot channel in which the newest value always wins.
//!
//! Sending never blocks: a value that the receiver has not taken yet is evicted and handed back
//! to the sender, so the receiver only ever sees the latest value. This is a latest-value stream
//! rather than a lossless queue.
//!
//! The channel closes when every sender has been dropped, or when a sender explicitly closes it.
//! A closed channel can be reopened by any remaining sender.
use crate::frame::Frame;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use thiserror::Error;
use tokio::sync::Notify;

pub type LatestFrameSender<const N: usize> = LatestSender<Frame<N>>;
pub type LatestFrameReceiver<const N: usize> = LatestReceiver<Frame<N>>;

/// Returned by [LatestSender::send] when the receiver has been dropped, carrying the rejected value.
#[derive(Debug, Error, PartialEq)]
#[error("Receiver has been dropped")]
pub struct SendError<T>(pub T);

struct Shared<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
    senders: AtomicUsize,
    closed: AtomicBool,
    receiver_alive: AtomicBool,
}

impl<T> Shared<T> {
    /// Both critical sections are a single `take` or `replace`, so a poisoned lock still holds
    /// a consistent slot.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a connected sender and receiver.
pub fn latest<T>() -> (LatestSender<T>, LatestReceiver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(None),
        notify: Notify::new(),
        senders: AtomicUsize::new(1),
        closed: AtomicBool::new(false),
        receiver_alive: AtomicBool::new(true),
    });
    (
        LatestSender {
            shared: shared.clone(),
        },
        LatestReceiver { shared },
    )
}

/// Creates a channel carrying frames of `N` points.
pub fn latest_frame_channel<const N: usize>() -> (LatestFrameSender<N>, LatestFrameReceiver<N>) {
    latest()
}

pub struct LatestSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> LatestSender<T> {
    /// Places `value` in the slot.
    ///
    /// Returns the stale value it replaced, if the receiver had not taken it yet.
    pub fn send(&self, value: T) -> Result<Option<T>, SendError<T>> {
        if self.is_closed() {
            return Err(SendError(value));
        }
        let evicted = self.shared.lock().replace(value);
        self.shared.notify.notify_one();
        Ok(evicted)
    }

    /// Returns true once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        !self.shared.receiver_alive.load(Ordering::Acquire)
    }

    /// Tells the receiver no more values are coming, without dropping this sender.
    ///
    /// A value already in the slot can still be received.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }

    /// Undoes [LatestSender::close].
    pub fn reopen(&self) {
        self.shared.closed.store(false, Ordering::Release);
    }
}

impl<T> Clone for LatestSender<T> {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for LatestSender<T> {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            //  Wake the receiver so it can observe the closed channel
            self.shared.notify.notify_one();
        }
    }
}

pub struct LatestReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> LatestReceiver<T> {
    /// Waits for a value.
    ///
    /// Returns [None] once the channel is closed and the slot is empty.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.try_recv() {
                return Some(value);
            }
            if self.is_closed() {
                //  A value may have landed between the two checks
                return self.try_recv();
            }
            self.shared.notify.notified().await;
        }
    }

    /// Takes the value in the slot without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.shared.lock().take()
    }

    /// Returns true once every sender has been dropped or a sender has closed the channel.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
            || self.shared.senders.load(Ordering::Acquire) == 0
    }
}

impl<T> Drop for LatestReceiver<T> {
    fn drop(&mut self) {
        self.shared.receiver_alive.store(false, Ordering::Release);
    }
}
