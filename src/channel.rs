use crate::error::SortError;
use crossbeam_channel::{Receiver, Sender, bounded, select};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Blocking receive side of a point-to-point link.
pub trait Inbound<T> {
    fn recv(&mut self) -> Result<T, SortError>;
}

/// Blocking send side of a point-to-point link, or a terminal sink.
pub trait Outbound<T> {
    fn send(&mut self, value: T) -> Result<(), SortError>;
}

/// Terminal sink collecting the final output in arrival order.
impl<T> Outbound<T> for Vec<T> {
    fn send(&mut self, value: T) -> Result<(), SortError> {
        self.push(value);
        Ok(())
    }
}

/// In-memory source, mostly for driving a single stage in tests.
impl<T> Inbound<T> for std::vec::IntoIter<T> {
    fn recv(&mut self) -> Result<T, SortError> {
        self.next()
            .ok_or_else(|| SortError::Channel("inbound exhausted".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Send completes only once the receiver takes the element
    #[default]
    Rendezvous,
    /// One element of backpressure slack
    Buffered,
}

impl ChannelMode {
    pub fn capacity(self) -> usize {
        match self {
            ChannelMode::Rendezvous => 0,
            ChannelMode::Buffered => 1,
        }
    }
}

/// Shared abort signal for a whole chain.
///
/// Cancelling drops the internal sender, which makes every watcher's
/// `recv` ready at once, so blocked sends and receives wake up.
pub struct CancelToken {
    trigger: Mutex<Option<Sender<()>>>,
    watch: Receiver<()>,
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, watch) = bounded(0);
        CancelToken {
            trigger: Mutex::new(Some(trigger)),
            watch,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns true only for the call that actually cancelled.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::SeqCst);
        if first {
            let mut trigger = self.trigger.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            trigger.take();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn watcher(&self) -> Receiver<()> {
        self.watch.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ChannelInbound<T> {
    rx: Receiver<T>,
    cancel: Receiver<()>,
}

pub struct ChannelOutbound<T> {
    tx: Sender<T>,
    cancel: Receiver<()>,
}

/// Creates one link of the chain.
pub fn link<T>(mode: ChannelMode, cancel: &CancelToken) -> (ChannelOutbound<T>, ChannelInbound<T>) {
    let (tx, rx) = bounded(mode.capacity());
    (
        ChannelOutbound { tx, cancel: cancel.watcher() },
        ChannelInbound { rx, cancel: cancel.watcher() },
    )
}

impl<T> Inbound<T> for ChannelInbound<T> {
    fn recv(&mut self) -> Result<T, SortError> {
        select! {
            recv(self.rx) -> value => Ok(value?),
            recv(self.cancel) -> _ => Err(SortError::Cancelled),
        }
    }
}

impl<T> Outbound<T> for ChannelOutbound<T> {
    fn send(&mut self, value: T) -> Result<(), SortError> {
        select! {
            send(self.tx, value) -> sent => Ok(sent?),
            recv(self.cancel) -> _ => Err(SortError::Cancelled),
        }
    }
}
