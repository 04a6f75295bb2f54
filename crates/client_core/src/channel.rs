//! Replay-latest cells: a subscriber always sees the current snapshot first,
//! then every later one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::error::DatasetError;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetStatus {
    #[default]
    Idle,
    Fetching,
    Published,
    Failed,
}

#[derive(Debug)]
pub struct Snapshot<T> {
    /// Last successfully published value. Survives failures.
    pub value: Option<Arc<T>>,
    /// Generation that produced `value`.
    pub generation: u64,
    /// Newest generation issued for this channel.
    pub requested: u64,
    pub status: DatasetStatus,
    pub error: Option<DatasetError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Snapshot<T> {
    /// A previous value is still shown but the latest refresh failed.
    pub fn is_stale(&self) -> bool {
        self.status == DatasetStatus::Failed && self.value.is_some()
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            generation: self.generation,
            requested: self.requested,
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
            requested: 0,
            status: DatasetStatus::Idle,
            error: None,
            updated_at: None,
        }
    }
}

pub struct ReplayChannel<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T> Default for ReplayChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReplayChannel<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    pub fn latest(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }

    /// Marks `generation` as the newest request. Older generations still in
    /// flight are discarded when they land.
    pub fn begin(&self, generation: u64) {
        self.tx.send_if_modified(|snapshot| {
            if generation < snapshot.requested {
                return false;
            }
            snapshot.requested = generation;
            snapshot.status = DatasetStatus::Fetching;
            true
        });
    }

    /// Returns `false` when a newer generation was issued in the meantime.
    pub fn publish(&self, generation: u64, value: Arc<T>) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if generation < snapshot.requested || generation < snapshot.generation {
                return false;
            }
            snapshot.value = Some(value);
            snapshot.generation = generation;
            snapshot.status = DatasetStatus::Published;
            snapshot.error = None;
            snapshot.updated_at = Some(Utc::now());
            true
        })
    }

    /// Publish for a view derived from another channel's response. Only a
    /// newer applied value rejects it, so a derived view never falls behind
    /// the primary one when a newer request is issued in between. Status stays
    /// as is while that newer request is outstanding.
    pub fn publish_derived(&self, generation: u64, value: Arc<T>) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if generation < snapshot.generation {
                return false;
            }
            snapshot.value = Some(value);
            snapshot.generation = generation;
            if generation >= snapshot.requested {
                snapshot.status = DatasetStatus::Published;
                snapshot.error = None;
            }
            snapshot.updated_at = Some(Utc::now());
            true
        })
    }

    /// Keeps the previous value and attaches the error to it.
    pub fn fail(&self, generation: u64, error: DatasetError) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if generation < snapshot.requested {
                return false;
            }
            snapshot.status = DatasetStatus::Failed;
            snapshot.error = Some(error);
            snapshot.updated_at = Some(Utc::now());
            true
        })
    }

    /// Unconditional write for values that are never fetched.
    pub fn replace(&self, value: T) {
        self.tx.send_modify(|snapshot| {
            let generation = snapshot.generation + 1;
            snapshot.value = Some(Arc::new(value));
            snapshot.generation = generation;
            snapshot.requested = generation;
            snapshot.status = DatasetStatus::Published;
            snapshot.error = None;
            snapshot.updated_at = Some(Utc::now());
        });
    }
}

impl<T: Send + Sync + 'static> ReplayChannel<T> {
    pub fn updates(&self) -> WatchStream<Snapshot<T>> {
        WatchStream::new(self.tx.subscribe())
    }
}
