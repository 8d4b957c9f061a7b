//! Scheduling of per-repository work.
//!
//! Units run either one at a time or with bounded concurrency. Either way,
//! results come back in input order, never completion order.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// How per-repository units are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One unit at a time.
    Sequential,

    /// Up to `workers` units in flight.
    Pool { workers: NonZeroUsize },
}

impl Schedule {
    /// Picks a pool of `workers` when `parallel` is set.
    pub fn from_flag(parallel: bool, workers: NonZeroUsize) -> Self {
        if parallel {
            Self::Pool { workers }
        } else {
            Self::Sequential
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Pool { workers } => workers.get(),
        }
    }
}

/// Cooperative cancellation shared between the caller and a scheduler.
///
/// Once set, no new unit starts; units already running finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Units that finished, in input order, plus how many never started.
#[derive(Debug)]
pub struct Batch<T> {
    pub completed: Vec<T>,
    pub abandoned: usize,
}

/// Runs units according to a [`Schedule`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    schedule: Schedule,
    cancel: CancelFlag,
}

impl Scheduler {
    pub fn new(schedule: Schedule, cancel: CancelFlag) -> Self {
        Self { schedule, cancel }
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Applies `task` to every item and collects the results in item order.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> Batch<T>
    where
        F: FnMut(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let cancel = self.cancel.clone();
        debug!(total, width = self.schedule.width(), "Scheduling units");

        let completed: Vec<T> = stream::iter(items)
            .take_while(move |_| std::future::ready(!cancel.is_cancelled()))
            .map(task)
            .buffered(self.schedule.width())
            .collect()
            .await;

        let abandoned = total - completed.len();
        if abandoned > 0 {
            warn!(abandoned, "Cancelled, remaining units were not started");
        }
        Batch {
            completed,
            abandoned,
        }
    }
}

/// One async lock per repository path.
///
/// Guarantees a working tree is never touched by two sync units at once,
/// even under a pool.
#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(path.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }
}
