//! Background loading of segments.
//!
//! Each load is fanned out onto the rayon pool and its outcome fanned back in over
//! a channel. The frame loop drains the channel with [`LoadBarrier::poll`], which
//! never blocks; callers that are allowed to wait use [`LoadBarrier::wait`].
//! Outcomes arrive in completion order, not segment order.

use super::error::LoadError;
use super::voice::{Backend, Voice};
use log::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

pub struct LoadOutcome {
    pub index: usize,
    pub result: Result<Box<dyn Voice>, LoadError>,
}

pub struct LoadBarrier {
    tx: mpsc::Sender<LoadOutcome>,
    rx: mpsc::Receiver<LoadOutcome>,
    outstanding: usize,
}

impl LoadBarrier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            outstanding: 0,
        }
    }

    /// Start loading `source` for segment `index` in the background.
    pub fn dispatch(&mut self, index: usize, source: String, backend: Arc<dyn Backend>) {
        self.outstanding += 1;
        let tx = self.tx.clone();
        debug!("Dispatching load of {source} via {} backend", backend.name());

        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| backend.load(&source)))
                .unwrap_or_else(|_| {
                    error!("Backend panicked while loading {source}");
                    Err(LoadError::Panicked {
                        clip: source.clone(),
                    })
                });
            // The barrier may already be gone if the player was torn down mid-load.
            let _ = tx.send(LoadOutcome { index, result });
        });
    }

    /// Take every outcome that has arrived so far without waiting.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        self.outstanding -= outcomes.len().min(self.outstanding);
        outcomes
    }

    /// Block until every dispatched load has settled or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Vec<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        let mut outcomes = Vec::new();

        while self.outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.outstanding -= 1;
                    outcomes.push(outcome);
                }
                Err(_) => break,
            }
        }
        outcomes
    }

    /// Loads dispatched but not yet collected.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding == 0
    }
}

impl Default for LoadBarrier {
    fn default() -> Self {
        Self::new()
    }
}
