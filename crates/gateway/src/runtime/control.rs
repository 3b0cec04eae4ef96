//! Cooperative pause, resume and cancel for a generation run.
//!
//! Nothing here interrupts an in-flight call. The orchestrator calls
//! [`RunControl::wait_if_paused`] between sections; that is where pause
//! blocks and where cancel is observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use rw_domain::error::{Error, Result};

/// Cloneable handle shared by the orchestrator and whoever drives it
/// (a signal handler, a UI).
#[derive(Clone)]
pub struct RunControl {
    cancelled: Arc<AtomicBool>,
    paused: Arc<watch::Sender<bool>>,
}

impl RunControl {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(tx),
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Signal cancellation. Also wakes anything parked in
    /// [`wait_if_paused`](Self::wait_if_paused).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.paused.send_modify(|_| {});
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Clear both flags before a new run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        self.paused.send_replace(false);
    }

    /// Section boundary. Returns immediately when running, parks while
    /// paused, and fails with [`Error::Cancelled`] once cancelled.
    pub async fn wait_if_paused(&self) -> Result<()> {
        let mut rx = self.paused.subscribe();
        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if !*rx.borrow_and_update() {
                return Ok(());
            }
            tracing::debug!("run paused, waiting for resume");
            if rx.changed().await.is_err() {
                return Ok(());
            }
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
