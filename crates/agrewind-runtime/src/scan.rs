use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag for directory scans.
///
/// Clones share the flag. A scan checks it between files and gives up with
/// [`crate::Error::Interrupted`] once it is tripped.
#[derive(Debug, Clone, Default)]
pub struct ScanInterrupt {
    tripped: Arc<AtomicBool>,
}

impl ScanInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Guard that trips the flag when dropped.
    pub fn trip_on_drop(&self) -> InterruptOnDrop {
        InterruptOnDrop {
            interrupt: self.clone(),
        }
    }
}

pub struct InterruptOnDrop {
    interrupt: ScanInterrupt,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        self.interrupt.trip();
    }
}
