//! Single in-flight tag scan guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Admits at most one tag-scan session at a time.
#[derive(Debug, Default)]
pub struct ScanSlot {
    busy: AtomicBool,
}

impl ScanSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<ScanPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit { slot: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its [`ScanSlot`] when dropped, including when the scan future is
/// cancelled.
#[derive(Debug)]
pub struct ScanPermit<'a> {
    slot: &'a ScanSlot,
}

impl Drop for ScanPermit<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}
