//! Outstanding handle counter
//!
//! 未释放句柄计数器

use parking_lot::{Condvar, Mutex};

/// Wait-group style counter: incremented when a handle is issued, decremented
/// when it is released, [`wait`](Pending::wait) blocks until it drops to zero.
///
/// 等待组式计数器：发放句柄时加一，释放时减一，[`wait`](Pending::wait) 阻塞直到归零。
#[derive(Debug, Default)]
pub(crate) struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    #[inline]
    pub(crate) fn add(&self) {
        *self.count.lock() += 1;
    }

    pub(crate) fn done(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "pending counter underflow");
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    pub(crate) fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> usize {
        *self.count.lock()
    }
}
