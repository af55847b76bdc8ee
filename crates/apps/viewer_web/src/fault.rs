use std::cell::{Cell, RefCell};

/// Holds the first error thrown by the map library until the host collects
/// it. Later errors are only logged and counted.
#[derive(Debug, Default)]
pub struct FaultLatch {
    first: RefCell<Option<String>>,
    suppressed: Cell<usize>,
}

impl FaultLatch {
    pub fn record(&self, call: &str, message: &str) {
        tracing::error!(call, error = message, "map library call failed");
        let mut first = self.first.borrow_mut();
        if first.is_none() {
            *first = Some(format!("{call}: {message}"));
        } else {
            self.suppressed.set(self.suppressed.get() + 1);
        }
    }

    /// Returns the first failure and resets the latch.
    pub fn take(&self) -> Option<String> {
        let suppressed = self.suppressed.replace(0);
        if suppressed > 0 {
            tracing::debug!(suppressed, "further map library failures after the first");
        }
        self.first.borrow_mut().take()
    }
}
