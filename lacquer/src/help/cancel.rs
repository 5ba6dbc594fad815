//! Cooperative cancellation for store operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::help::error::HelpError;

/// A cloneable cancellation token with an optional deadline.
///
/// Store operations call [`Cancellation::check`] between statements; a
/// fired token or an expired deadline rolls back the enclosing
/// transaction and surfaces [`HelpError::Cancelled`].
#[derive(Clone, Debug)]
pub struct Cancellation {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A fresh token; cancel it from another clone via [`cancel`](Self::cancel).
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(AtomicBool::new(false))),
            deadline: None,
        }
    }

    /// A token that never fires, for callers without a cancellation story.
    #[must_use]
    pub fn none() -> Self {
        Self {
            flag: None,
            deadline: None,
        }
    }

    /// Attach a deadline relative to now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Fire the token; all clones observe the cancellation.
    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// True once the token fired or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::SeqCst) {
                return true;
            }
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Error out if cancelled.
    pub fn check(&self) -> Result<(), HelpError> {
        if self.is_cancelled() {
            Err(HelpError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Cancellation;
    use crate::help::error::HelpError;

    #[test]
    fn none_never_fires() {
        let token = Cancellation::none();
        assert!(token.check().is_ok());
        token.cancel();
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_propagates_to_clones() {
        let token = Cancellation::new();
        let clone = token.clone();
        assert!(clone.check().is_ok());
        token.cancel();
        assert!(matches!(clone.check(), Err(HelpError::Cancelled)));
    }

    #[test]
    fn expired_deadline_fires() {
        let token = Cancellation::new().with_timeout(Duration::ZERO);
        assert!(matches!(token.check(), Err(HelpError::Cancelled)));
    }
}
