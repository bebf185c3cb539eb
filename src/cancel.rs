//! Cooperative cancellation for long-running constructions and searches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// A shared flag polled by chain builders, base changes and subgroup
/// searches at every outer-loop iteration and at every chain descent.
///
/// Cancellation is cooperative: setting the flag makes the running operation
/// fail with [`Error::Cancelled`] at its next checkpoint, without publishing
/// any partially built chain.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Checks an optional token, failing with [`Error::Cancelled`] if it fired.
pub(crate) fn check(token: Option<&CancelToken>) -> Result<()> {
    match token {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_clear_and_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(check(Some(&token)).is_ok());
        assert!(check(None).is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(check(Some(&token)), Err(Error::Cancelled)));

        // Clones observe the same flag.
        let other = token.clone();
        assert!(other.is_cancelled());
    }
}
