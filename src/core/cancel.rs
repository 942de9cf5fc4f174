use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind, Result};

/// Cooperative cancellation flag, checked between document/term iterations
/// of long-running scans. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Err(Cancelled) once the token has been tripped. Partial progress
    /// already written is not rolled back.
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::new(
                ErrorKind::Cancelled,
                format!("{} cancelled", operation),
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_until_cancelled() {
        let token = CancelToken::new();
        assert!(token.check("scan").is_ok());

        let shared = token.clone();
        shared.cancel();

        let err = token.check("scan").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
