//! Single-flight guard: at most one outstanding call per operation kind.

use crate::error::WorkflowError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Import,
    Search,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => f.write_str("import"),
            Self::Search => f.write_str("search"),
        }
    }
}

/// In-flight flag for one operation kind.
///
/// The flag is set by [`InFlight::try_acquire`] and cleared when the returned
/// guard drops, so success, failure and early return all release it.
#[derive(Debug, Clone)]
pub struct InFlight {
    op: Operation,
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the flag, or fail with [`WorkflowError::Busy`] if a call is
    /// already outstanding.
    pub fn try_acquire(&self) -> Result<FlightGuard, WorkflowError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::Busy(self.op))?;
        Ok(FlightGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

#[must_use = "the in-flight flag is released as soon as the guard drops"]
#[derive(Debug)]
pub struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
