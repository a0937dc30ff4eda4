// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

//! Caller-side cancellation for descriptor builds

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cancellation flag with an optional deadline
///
/// Clones share the flag, so a caller can keep one copy and cancel a build
/// running with another.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }

        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}
