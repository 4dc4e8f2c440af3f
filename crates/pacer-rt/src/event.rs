// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Identity-only wake tokens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Something a coroutine can wait for.
///
/// Events carry no payload. Equality is identity: every call to
/// [`Event::new`] yields a token unequal to all others, and copies of a
/// token share its identity. The scheduler only keys on events; it
/// never owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    id: u64,
}

impl Event {
    pub fn new() -> Self {
        Self {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Numeric identity, for diagnostics.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.id)
    }
}
