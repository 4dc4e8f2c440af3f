// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scheduler errors.
//!
//! Only failures raised by coroutine bodies are errors. Misuse of the
//! API (advancing an event wait, resuming a finished handle) is a
//! programming mistake and panics instead.

use thiserror::Error;

use crate::coroutine::BoxError;

/// Result alias used across the runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// An error surfaced by a pump call or by `start`.
#[derive(Debug, Error)]
pub enum Error {
    /// A coroutine body returned an error from one resume step.
    ///
    /// The handle keeps the state it had before the step. It stays
    /// registered and will be resumed again on its next matching pump
    /// call.
    #[error("coroutine #{coroutine} `{name}` failed while resuming: {source}")]
    Resume {
        coroutine: u64,
        name: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Id of the coroutine that failed.
    pub fn coroutine_id(&self) -> u64 {
        match self {
            Error::Resume { coroutine, .. } => *coroutine,
        }
    }
}
