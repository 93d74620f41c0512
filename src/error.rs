//! Caller-facing mutation engine error types.

use thiserror::Error;

/// Caller-misuse errors the mutation engine can report instead of panicking.
///
/// Internal invariant violations (for instance, a branch-mask allocation
/// request exceeding [`crate::config::EngineConfig::max_alloc`]) remain
/// panics, matching the `abort()` semantics of the original implementation:
/// they indicate a programming error in the host, not a recoverable runtime
/// condition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// The engine was constructed with a zero-length seed. Every stage
    /// assumes `dataSize >= 1`.
    #[error("seed must be at least one byte long")]
    EmptySeed,

    /// A branch-mask or position-map allocation was requested past the
    /// configured guard rail. Surfaced as a typed error for callers that
    /// validate a seed/config combination ahead of time; the internal
    /// allocator panics with the same condition if it's hit mid-mutation.
    #[error("allocation of {requested} bytes exceeds the {limit} byte guard rail")]
    AllocationTooLarge {
        /// The size, in bytes, that was requested.
        requested: usize,
        /// The configured limit that was exceeded.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(MutationError::EmptySeed.to_string(), "seed must be at least one byte long");
        assert_eq!(
            MutationError::AllocationTooLarge {
                requested: 2048,
                limit: 1024
            }
            .to_string(),
            "allocation of 2048 bytes exceeds the 1024 byte guard rail"
        );
    }
}
