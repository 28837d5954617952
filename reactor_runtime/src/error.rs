//! Error kinds.
//!
//! A C runtime of this shape would document that `schedule()` calls made
//! outside of reaction dispatch on a single-threaded scheduler are
//! unsupported, without enforcing it. This reimplementation resolves that
//! structurally instead of with a runtime check: [`crate::Context`] only
//! exists for the duration of one reaction invocation (its lifetime is
//! tied to the dispatch call that creates it), so there is no way to call
//! `schedule()` from outside a running reaction in safe code. That misuse
//! is therefore unrepresentable rather than merely checked, and no
//! `ScheduleError` variant for it is needed.

/// Fatal scheduler failures: resource exhaustion and programming errors.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("event pool exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("programming error: {0}")]
    ProgrammingError(String),
}

/// Failures parsing the command-line surface, reported before
/// `initialize()` runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
