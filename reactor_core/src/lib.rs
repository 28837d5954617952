//! Core time and key types shared by the reactor runtime.

pub mod keys;
pub mod time;

pub use keys::{ReactionId, TriggerId};
pub use time::{Instant, Interval, Tag};
