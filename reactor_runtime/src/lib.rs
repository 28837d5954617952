//! A deterministic, single-threaded discrete-event scheduler for
//! statically-wired reactor programs: a fixed graph of [`Trigger`]s and
//! [`Reaction`]s is driven forward in superdense logical time by
//! [`Scheduler`], one [`Tag`] at a time.

pub mod context;
pub mod error;
pub mod event;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod scheduler;

pub use context::{Context, EventHandle};
pub use error::{ConfigError, SchedulerError};
pub use event::Event;
pub use registry::{Payload, Reaction, ReactorState, Registry, RegistryBuilder, Trigger};
pub use scheduler::{Config, Scheduler};

pub use reactor_core::{Instant, Interval, ReactionId, Tag, TriggerId};
