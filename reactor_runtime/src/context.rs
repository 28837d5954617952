//! The context handed to a reaction body while it runs.

use std::cell::Cell;

use reactor_core::{Instant, Interval, Tag, TriggerId};

use crate::event::Event;
use crate::registry::{Payload, Registry};

/// Returned by [`Context::schedule`]. Non-negative on success; negative
/// when the requested delay was clamped to zero. Callers may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle(i64);

impl EventHandle {
    pub fn was_clamped(self) -> bool {
        self.0 < 0
    }
}

#[derive(Default)]
pub(crate) struct ContextInternal {
    pub(crate) scheduled_events: Vec<Event>,
    pub(crate) triggered_now: Vec<TriggerId>,
    pub(crate) shutdown_at: Option<Tag>,
}

/// Passed by the scheduler into each reaction invocation. Its lifetime is
/// tied to that single invocation, which makes calling `schedule` from
/// outside a reaction's dispatch structurally impossible rather than a
/// condition that must be checked at runtime (see `error.rs`).
pub struct Context<'a> {
    start_time: std::time::Instant,
    tag: Tag,
    registry: &'a Registry,
    next_handle: &'a Cell<i64>,
    pub(crate) internal: ContextInternal,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        start_time: std::time::Instant,
        tag: Tag,
        registry: &'a Registry,
        next_handle: &'a Cell<i64>,
    ) -> Self {
        Self {
            start_time,
            tag,
            registry,
            next_handle,
            internal: ContextInternal::default(),
        }
    }

    /// The tag of the logical instant currently being processed.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn logical_time(&self) -> Instant {
        self.tag.instant
    }

    pub fn physical_time(&self) -> Instant {
        Instant::from(self.start_time.elapsed())
    }

    pub fn elapsed_logical_time(&self) -> Interval {
        self.tag.instant.as_nanos()
    }

    pub fn elapsed_physical_time(&self) -> Interval {
        self.physical_time().as_nanos()
    }

    /// Read the payload the event loop populated on `trigger` for this
    /// tag.
    pub fn read<T: std::any::Any>(&self, trigger: TriggerId) -> Option<std::cell::Ref<'_, T>> {
        self.registry.trigger(trigger).read_payload::<T>()
    }

    /// Schedule `trigger` to fire `extra_delay` nanoseconds from now, on
    /// top of its own declared offset.
    pub fn schedule(
        &mut self,
        trigger: TriggerId,
        extra_delay: Interval,
        payload: Option<Payload>,
    ) -> EventHandle {
        let raw_delay = self
            .registry
            .trigger(trigger)
            .offset()
            .saturating_add(extra_delay);
        let clamped = raw_delay < 0;
        let delay = raw_delay.max(0);

        let fire_tag = if delay == 0 {
            self.tag.next_microstep()
        } else {
            self.tag.after(delay)
        };

        self.internal
            .scheduled_events
            .push(Event::new(trigger, fire_tag, payload));

        if clamped {
            EventHandle(-1)
        } else {
            let handle = self.next_handle.get();
            self.next_handle.set(handle + 1);
            EventHandle(handle)
        }
    }

    /// Mark `trigger` as set by the currently-running reaction. Its
    /// reactions are enqueued at the *same* tag once this reaction
    /// returns. Stands in for the generator-supplied
    /// `trigger_output_reactions` hook an upstream code generator would
    /// otherwise call directly.
    pub fn trigger_now(&mut self, trigger: TriggerId) {
        self.internal.triggered_now.push(trigger);
    }

    /// Schedule scheduler shutdown `extra_delay` nanoseconds from now.
    pub fn request_shutdown(&mut self, extra_delay: Interval) {
        self.internal.shutdown_at = Some(self.tag.after(extra_delay.max(0)));
    }
}
