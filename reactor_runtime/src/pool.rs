//! Event record recycling.
//!
//! The source C runtime pools `event_t` structs and keeps a second
//! `free_q` of events still holding a payload pointer that must be
//! `free()`'d once the tag finishes. In Rust a `Box` has exactly one
//! owner, and step 5 already moves the payload out of the drained
//! [`Event`] into the firing [`crate::registry::Trigger`]'s scratch cell
//! (so reactions can read it) — by the time an event would join `free_q`
//! it no longer holds anything. `free_q`'s bookkeeping therefore moves
//! to [`crate::Scheduler`] as a list of [`TriggerId`]s whose scratch
//! payload is still pending release (see `Scheduler::release_parked`);
//! this pool only ever needs the one `recycle_q`, which still avoids
//! reallocating an `Event` shell per firing.

use reactor_core::{Tag, TriggerId};

use crate::event::Event;
use crate::registry::Payload;

#[derive(Debug, Default)]
pub struct EventPool {
    recycle: Vec<Event>,
}

impl EventPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire an event record, reusing one from `recycle_q` if available,
    /// else allocating a fresh one.
    pub fn acquire(&mut self, trigger: TriggerId, tag: Tag, payload: Option<Payload>) -> Event {
        match self.recycle.pop() {
            Some(mut event) => {
                event.trigger = trigger;
                event.tag = tag;
                event.payload = payload;
                event
            }
            None => Event::new(trigger, tag, payload),
        }
    }

    /// Return a drained, payload-free event record to `recycle_q`.
    pub fn recycle(&mut self, mut event: Event) {
        debug_assert!(
            event.payload.is_none(),
            "events must be stripped of their payload before recycling"
        );
        event.payload = None;
        self.recycle.push(event);
    }

    #[cfg(test)]
    pub fn recycle_len(&self) -> usize {
        self.recycle.len()
    }
}
