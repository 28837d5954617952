//! Dynamic event records and the reaction/event priority queues built on
//! [`crate::queue::BinaryMinHeap`].

use reactor_core::{ReactionId, Tag, TriggerId};

use crate::registry::Payload;

/// A scheduled firing of `trigger` at `tag`, optionally carrying an owned
/// payload. Compares by `tag` alone, lexicographic on instant then
/// microstep; which trigger fired at a tied tag does not affect
/// determinism, since reactions at a tag are ordered by id regardless of
/// which trigger queued them.
#[derive(Debug)]
pub struct Event {
    pub trigger: TriggerId,
    pub tag: Tag,
    pub payload: Option<Payload>,
}

impl Event {
    pub fn new(trigger: TriggerId, tag: Tag, payload: Option<Payload>) -> Self {
        Self {
            trigger,
            tag,
            payload,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.tag.cmp(&other.tag)
    }
}

/// The reaction queue: a min-heap by [`ReactionId`] that additionally
/// refuses to queue a reaction already pending at this tag, since the
/// same reaction can be a declared output of more than one trigger
/// draining simultaneously, and it must still run at most once per tag.
#[derive(Debug)]
pub struct ReactionQueue {
    heap: crate::queue::BinaryMinHeap<ReactionId>,
    queued: Vec<bool>,
}

impl ReactionQueue {
    pub fn new(num_reactions: usize) -> Self {
        Self {
            heap: crate::queue::BinaryMinHeap::new(),
            queued: vec![false; num_reactions],
        }
    }

    pub fn insert(&mut self, reaction: ReactionId) {
        let slot = &mut self.queued[reaction.index()];
        if !*slot {
            *slot = true;
            self.heap.insert(reaction);
        }
    }

    pub fn pop(&mut self) -> Option<ReactionId> {
        let reaction = self.heap.pop()?;
        self.queued[reaction.index()] = false;
        Some(reaction)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
