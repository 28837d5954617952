//! The static trigger/reaction graph.
//!
//! The graph is built once, before [`crate::Scheduler::initialize`]
//! returns, by whatever upstream code generator exists (out of scope
//! here; see [`crate::RegistryBuilder`] for the manual equivalent used by
//! this crate's tests).

use std::any::Any;
use std::cell::RefCell;

use reactor_core::{Interval, ReactionId, TriggerId};

use crate::Context;

/// Boxed, type-erased event payload. Ownership transfers to the scheduler
/// at `schedule()` and is released (by `Drop`) once the last reaction at
/// its firing tag has returned.
pub type Payload = Box<dyn Any + Send>;

/// A reactor's private state, passed opaquely into its reactions' bodies.
///
/// `&mut dyn ReactorState` stands in for the untyped `void* self` plus
/// function pointer a C runtime would carry.
pub trait ReactorState: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> ReactorState for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A reaction body: `Fn(context, reactor-state)`.
pub trait ReactionFn: Fn(&mut Context<'_>, &mut dyn ReactorState) + Send + Sync {}
impl<F> ReactionFn for F where F: Fn(&mut Context<'_>, &mut dyn ReactorState) + Send + Sync {}

/// A static reaction descriptor.
pub struct Reaction {
    name: String,
    /// Topological priority; smaller fires first at a given tag. This
    /// value is also this reaction's [`ReactionId`] index.
    id: ReactionId,
    /// Index into the scheduler's reactor-state table: which state this
    /// reaction's body is invoked against.
    reactor: u32,
    body: Box<dyn ReactionFn>,
    /// 0 means "no deadline".
    deadline: Interval,
    deadline_violation_trigger: Option<TriggerId>,
    /// Triggers this reaction may set during its invocation.
    output_triggers: Vec<TriggerId>,
}

impl Reaction {
    pub fn new(
        name: impl Into<String>,
        id: ReactionId,
        reactor: u32,
        body: impl ReactionFn + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            reactor,
            body: Box::new(body),
            deadline: 0,
            deadline_violation_trigger: None,
            output_triggers: Vec::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: Interval, violation_trigger: TriggerId) -> Self {
        self.deadline = deadline;
        self.deadline_violation_trigger = Some(violation_trigger);
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = TriggerId>) -> Self {
        self.output_triggers = outputs.into_iter().collect();
        self
    }

    pub fn id(&self) -> ReactionId {
        self.id
    }

    pub fn reactor(&self) -> u32 {
        self.reactor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deadline(&self) -> Interval {
        self.deadline
    }

    pub fn deadline_violation_trigger(&self) -> Option<TriggerId> {
        self.deadline_violation_trigger
    }

    pub fn output_triggers(&self) -> &[TriggerId] {
        &self.output_triggers
    }

    pub(crate) fn invoke(&self, ctx: &mut Context<'_>, state: &mut dyn ReactorState) {
        (self.body)(ctx, state);
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// A static trigger descriptor.
#[derive(Debug)]
pub struct Trigger {
    name: String,
    /// Declared offset from the tag at which it is scheduled.
    offset: Interval,
    /// 0 means "not periodic".
    period: Interval,
    /// Reactions fired when this trigger's event is drained, in
    /// declaration order (priority is carried by each reaction's own id).
    reactions: Vec<ReactionId>,
    /// Scratch field: populated by the event loop with the firing
    /// event's payload immediately before its reactions run.
    payload: RefCell<Option<Payload>>,
}

impl Trigger {
    pub fn new(name: impl Into<String>, offset: Interval, period: Interval) -> Self {
        Self {
            name: name.into(),
            offset,
            period,
            reactions: Vec::new(),
            payload: RefCell::new(None),
        }
    }

    pub fn with_reactions(mut self, reactions: impl IntoIterator<Item = ReactionId>) -> Self {
        self.reactions = reactions.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> Interval {
        self.offset
    }

    pub fn period(&self) -> Interval {
        self.period
    }

    pub fn reactions(&self) -> &[ReactionId] {
        &self.reactions
    }

    /// Replace the scratch payload ahead of dispatching this trigger's
    /// reactions.
    pub(crate) fn set_payload(&self, payload: Option<Payload>) {
        *self.payload.borrow_mut() = payload;
    }

    /// Read the payload set for the event currently being dispatched.
    pub fn read_payload<T: Any>(&self) -> Option<std::cell::Ref<'_, T>> {
        let borrow = self.payload.borrow();
        if borrow.as_ref()?.downcast_ref::<T>().is_some() {
            Some(std::cell::Ref::map(borrow, |p| {
                p.as_ref().unwrap().downcast_ref::<T>().unwrap()
            }))
        } else {
            None
        }
    }
}

/// The static trigger/reaction graph, fixed for the run.
#[derive(Debug, Default)]
pub struct Registry {
    triggers: Vec<Trigger>,
    reactions: Vec<Reaction>,
    /// Triggers fired once at startup, at their own declared offset.
    startup_triggers: Vec<TriggerId>,
    /// Triggers fired once shutdown begins.
    shutdown_triggers: Vec<TriggerId>,
}

impl Registry {
    pub fn trigger(&self, id: TriggerId) -> &Trigger {
        &self.triggers[id.index()]
    }

    pub fn reaction(&self, id: ReactionId) -> &Reaction {
        &self.reactions[id.index()]
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn len_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn startup_triggers(&self) -> &[TriggerId] {
        &self.startup_triggers
    }

    pub fn shutdown_triggers(&self) -> &[TriggerId] {
        &self.shutdown_triggers
    }
}

/// Builds a [`Registry`]. Stands in for an upstream source-to-source code
/// generator — a real deployment would emit `Registry` construction
/// directly rather than call this builder.
#[derive(Default)]
pub struct RegistryBuilder {
    triggers: Vec<Trigger>,
    reactions: Vec<Reaction>,
    startup_triggers: Vec<TriggerId>,
    shutdown_triggers: Vec<TriggerId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let id = TriggerId(self.triggers.len() as u32);
        self.triggers.push(trigger);
        id
    }

    /// Mark `trigger` to fire once at startup, at its own declared offset.
    pub fn mark_startup(&mut self, trigger: TriggerId) {
        self.startup_triggers.push(trigger);
    }

    /// Mark `trigger` to fire once when shutdown begins.
    pub fn mark_shutdown(&mut self, trigger: TriggerId) {
        self.shutdown_triggers.push(trigger);
    }

    /// Allocate the next [`ReactionId`] without yet supplying the
    /// reaction body; useful when a reaction needs to reference a
    /// `TriggerId` that in turn needs this reaction's id (e.g. deadline
    /// violation handlers), since both graphs can be mutually recursive.
    pub fn next_reaction_id(&self) -> ReactionId {
        ReactionId(self.reactions.len() as u32)
    }

    pub fn add_reaction(&mut self, reaction: Reaction) -> ReactionId {
        debug_assert_eq!(
            reaction.id().index(),
            self.reactions.len(),
            "reactions must be added in ascending ReactionId order \
             (their id doubles as topological priority)"
        );
        let id = reaction.id();
        self.reactions.push(reaction);
        id
    }

    pub fn build(self) -> Registry {
        Registry {
            triggers: self.triggers,
            reactions: self.reactions,
            startup_triggers: self.startup_triggers,
            shutdown_triggers: self.shutdown_triggers,
        }
    }
}
