//! The single-threaded event loop and lifecycle driver, grounded on a C
//! reactor runtime's `next()`/`main()` functions and on `sched/nonfed.rs`'s
//! `Scheduler`/`Config`/`event_loop`.

use std::cell::Cell;

use reactor_core::{Instant, Interval, ReactionId, Tag};

use crate::context::{Context, ContextInternal};
use crate::event::{Event, ReactionQueue};
use crate::pool::EventPool;
use crate::queue::BinaryMinHeap;
use crate::registry::{Registry, ReactorState};

/// Runtime knobs corresponding to the CLI surface
/// (`-stop`/`-wait`/`-fast`; `-threads` is accepted by the CLI binary but
/// has no effect on this single-threaded core).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Wall-clock-independent logical duration after which the run stops,
    /// nanoseconds from tag zero. `None` means "run until the queue
    /// drains" (`-stop` unset).
    pub stop_time: Option<Interval>,
    /// `-wait`: keep waiting on an empty queue instead of terminating.
    /// `-fast`: never sleep for physical time to catch up to logical time.
    pub fast_forward: bool,
}

/// Drives one program's [`Registry`] to completion.
///
/// `states` holds one reactor's private data per slot; a [`Reaction`]'s
/// `reactor()` index selects which slot its body is invoked against.
pub struct Scheduler {
    registry: Registry,
    states: Vec<Box<dyn ReactorState>>,
    event_q: BinaryMinHeap<Event>,
    reaction_q: ReactionQueue,
    pool: EventPool,
    /// Triggers whose scratch payload is still owed a release once the
    /// tag's reactions have all run (see `pool.rs` for why this lives
    /// here rather than in a second object pool).
    pending_release: Vec<reactor_core::TriggerId>,
    current_tag: Tag,
    start_time: std::time::Instant,
    next_handle: Cell<i64>,
    stop_instant: Option<Instant>,
    wait_specified: bool,
    fast_forward: bool,
    stopped: bool,
    shutdown_fired: bool,
}

impl Scheduler {
    pub fn new(registry: Registry, states: Vec<Box<dyn ReactorState>>, config: Config) -> Self {
        let num_reactions = registry.len_reactions();
        Self {
            registry,
            states,
            event_q: BinaryMinHeap::new(),
            reaction_q: ReactionQueue::new(num_reactions),
            pool: EventPool::new(),
            pending_release: Vec::new(),
            current_tag: Tag::ZERO,
            start_time: std::time::Instant::now(),
            next_handle: Cell::new(0),
            stop_instant: config.stop_time.map(Instant::from_nanos),
            wait_specified: config.wait_specified,
            fast_forward: config.fast_forward,
            stopped: false,
            shutdown_fired: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current_tag(&self) -> Tag {
        self.current_tag
    }

    /// Run to completion: `initialize()`, then `next()` until it returns
    /// `false`, then `wrapup()`.
    pub fn run(&mut self) {
        self.initialize();
        while self.next() {}
        self.wrapup();
    }

    /// Records the physical start time, sets the current tag to `(0, 0)`,
    /// and schedules the initial firing of every startup trigger — the
    /// generated `start_timers()` hook, folded in here since this core
    /// has no separate code generator.
    pub fn initialize(&mut self) {
        self.start_time = std::time::Instant::now();
        self.current_tag = Tag::ZERO;
        let startups = self.registry.startup_triggers().to_vec();
        for trigger_id in startups {
            let offset = self.registry.trigger(trigger_id).offset().max(0);
            let tag = Tag::new(Instant::from_nanos(offset), 0);
            let event = self.pool.acquire(trigger_id, tag, None);
            self.event_q.insert(event);
        }
        tracing::info!(
            triggers = self.registry.triggers().len(),
            reactions = self.registry.len_reactions(),
            "scheduler initialized"
        );
    }

    /// One iteration of the event loop. Returns `false` once the run
    /// should stop.
    pub fn next(&mut self) -> bool {
        if self.stopped {
            return false;
        }

        let head_tag = match self.event_q.peek().map(|e| e.tag) {
            Some(tag) => tag,
            None if self.wait_specified => {
                // The source leaves "empty queue, `-wait` set"
                // unspecified. With a stop time configured we wait for
                // it and then stop, since that is the only way the run
                // can ever end; with none configured a single-threaded
                // core has no path for a new event to appear, so there
                // is nothing left to wait for either.
                if let Some(stop) = self.stop_instant {
                    self.wait_until(stop);
                }
                return self.terminate();
            }
            None => return self.terminate(),
        };

        if let Some(stop) = self.stop_instant {
            if head_tag.instant > stop {
                return self.terminate();
            }
        }

        self.wait_until(head_tag.instant);
        self.current_tag = head_tag;

        while let Some(tag) = self.event_q.peek().map(|e| e.tag) {
            if tag != self.current_tag {
                break;
            }
            let event = self.event_q.pop().expect("just peeked");
            self.drain_event(event);
        }

        while let Some(reaction_id) = self.reaction_q.pop() {
            self.dispatch(reaction_id);
        }

        for trigger_id in std::mem::take(&mut self.pending_release) {
            self.registry.trigger(trigger_id).set_payload(None);
        }

        if let Some(stop) = self.stop_instant {
            if self.current_tag.instant >= stop {
                return self.terminate();
            }
        }

        true
    }

    /// Block until physical time reaches `target`, unless `-fast` is
    /// set. Single-threaded, so there is nothing that
    /// could interrupt the sleep with a new, earlier event (the dead
    /// "interrupted wait" branch the source documents only applies to
    /// multi-threaded schedulers).
    fn wait_until(&self, target: Instant) {
        if self.fast_forward {
            return;
        }
        let now = Instant::from(self.start_time.elapsed());
        if target > now {
            let nanos = target.since(now).max(0) as u64;
            std::thread::sleep(std::time::Duration::from_nanos(nanos));
        }
    }

    /// Drain one event at the current tag. Enqueues its reactions,
    /// reschedules it if periodic, and moves its payload into the
    /// trigger's scratch cell for those reactions to read.
    fn drain_event(&mut self, mut event: Event) {
        let trigger_id = event.trigger;
        let (offset, period, reactions) = {
            let trigger = self.registry.trigger(trigger_id);
            (trigger.offset(), trigger.period(), trigger.reactions().to_vec())
        };

        for reaction_id in reactions {
            self.reaction_q.insert(reaction_id);
        }

        if period > 0 {
            // Mirrors the source's `schedule(trigger, period - offset)`:
            // re-adding the trigger's own offset here cancels back out,
            // landing the next firing exactly `period` after this one.
            let redelay = period - offset;
            let delay = offset.saturating_add(redelay).max(0);
            let refire_tag = if delay == 0 {
                self.current_tag.next_microstep()
            } else {
                self.current_tag.after(delay)
            };
            let refire = self.pool.acquire(trigger_id, refire_tag, None);
            self.event_q.insert(refire);
        }

        let payload = event.payload.take();
        let had_payload = payload.is_some();
        self.registry.trigger(trigger_id).set_payload(payload);
        if had_payload {
            self.pending_release.push(trigger_id);
        }
        self.pool.recycle(event);
    }

    /// Deadline check, then dispatch: invoke the violation handler's
    /// reactions (if a deadline was set and missed), then invoke
    /// `reaction_id`'s body regardless. No output chaining from the
    /// violation handler into `reaction_id` — matches the source's own
    /// documented limitation.
    fn dispatch(&mut self, reaction_id: ReactionId) {
        let (deadline, violation_trigger) = {
            let reaction = self.registry.reaction(reaction_id);
            (reaction.deadline(), reaction.deadline_violation_trigger())
        };

        if deadline > 0 {
            let lag = self
                .physical_now()
                .as_nanos()
                .saturating_sub(self.current_tag.instant.as_nanos());
            if lag > deadline {
                tracing::warn!(
                    reaction = self.registry.reaction(reaction_id).name(),
                    lag,
                    deadline,
                    "reaction deadline violated"
                );
                if let Some(trigger_id) = violation_trigger {
                    let handlers = self.registry.trigger(trigger_id).reactions().to_vec();
                    for handler_id in handlers {
                        self.run_reaction_body(handler_id);
                    }
                }
            }
        }

        self.run_reaction_body(reaction_id);
    }

    /// Construct a [`Context`], invoke one reaction's body against its
    /// reactor state, and fold the effects it recorded (newly scheduled
    /// events, same-tag triggers, a shutdown request) back into the
    /// scheduler.
    fn run_reaction_body(&mut self, reaction_id: ReactionId) {
        let reactor_index = self.registry.reaction(reaction_id).reactor() as usize;

        let mut ctx = Context::new(self.start_time, self.current_tag, &self.registry, &self.next_handle);
        let reaction = self.registry.reaction(reaction_id);
        let state: &mut dyn ReactorState = &mut *self.states[reactor_index];
        reaction.invoke(&mut ctx, state);

        let ContextInternal {
            scheduled_events,
            triggered_now,
            shutdown_at,
        } = ctx.internal;

        for event in scheduled_events {
            self.event_q.insert(event);
        }
        for trigger_id in triggered_now {
            let reactions = self.registry.trigger(trigger_id).reactions().to_vec();
            for r in reactions {
                self.reaction_q.insert(r);
            }
        }
        if let Some(tag) = shutdown_at {
            self.schedule_shutdown_at(tag);
        }
    }

    /// A reaction called `Context::request_shutdown`: queue the
    /// registered shutdown triggers' events at `tag`, same as the
    /// generated code would for a reactor-declared shutdown trigger.
    fn schedule_shutdown_at(&mut self, tag: Tag) {
        let shutdown_triggers = self.registry.shutdown_triggers().to_vec();
        for trigger_id in shutdown_triggers {
            let event = self.pool.acquire(trigger_id, tag, None);
            self.event_q.insert(event);
        }
        let bound = tag.instant.as_nanos();
        self.stop_instant = Some(match self.stop_instant {
            Some(existing) if existing.as_nanos() <= bound => existing,
            _ => Instant::from_nanos(bound),
        });
    }

    fn physical_now(&self) -> Instant {
        Instant::from(self.start_time.elapsed())
    }

    fn terminate(&mut self) -> bool {
        if !self.shutdown_fired {
            self.shutdown_fired = true;
            let shutdown_triggers = self.registry.shutdown_triggers().to_vec();
            for trigger_id in shutdown_triggers {
                let reactions = self.registry.trigger(trigger_id).reactions().to_vec();
                for reaction_id in reactions {
                    self.run_reaction_body(reaction_id);
                }
            }
        }
        self.stopped = true;
        false
    }

    /// Logs elapsed logical and physical time.
    fn wrapup(&self) {
        tracing::info!(
            logical_elapsed = %self.current_tag.instant,
            physical_elapsed = ?self.start_time.elapsed(),
            "scheduler stopped"
        );
    }
}
