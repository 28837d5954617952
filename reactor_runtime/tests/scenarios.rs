//! End-to-end scenario tests for a running [`Scheduler`], one per
//! numbered scenario in the outer specification this crate implements.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reactor_core::Tag;
use reactor_runtime::{
    Config, Context, Reaction, ReactorState, RegistryBuilder, Scheduler, Trigger,
};

/// One timer at offset 0, period 50ns, stopped at 100ns: fires at 0, 50
/// and 100 (the stop check happens after draining the tag it lands on).
#[test]
fn timer_with_stop_fires_at_every_tick_through_stop_time() {
    let log = Arc::new(Mutex::new(Vec::<i64>::new()));

    let mut builder = RegistryBuilder::new();
    let rid = builder.next_reaction_id();
    let timer = builder.add_trigger(Trigger::new("tick", 0, 50).with_reactions([rid]));

    let log_clone = log.clone();
    builder.add_reaction(Reaction::new(
        "record_tick",
        rid,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            log_clone.lock().unwrap().push(ctx.tag().instant.as_nanos());
        },
    ));
    builder.mark_startup(timer);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(())];
    let mut scheduler = Scheduler::new(
        registry,
        states,
        Config {
            stop_time: Some(100),
            wait_specified: false,
            fast_forward: true,
        },
    );
    scheduler.run();

    assert_eq!(*log.lock().unwrap(), vec![0, 50, 100]);
}

/// R1 schedules a zero-delay follow-up trigger; its reaction (R2) must
/// run at the next microstep of the same instant, one `next()` call
/// later, with no new physical wait involved.
#[test]
fn zero_delay_schedule_advances_only_the_microstep() {
    let observed: Arc<Mutex<Vec<(i64, u32)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut builder = RegistryBuilder::new();
    let r1 = builder.next_reaction_id();
    let r2 = builder.next_reaction_id();
    let t2 = builder.add_trigger(Trigger::new("t2", 0, 0).with_reactions([r2]));
    let t1 = builder.add_trigger(Trigger::new("t1", 10, 0).with_reactions([r1]));

    let observed_r1 = observed.clone();
    builder.add_reaction(Reaction::new(
        "r1",
        r1,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            observed_r1
                .lock()
                .unwrap()
                .push((ctx.tag().instant.as_nanos(), ctx.tag().microstep));
            ctx.schedule(t2, 0, None);
        },
    ));

    let observed_r2 = observed.clone();
    builder.add_reaction(Reaction::new(
        "r2",
        r2,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            observed_r2
                .lock()
                .unwrap()
                .push((ctx.tag().instant.as_nanos(), ctx.tag().microstep));
            ctx.request_shutdown(0);
        },
    ));
    builder.mark_startup(t1);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(())];
    let mut scheduler = Scheduler::new(
        registry,
        states,
        Config {
            stop_time: None,
            wait_specified: false,
            fast_forward: true,
        },
    );
    scheduler.run();

    assert_eq!(*observed.lock().unwrap(), vec![(10, 0), (10, 1)]);
}

/// Two reactions triggered by the same event order by ascending
/// `ReactionId`, regardless of the order they appear in the trigger's
/// own reaction list.
#[test]
fn reactions_at_a_tag_run_in_ascending_id_order() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let mut builder = RegistryBuilder::new();
    let r_b = builder.next_reaction_id(); // id 0, fires first
    let r_a = builder.next_reaction_id(); // id 1, fires second
    let trigger = builder.add_trigger(Trigger::new("both", 20, 0).with_reactions([r_a, r_b]));

    let log_b = log.clone();
    builder.add_reaction(Reaction::new(
        "r_b",
        r_b,
        0,
        move |_ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            log_b.lock().unwrap().push("r_b");
        },
    ));
    let log_a = log.clone();
    builder.add_reaction(Reaction::new(
        "r_a",
        r_a,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            log_a.lock().unwrap().push("r_a");
            ctx.request_shutdown(0);
        },
    ));
    builder.mark_startup(trigger);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(())];
    let mut scheduler = Scheduler::new(
        registry,
        states,
        Config {
            stop_time: None,
            wait_specified: false,
            fast_forward: true,
        },
    );
    scheduler.run();

    assert_eq!(*log.lock().unwrap(), vec!["r_b", "r_a"]);
}

/// A reaction with a deadline so small that the scheduler's own
/// dispatch overhead exceeds it triggers the violation handler exactly
/// once, then still runs its own body.
#[test]
fn missed_deadline_invokes_handler_then_runs_reaction_anyway() {
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let body_calls = Arc::new(AtomicUsize::new(0));

    let mut builder = RegistryBuilder::new();

    let handler_rid = builder.next_reaction_id();
    let handler_trigger =
        builder.add_trigger(Trigger::new("deadline_violation", 0, 0).with_reactions([handler_rid]));
    let handler_calls_clone = handler_calls.clone();
    builder.add_reaction(Reaction::new(
        "handler",
        handler_rid,
        0,
        move |_ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            handler_calls_clone.fetch_add(1, Ordering::SeqCst);
        },
    ));

    let main_rid = builder.next_reaction_id();
    let main_trigger = builder.add_trigger(Trigger::new("startup", 0, 0).with_reactions([main_rid]));
    let body_calls_clone = body_calls.clone();
    builder.add_reaction(
        Reaction::new(
            "main",
            main_rid,
            0,
            move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
                body_calls_clone.fetch_add(1, Ordering::SeqCst);
                ctx.request_shutdown(0);
            },
        )
        .with_deadline(1, handler_trigger),
    );
    builder.mark_startup(main_trigger);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(())];
    // fast_forward still lets real, nonzero scheduler overhead accrue
    // between `start_time` and dispatch, which reliably exceeds a 1ns
    // deadline without this test needing to sleep.
    let mut scheduler = Scheduler::new(
        registry,
        states,
        Config {
            stop_time: None,
            wait_specified: false,
            fast_forward: true,
        },
    );
    scheduler.run();

    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    assert_eq!(body_calls.load(Ordering::SeqCst), 1);
}

/// A payload is readable while its trigger's reactions run and is
/// dropped exactly once, strictly after that tag's reactions complete.
#[test]
fn payload_is_readable_then_freed_exactly_once() {
    struct DropSignal(Arc<AtomicUsize>);
    impl Drop for DropSignal {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let freed = Arc::new(AtomicUsize::new(0));

    let mut builder = RegistryBuilder::new();

    let check_rid = builder.next_reaction_id();
    let check_trigger = builder.add_trigger(Trigger::new("check", 0, 0).with_reactions([check_rid]));
    let freed_for_check = freed.clone();
    builder.add_reaction(Reaction::new(
        "check",
        check_rid,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            assert_eq!(
                freed_for_check.load(Ordering::SeqCst),
                1,
                "payload should already be freed by the next tag"
            );
            ctx.request_shutdown(0);
        },
    ));

    let read_rid = builder.next_reaction_id();
    let payload_trigger =
        builder.add_trigger(Trigger::new("payload", 0, 0).with_reactions([read_rid]));
    let freed_for_read = freed.clone();
    builder.add_reaction(Reaction::new(
        "read",
        read_rid,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            assert!(ctx.read::<DropSignal>(payload_trigger).is_some());
            assert_eq!(freed_for_read.load(Ordering::SeqCst), 0);
            ctx.schedule(check_trigger, 1_000, None);
        },
    ));

    let kickoff_rid = builder.next_reaction_id();
    let kickoff_trigger =
        builder.add_trigger(Trigger::new("kickoff", 0, 0).with_reactions([kickoff_rid]));
    let freed_for_kickoff = freed.clone();
    builder.add_reaction(Reaction::new(
        "kickoff",
        kickoff_rid,
        0,
        move |ctx: &mut Context<'_>, _state: &mut dyn ReactorState| {
            ctx.schedule(
                payload_trigger,
                0,
                Some(Box::new(DropSignal(freed_for_kickoff.clone()))),
            );
        },
    ));
    builder.mark_startup(kickoff_trigger);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(())];
    let mut scheduler = Scheduler::new(
        registry,
        states,
        Config {
            stop_time: None,
            wait_specified: false,
            fast_forward: true,
        },
    );
    scheduler.run();

    assert_eq!(freed.load(Ordering::SeqCst), 1);
}

/// No timers, no `-wait`: the run ends immediately with zero logical
/// time elapsed.
#[test]
fn empty_queue_without_wait_terminates_immediately() {
    let registry = RegistryBuilder::new().build();
    let states: Vec<Box<dyn ReactorState>> = Vec::new();
    let mut scheduler = Scheduler::new(registry, states, Config::default());

    scheduler.run();

    assert_eq!(scheduler.current_tag(), Tag::ZERO);
}
