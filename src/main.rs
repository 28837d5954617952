//! Demo binary: wires up a small reactor program by hand (there is no
//! code generator in this crate; see `reactor_runtime::RegistryBuilder`)
//! and runs it to completion under the CLI flags documented below.

use anyhow::Context;
use clap::Parser;

use reactor_runtime::{Config, Context as ReactionContext, Reaction, ReactorState, Registry, RegistryBuilder, Scheduler, Trigger};

/// A deterministic discrete-event reactor scheduler.
#[derive(clap::Parser)]
struct Args {
    /// Stop after this much logical time has elapsed, e.g. "2s", "500ms".
    #[arg(long, short = 's')]
    stop: Option<humantime::Duration>,

    /// Keep waiting on an empty event queue instead of terminating.
    #[arg(long, short = 'w')]
    wait: bool,

    /// Run without pacing to physical time.
    #[arg(long, short = 'f')]
    fast: bool,

    /// Reserved for a future multi-threaded scheduler; accepted so
    /// existing invocations of the CLI surface keep working.
    #[arg(long, short = 't', default_value_t = 1)]
    threads: usize,
}

impl Args {
    fn into_scheduler_config(self) -> anyhow::Result<Config> {
        if self.threads == 0 {
            anyhow::bail!("--threads must be at least 1");
        }
        Ok(Config {
            stop_time: self.stop.map(|d| d.as_nanos() as i64),
            wait_specified: self.wait,
            fast_forward: self.fast,
        })
    }
}

/// State for the single demo reactor: a counter driven by a periodic timer.
struct Counter {
    ticks: u32,
}

fn build_demo() -> (Registry, Vec<Box<dyn ReactorState>>) {
    let mut builder = RegistryBuilder::new();

    let print_tick = builder.next_reaction_id();
    let timer = builder.add_trigger(
        Trigger::new("tick", 0, 500_000_000 /* 500ms */).with_reactions([print_tick]),
    );

    builder.add_reaction(Reaction::new(
        "print_tick",
        print_tick,
        0,
        move |ctx: &mut ReactionContext<'_>, state: &mut dyn ReactorState| {
            let counter = state
                .as_any_mut()
                .downcast_mut::<Counter>()
                .expect("reactor 0 is the Counter state");
            counter.ticks += 1;
            tracing::info!(tag = %ctx.tag(), ticks = counter.ticks, "tick");
            if counter.ticks >= 10 {
                ctx.request_shutdown(0);
            }
        },
    ));
    builder.mark_startup(timer);

    let registry = builder.build();
    let states: Vec<Box<dyn ReactorState>> = vec![Box::new(Counter { ticks: 0 })];
    (registry, states)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = args
        .into_scheduler_config()
        .context("invalid command-line arguments")?;

    let (registry, states) = build_demo();
    let mut scheduler = Scheduler::new(registry, states, config);
    scheduler.run();

    Ok(())
}
