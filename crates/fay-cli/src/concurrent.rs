//! `fay concurrent`: many threads dispatching through one shared manager.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use fay_events::{Capabilities, EventManager, Observe, ObserverHandle, OnEvent};
use tracing::{debug, info};

use crate::demo::{DoubleEvent, FloatEvent, IntEvent};

#[derive(Default)]
struct Counter {
    ints: AtomicUsize,
    floats: AtomicUsize,
}

impl OnEvent<IntEvent> for Counter {
    fn on_event(&self, _event: &IntEvent) {
        self.ints.fetch_add(1, Ordering::Relaxed);
    }
}

impl OnEvent<FloatEvent> for Counter {
    fn on_event(&self, _event: &FloatEvent) {
        self.floats.fetch_add(1, Ordering::Relaxed);
    }
}

impl Observe for Counter {
    fn declare(caps: &mut Capabilities<Self>) {
        caps.handles::<IntEvent>().handles::<FloatEvent>();
    }

    fn name(&self) -> &str {
        "Counter"
    }
}

/// Which event a dispatcher thread sends. Threads rotate through the three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Int,
    Float,
    Double,
}

impl Kind {
    fn for_thread(index: usize) -> Self {
        match index % 3 {
            0 => Self::Int,
            1 => Self::Float,
            _ => Self::Double,
        }
    }
}

/// Delivery counts observed by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConcurrentReport {
    pub(crate) threads: usize,
    pub(crate) rounds: usize,
    pub(crate) ints: usize,
    pub(crate) floats: usize,
    pub(crate) doubles: usize,
    pub(crate) churned: usize,
    pub(crate) elapsed: Duration,
}

impl fmt::Display for ConcurrentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} threads x {} rounds in {:.2?}",
            self.threads, self.rounds, self.elapsed
        )?;
        writeln!(f, "  IntEvent deliveries:    {}", self.ints)?;
        writeln!(f, "  FloatEvent deliveries:  {}", self.floats)?;
        writeln!(f, "  DoubleEvent deliveries: {}", self.doubles)?;
        write!(f, "  churning observer saw:  {}", self.churned)
    }
}

/// Expected per-kind totals for `threads` dispatchers sending `rounds` each.
fn expected(threads: usize, rounds: usize) -> Result<(usize, usize, usize)> {
    let (mut ints, mut floats, mut doubles) = (0usize, 0usize, 0usize);
    for index in 0..threads {
        let slot = match Kind::for_thread(index) {
            Kind::Int => &mut ints,
            Kind::Float => &mut floats,
            Kind::Double => &mut doubles,
        };
        *slot = slot
            .checked_add(rounds)
            .context("expected delivery count overflows")?;
    }
    Ok((ints, floats, doubles))
}

/// Spawn `threads` dispatchers sending `rounds` events each, plus one thread
/// that keeps subscribing and unsubscribing an extra observer, then check
/// that every resident observer saw exactly what was sent.
///
/// # Errors
///
/// Returns an error if `threads` or `rounds` is zero, or if any resident
/// observer's count differs from what was dispatched.
pub(crate) fn run(manager: &EventManager, threads: usize, rounds: usize) -> Result<ConcurrentReport> {
    ensure!(threads > 0, "at least one dispatcher thread is required");
    ensure!(rounds > 0, "at least one round is required");

    let counter = Arc::new(Counter::default());
    let counter_handle =
        ObserverHandle::new(Arc::clone(&counter)).context("failed to build counter")?;

    let doubles = Arc::new(AtomicUsize::new(0));
    let double_sink = Arc::clone(&doubles);
    let double_handle = ObserverHandle::builder("DoubleCounter")
        .on::<DoubleEvent, _>(move |_| {
            double_sink.fetch_add(1, Ordering::Relaxed);
        })
        .build()
        .context("failed to build double counter")?;

    let churned = Arc::new(AtomicUsize::new(0));
    let churn_sink = Arc::clone(&churned);
    let churn_handle = ObserverHandle::builder("Churn")
        .on::<IntEvent, _>(move |_| {
            churn_sink.fetch_add(1, Ordering::Relaxed);
        })
        .build()
        .context("failed to build churning observer")?;

    manager.subscribe(&counter_handle);
    manager.subscribe(&double_handle);

    info!(threads, rounds, "starting concurrent dispatch");
    let started = Instant::now();

    thread::scope(|s| {
        for index in 0..threads {
            s.spawn(move || {
                let kind = Kind::for_thread(index);
                debug!(index, ?kind, "dispatcher started");
                for _ in 0..rounds {
                    match kind {
                        Kind::Int => manager.dispatch(&IntEvent { value: 1 }),
                        Kind::Float => manager.dispatch(&FloatEvent { value: 1.0 }),
                        Kind::Double => manager.dispatch(&DoubleEvent { value: 1.0 }),
                    }
                }
            });
        }
        s.spawn(|| {
            for _ in 0..rounds {
                manager.subscribe(&churn_handle);
                manager.unsubscribe(&churn_handle);
            }
        });
    });

    let elapsed = started.elapsed();
    manager.unsubscribe(&counter_handle);
    manager.unsubscribe(&double_handle);

    let report = ConcurrentReport {
        threads,
        rounds,
        ints: counter.ints.load(Ordering::Relaxed),
        floats: counter.floats.load(Ordering::Relaxed),
        doubles: doubles.load(Ordering::Relaxed),
        churned: churned.load(Ordering::Relaxed),
        elapsed,
    };

    let (ints, floats, doubles) = expected(threads, rounds)?;
    ensure!(
        report.ints == ints,
        "IntEvent deliveries: expected {ints}, got {}",
        report.ints
    );
    ensure!(
        report.floats == floats,
        "FloatEvent deliveries: expected {floats}, got {}",
        report.floats
    );
    ensure!(
        report.doubles == doubles,
        "DoubleEvent deliveries: expected {doubles}, got {}",
        report.doubles
    );
    ensure!(
        report.churned <= ints,
        "churning observer saw {} IntEvents but only {ints} were sent",
        report.churned
    );

    info!(elapsed = ?report.elapsed, "concurrent dispatch verified");
    Ok(report)
}
