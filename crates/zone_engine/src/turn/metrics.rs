use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::{TickReport, Turn};

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

/// Throughput of the turn loop over the last reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnMetricsSnapshot {
    pub turns_per_second: f32,
    pub actions_dispatched: u32,
    pub unknown_actions: u32,
    pub listeners_fired: u32,
    pub faults: u32,
    pub current_turn: Turn,
}

/// Counts since the server was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnTotals {
    pub turns: u64,
    pub actions_dispatched: u64,
    pub unknown_actions: u64,
    pub listeners_fired: u64,
    pub faults: u64,
}

impl TurnTotals {
    fn add(&mut self, report: &TickReport) {
        self.turns += 1;
        self.actions_dispatched += u64::from(report.actions_dispatched);
        self.unknown_actions += u64::from(report.unknown_actions);
        self.listeners_fired += u64::from(report.listeners_fired);
        self.faults += u64::from(report.faults());
    }
}

#[derive(Debug, Default)]
struct TurnMetrics {
    interval: TurnMetricsSnapshot,
    totals: TurnTotals,
}

/// Read side shared with other threads. The turn thread records every tick
/// and publishes an interval snapshot whenever one closes.
#[derive(Clone, Debug, Default)]
pub struct TurnMetricsHandle {
    inner: Arc<RwLock<TurnMetrics>>,
}

impl TurnMetricsHandle {
    pub fn snapshot(&self) -> TurnMetricsSnapshot {
        self.read(|metrics| metrics.interval)
    }

    pub fn totals(&self) -> TurnTotals {
        self.read(|metrics| metrics.totals)
    }

    pub(crate) fn record(&self, report: &TickReport) {
        self.write(|metrics| metrics.totals.add(report));
    }

    pub(crate) fn publish(&self, snapshot: TurnMetricsSnapshot) {
        self.write(|metrics| metrics.interval = snapshot);
    }

    fn read<T>(&self, view: impl FnOnce(&TurnMetrics) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(|poisoned| {
            warn_poison_once("read");
            poisoned.into_inner()
        });
        view(&guard)
    }

    fn write(&self, update: impl FnOnce(&mut TurnMetrics)) {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| {
            warn_poison_once("write");
            poisoned.into_inner()
        });
        update(&mut guard);
    }
}

fn warn_poison_once(operation: &'static str) {
    if !METRICS_LOCK_POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    turns: u32,
    actions_dispatched: u32,
    unknown_actions: u32,
    listeners_fired: u32,
    faults: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            turns: 0,
            actions_dispatched: 0,
            unknown_actions: 0,
            listeners_fired: 0,
            faults: 0,
        }
    }

    pub(crate) fn record_turn(&mut self, report: &TickReport) {
        self.turns = self.turns.saturating_add(1);
        self.actions_dispatched = self
            .actions_dispatched
            .saturating_add(report.actions_dispatched);
        self.unknown_actions = self.unknown_actions.saturating_add(report.unknown_actions);
        self.listeners_fired = self.listeners_fired.saturating_add(report.listeners_fired);
        self.faults = self.faults.saturating_add(report.faults());
    }

    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        current_turn: Turn,
    ) -> Option<TurnMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = TurnMetricsSnapshot {
            turns_per_second: self.turns as f32 / elapsed_seconds,
            actions_dispatched: self.actions_dispatched,
            unknown_actions: self.unknown_actions,
            listeners_fired: self.listeners_fired,
            faults: self.faults,
            current_turn,
        };

        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<TurnMetrics>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_sums_reports_over_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(2));
        let report = TickReport {
            turn: Turn(1),
            actions_dispatched: 3,
            unknown_actions: 1,
            listeners_fired: 2,
            action_faults: 1,
            listener_faults: 0,
            ..TickReport::default()
        };
        for _ in 0..4 {
            accumulator.record_turn(&report);
        }

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), Turn(4))
            .expect("snapshot should be emitted");

        assert!((snapshot.turns_per_second - 2.0).abs() < 0.05);
        assert_eq!(snapshot.actions_dispatched, 12);
        assert_eq!(snapshot.unknown_actions, 4);
        assert_eq!(snapshot.listeners_fired, 8);
        assert_eq!(snapshot.faults, 4);
        assert_eq!(snapshot.current_turn, Turn(4));
    }

    #[test]
    fn snapshot_not_emitted_before_interval_and_resets_after() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_turn(&TickReport::default());

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500), Turn(1))
            .is_none());
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_secs(1), Turn(1))
            .is_some());
        let empty = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), Turn(1))
            .expect("second interval");
        assert_eq!(empty.turns_per_second, 0.0);
    }

    #[test]
    fn handle_recovers_after_poison_without_panic() {
        let handle = TurnMetricsHandle::default();
        poison_lock(handle.inner.as_ref());

        assert_eq!(handle.snapshot(), TurnMetricsSnapshot::default());
        assert_eq!(handle.totals(), TurnTotals::default());

        let expected = TurnMetricsSnapshot {
            turns_per_second: 3.3,
            current_turn: Turn(9),
            ..TurnMetricsSnapshot::default()
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }

    #[test]
    fn totals_keep_counting_across_intervals() {
        let handle = TurnMetricsHandle::default();
        let report = TickReport {
            actions_dispatched: 2,
            unknown_actions: 1,
            listeners_fired: 1,
            listener_faults: 1,
            ..TickReport::default()
        };
        handle.record(&report);
        handle.publish(TurnMetricsSnapshot::default());
        handle.record(&report);

        assert_eq!(
            handle.totals(),
            TurnTotals {
                turns: 2,
                actions_dispatched: 4,
                unknown_actions: 2,
                listeners_fired: 2,
                faults: 2,
            }
        );
    }
}
