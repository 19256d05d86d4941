use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::metrics::MetricsAccumulator;
use super::notifier::DueListener;
use super::{contain, Fault, Rearm, Turn, TurnContext, TurnMetricsHandle, TurnNotifier};
use crate::action::{Action, ActionDispatcher, DispatchOutcome};
use crate::config::TurnLoopConfig;
use crate::world::{Identifier, World, WorldUpdateReport};

const FALLBACK_TURN_DURATION: Duration = Duration::from_millis(300);
const FALLBACK_METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// An action handed to the turn thread together with the player who sent it.
#[derive(Debug)]
pub struct SubmittedAction {
    pub player: Identifier,
    pub action: Action,
}

#[derive(Debug, Error)]
#[error("turn server stopped; action `{}` from {} was not queued", .0.action.kind(), .0.player)]
pub struct ServerClosed(pub SubmittedAction);

/// Cloneable entry point for decoders running on other threads.
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: Sender<SubmittedAction>,
}

impl ActionSender {
    pub fn submit(&self, player: Identifier, action: Action) -> Result<(), ServerClosed> {
        self.tx
            .send(SubmittedAction { player, action })
            .map_err(|err| ServerClosed(err.0))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub turn: Turn,
    pub actions_dispatched: u32,
    pub unknown_actions: u32,
    pub action_faults: u32,
    pub listeners_fired: u32,
    pub listener_faults: u32,
    pub world: WorldUpdateReport,
}

impl TickReport {
    pub fn faults(&self) -> u32 {
        let zone_faults = u32::try_from(self.world.faults).unwrap_or(u32::MAX);
        self.action_faults
            .saturating_add(self.listener_faults)
            .saturating_add(zone_faults)
    }
}

/// Owns the world and drives it one turn at a time. Everything that touches
/// zone state runs inside [`TurnServer::tick`] on the thread that owns the
/// server.
pub struct TurnServer {
    config: TurnLoopConfig,
    world: World,
    notifier: TurnNotifier,
    dispatcher: ActionDispatcher,
    inbox: Receiver<SubmittedAction>,
    sender: Sender<SubmittedAction>,
    metrics: TurnMetricsHandle,
}

impl TurnServer {
    pub fn new(config: TurnLoopConfig, world: World, dispatcher: ActionDispatcher) -> Self {
        let (sender, inbox) = mpsc::channel();
        Self {
            config,
            world,
            notifier: TurnNotifier::new(),
            dispatcher,
            inbox,
            sender,
            metrics: TurnMetricsHandle::default(),
        }
    }

    pub fn action_sender(&self) -> ActionSender {
        ActionSender {
            tx: self.sender.clone(),
        }
    }

    pub fn metrics_handle(&self) -> TurnMetricsHandle {
        self.metrics.clone()
    }

    pub fn config(&self) -> &TurnLoopConfig {
        &self.config
    }

    pub fn current_turn(&self) -> Turn {
        self.notifier.current_turn()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn notifier(&self) -> &TurnNotifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut TurnNotifier {
        &mut self.notifier
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Dispatches one action immediately against the current turn, outside
    /// the queued feed.
    pub fn dispatch_now(&mut self, player: &Identifier, action: &Action) -> DispatchOutcome {
        let mut ctx = TurnContext {
            turn: self.notifier.current_turn(),
            world: &mut self.world,
            notifier: &mut self.notifier,
        };
        self.dispatcher.dispatch(&mut ctx, player, action)
    }

    /// Runs one turn: advance the clock, drain queued actions in arrival
    /// order, fire listeners due at or before the new turn, then update every
    /// zone.
    pub fn tick(&mut self) -> TickReport {
        let (turn, due) = self.notifier.advance();
        let mut report = TickReport {
            turn,
            ..TickReport::default()
        };

        self.drain_actions(turn, &mut report);
        self.fire_listeners(turn, due, &mut report);
        report.world = self.world.update_zones(turn);
        self.metrics.record(&report);

        debug!(
            turn = %turn,
            actions = report.actions_dispatched,
            listeners = report.listeners_fired,
            moved = report.world.entities_moved,
            faults = report.faults(),
            "turn_completed"
        );
        report
    }

    fn drain_actions(&mut self, turn: Turn, report: &mut TickReport) {
        let budget = self.config.max_actions_per_turn.max(1);
        for _ in 0..budget {
            let submitted = match self.inbox.try_recv() {
                Ok(submitted) => submitted,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return,
            };
            let mut ctx = TurnContext {
                turn,
                world: &mut self.world,
                notifier: &mut self.notifier,
            };
            match self
                .dispatcher
                .dispatch(&mut ctx, &submitted.player, &submitted.action)
            {
                DispatchOutcome::Handled => report.actions_dispatched += 1,
                DispatchOutcome::UnknownType => report.unknown_actions += 1,
                DispatchOutcome::Faulted => {
                    report.actions_dispatched += 1;
                    report.action_faults += 1;
                }
            }
        }
    }

    fn fire_listeners(&mut self, turn: Turn, due: Vec<DueListener>, report: &mut TickReport) {
        for DueListener { key, mut listener } in due {
            if !self.notifier.begin_firing(&key) {
                debug!(turn = %turn, key = %key, "turn_listener_cancelled");
                continue;
            }
            report.listeners_fired += 1;

            let mut ctx = TurnContext {
                turn,
                world: &mut self.world,
                notifier: &mut self.notifier,
            };
            match contain(|| listener.on_turn_reached(&mut ctx)) {
                Ok(Rearm::Done) => {}
                Ok(Rearm::After(turns)) => {
                    self.notifier
                        .schedule(turn.after(turns.max(1)), key, listener);
                }
                Err(Fault::Failed(err)) => {
                    report.listener_faults += 1;
                    warn!(turn = %turn, key = %key, error = %err, "turn_listener_failed");
                }
                Err(Fault::Panicked(message)) => {
                    report.listener_faults += 1;
                    error!(turn = %turn, key = %key, panic = %message, "turn_listener_panicked");
                }
            }
        }
    }

    /// Real-time loop. Ticks at the configured cadence until `shutdown` is
    /// requested or `max_turns` is reached, and returns the last turn run.
    pub fn run(&mut self, shutdown: &ShutdownHandle) -> Turn {
        let turn_duration =
            normalize_non_zero_duration(self.config.turn_duration, FALLBACK_TURN_DURATION);
        let max_turns_per_wake = self.config.max_turns_per_wake.max(1);
        let metrics_log_interval =
            normalize_non_zero_duration(self.config.metrics_log_interval, FALLBACK_METRICS_INTERVAL);

        info!(
            turn_ms = turn_duration.as_millis() as u64,
            max_turns_per_wake,
            max_actions_per_turn = self.config.max_actions_per_turn,
            metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
            max_turns = ?self.config.max_turns,
            zone_count = self.world.zone_count(),
            "loop_config"
        );

        let mut accumulator = Duration::ZERO;
        let mut last_wake = Instant::now();
        let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

        let reason = loop {
            if shutdown.is_requested() {
                break "shutdown_requested";
            }
            if self.reached_turn_limit() {
                break "max_turns";
            }

            let now = Instant::now();
            accumulator = accumulator.saturating_add(now.saturating_duration_since(last_wake));
            last_wake = now;

            let plan = plan_turns(accumulator, turn_duration, max_turns_per_wake);
            for _ in 0..plan.turns_to_run {
                let report = self.tick();
                metrics_accumulator.record_turn(&report);
                if self.reached_turn_limit() {
                    break;
                }
            }
            accumulator = plan.remaining_accumulator;

            if plan.dropped_backlog > Duration::ZERO {
                warn!(
                    dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                    max_turns_per_wake, "turn_backlog_dropped"
                );
            }

            if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now, self.current_turn()) {
                self.metrics.publish(snapshot);
                info!(
                    turns_per_second = snapshot.turns_per_second,
                    actions_dispatched = snapshot.actions_dispatched,
                    unknown_actions = snapshot.unknown_actions,
                    listeners_fired = snapshot.listeners_fired,
                    faults = snapshot.faults,
                    turn = %snapshot.current_turn,
                    pending_listeners = self.notifier.pending_count(),
                    "loop_metrics"
                );
            }

            thread::sleep(turn_duration.saturating_sub(accumulator));
        };

        info!(reason, turn = %self.current_turn(), "shutdown");
        self.current_turn()
    }

    fn reached_turn_limit(&self) -> bool {
        self.config
            .max_turns
            .is_some_and(|max_turns| self.current_turn().0 >= max_turns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TurnPlan {
    turns_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_turns(mut accumulator: Duration, turn_duration: Duration, max_turns: u32) -> TurnPlan {
    let mut turns_to_run = 0u32;

    while accumulator >= turn_duration && turns_to_run < max_turns {
        accumulator = accumulator.saturating_sub(turn_duration);
        turns_to_run = turns_to_run.saturating_add(1);
    }

    if accumulator >= turn_duration {
        TurnPlan {
            turns_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        TurnPlan {
            turns_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
