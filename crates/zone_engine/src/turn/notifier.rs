use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use super::{Turn, TurnContext};
use crate::error::HandlerError;

/// Stable name chosen by whoever schedules a listener. Two registrations with
/// the same key for the same turn are coalesced; cancellation is by key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey(String);

impl ListenerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ListenerKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ListenerKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a listener wants after it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    Done,
    /// Fire again this many turns later under the same key.
    After(u64),
}

pub trait TurnListener {
    fn on_turn_reached(&mut self, ctx: &mut TurnContext<'_>) -> Result<Rearm, HandlerError>;
}

impl<F> TurnListener for F
where
    F: FnMut(&mut TurnContext<'_>) -> Result<Rearm, HandlerError>,
{
    fn on_turn_reached(&mut self, ctx: &mut TurnContext<'_>) -> Result<Rearm, HandlerError> {
        self(ctx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(Turn),
    /// The key was already scheduled for this turn; the new listener was dropped.
    Coalesced(Turn),
}

impl ScheduleOutcome {
    pub fn due(self) -> Turn {
        match self {
            Self::Scheduled(turn) | Self::Coalesced(turn) => turn,
        }
    }
}

pub(crate) struct DueListener {
    pub(crate) key: ListenerKey,
    pub(crate) listener: Box<dyn TurnListener>,
}

/// Pending turn callbacks ordered by due turn, then by registration order.
#[derive(Default)]
pub struct TurnNotifier {
    current_turn: Turn,
    pending: BTreeMap<Turn, Vec<DueListener>>,
    due_turns_by_key: HashMap<ListenerKey, BTreeSet<Turn>>,
    in_flight: HashSet<ListenerKey>,
    cancelled_in_flight: HashSet<ListenerKey>,
}

impl fmt::Debug for TurnNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnNotifier")
            .field("current_turn", &self.current_turn)
            .field("pending_count", &self.pending_count())
            .finish()
    }
}

impl TurnNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_turn(&self) -> Turn {
        self.current_turn
    }

    /// Schedules `listener` `turns` turns from now. Zero means the next turn.
    pub fn notify_in(
        &mut self,
        turns: u64,
        key: impl Into<ListenerKey>,
        listener: impl TurnListener + 'static,
    ) -> ScheduleOutcome {
        let due = self.current_turn.after(turns.max(1));
        self.schedule(due, key.into(), Box::new(listener))
    }

    /// Schedules `listener` for an absolute turn. Turns that are already
    /// current or past are moved to the next turn rather than dropped.
    pub fn notify_at(
        &mut self,
        turn: Turn,
        key: impl Into<ListenerKey>,
        listener: impl TurnListener + 'static,
    ) -> ScheduleOutcome {
        self.schedule(turn, key.into(), Box::new(listener))
    }

    pub(crate) fn schedule(
        &mut self,
        turn: Turn,
        key: ListenerKey,
        listener: Box<dyn TurnListener>,
    ) -> ScheduleOutcome {
        let due = turn.max(self.current_turn.next());
        let due_turns = self.due_turns_by_key.entry(key.clone()).or_default();
        if !due_turns.insert(due) {
            debug!(key = %key, due = %due, "turn_listener_coalesced");
            return ScheduleOutcome::Coalesced(due);
        }
        self.pending
            .entry(due)
            .or_default()
            .push(DueListener { key, listener });
        ScheduleOutcome::Scheduled(due)
    }

    /// Drops every pending registration under `key`, including one collected
    /// for the tick in progress that has not fired yet. Returns how many were
    /// removed.
    pub fn cancel(&mut self, key: &ListenerKey) -> usize {
        let mut removed = 0;
        if let Some(due_turns) = self.due_turns_by_key.remove(key) {
            for due in due_turns {
                removed += self.remove_pending(due, key);
            }
        }
        if self.in_flight.remove(key) {
            self.cancelled_in_flight.insert(key.clone());
            removed += 1;
        }
        removed
    }

    /// Drops the registration of `key` for one specific turn. The current
    /// turn's registration can still be dropped while its tick is in progress.
    pub fn cancel_at(&mut self, turn: Turn, key: &ListenerKey) -> bool {
        if turn == self.current_turn && self.in_flight.remove(key) {
            self.cancelled_in_flight.insert(key.clone());
            return true;
        }
        let Some(due_turns) = self.due_turns_by_key.get_mut(key) else {
            return false;
        };
        if !due_turns.remove(&turn) {
            return false;
        }
        if due_turns.is_empty() {
            self.due_turns_by_key.remove(key);
        }
        self.remove_pending(turn, key) > 0
    }

    /// True while `key` has a registration that has not fired, counting one
    /// collected for the tick in progress.
    pub fn is_scheduled(&self, key: &ListenerKey) -> bool {
        self.next_due(key).is_some()
    }

    pub fn next_due(&self, key: &ListenerKey) -> Option<Turn> {
        if self.in_flight.contains(key) {
            return Some(self.current_turn);
        }
        self.due_turns_by_key
            .get(key)
            .and_then(|turns| turns.iter().next().copied())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Advances the clock by one and removes everything due at or before the
    /// new turn, in due-turn then registration order.
    pub(crate) fn advance(&mut self) -> (Turn, Vec<DueListener>) {
        self.current_turn = self.current_turn.next();
        self.in_flight.clear();
        self.cancelled_in_flight.clear();

        let later = self.pending.split_off(&self.current_turn.next());
        let due_now = std::mem::replace(&mut self.pending, later);

        let mut due = Vec::new();
        for (turn, listeners) in due_now {
            for entry in listeners {
                if let Some(due_turns) = self.due_turns_by_key.get_mut(&entry.key) {
                    due_turns.remove(&turn);
                    if due_turns.is_empty() {
                        self.due_turns_by_key.remove(&entry.key);
                    }
                }
                self.in_flight.insert(entry.key.clone());
                due.push(entry);
            }
        }
        (self.current_turn, due)
    }

    /// Claims a collected listener for firing. False when it was cancelled
    /// after collection.
    pub(crate) fn begin_firing(&mut self, key: &ListenerKey) -> bool {
        if self.cancelled_in_flight.remove(key) {
            return false;
        }
        self.in_flight.remove(key);
        true
    }

    fn remove_pending(&mut self, turn: Turn, key: &ListenerKey) -> usize {
        let Some(listeners) = self.pending.get_mut(&turn) else {
            return 0;
        };
        let before = listeners.len();
        listeners.retain(|entry| &entry.key != key);
        let removed = before - listeners.len();
        if listeners.is_empty() {
            self.pending.remove(&turn);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl TurnListener {
        |_ctx: &mut TurnContext<'_>| -> Result<Rearm, HandlerError> { Ok(Rearm::Done) }
    }

    fn keys(due: &[DueListener]) -> Vec<&str> {
        due.iter().map(|entry| entry.key.as_str()).collect()
    }

    #[test]
    fn advance_is_monotonic_by_one() {
        let mut notifier = TurnNotifier::new();
        for expected in 1..=5 {
            let (turn, _) = notifier.advance();
            assert_eq!(turn, Turn(expected));
        }
    }

    #[test]
    fn listeners_fire_at_their_due_turn_in_registration_order() {
        let mut notifier = TurnNotifier::new();
        notifier.notify_in(2, "b", noop());
        notifier.notify_in(2, "a", noop());
        notifier.notify_in(1, "first", noop());

        let (_, due) = notifier.advance();
        assert_eq!(keys(&due), vec!["first"]);
        let (_, due) = notifier.advance();
        assert_eq!(keys(&due), vec!["b", "a"]);
        let (_, due) = notifier.advance();
        assert!(due.is_empty());
        assert_eq!(notifier.pending_count(), 0);
    }

    #[test]
    fn past_due_registration_fires_on_next_tick() {
        let mut notifier = TurnNotifier::new();
        for _ in 0..10 {
            notifier.advance();
        }

        let outcome = notifier.notify_at(Turn(5), "late", noop());
        assert_eq!(outcome, ScheduleOutcome::Scheduled(Turn(11)));

        let (turn, due) = notifier.advance();
        assert_eq!(turn, Turn(11));
        assert_eq!(keys(&due), vec!["late"]);
    }

    #[test]
    fn zero_delay_means_next_turn() {
        let mut notifier = TurnNotifier::new();
        assert_eq!(notifier.notify_in(0, "now", noop()).due(), Turn(1));
    }

    #[test]
    fn same_key_same_turn_is_coalesced() {
        let mut notifier = TurnNotifier::new();
        assert_eq!(
            notifier.notify_in(3, "offer:7", noop()),
            ScheduleOutcome::Scheduled(Turn(3))
        );
        assert_eq!(
            notifier.notify_in(3, "offer:7", noop()),
            ScheduleOutcome::Coalesced(Turn(3))
        );
        assert_eq!(
            notifier.notify_in(4, "offer:7", noop()),
            ScheduleOutcome::Scheduled(Turn(4))
        );
        assert_eq!(
            notifier.notify_in(3, "offer:8", noop()),
            ScheduleOutcome::Scheduled(Turn(3))
        );
        assert_eq!(notifier.pending_count(), 3);
    }

    #[test]
    fn cancel_removes_all_registrations_for_key() {
        let mut notifier = TurnNotifier::new();
        let key = ListenerKey::from("warn");
        notifier.notify_in(2, key.clone(), noop());
        notifier.notify_in(5, key.clone(), noop());
        notifier.notify_in(2, "other", noop());

        assert_eq!(notifier.next_due(&key), Some(Turn(2)));
        assert_eq!(notifier.cancel(&key), 2);
        assert!(!notifier.is_scheduled(&key));
        assert_eq!(notifier.cancel(&key), 0);

        let mut fired = Vec::new();
        for _ in 0..6 {
            let (_, due) = notifier.advance();
            fired.extend(due.into_iter().map(|entry| entry.key));
        }
        assert_eq!(fired, vec![ListenerKey::from("other")]);
    }

    #[test]
    fn cancel_at_only_touches_one_turn() {
        let mut notifier = TurnNotifier::new();
        let key = ListenerKey::from("warn");
        notifier.notify_in(2, key.clone(), noop());
        notifier.notify_in(4, key.clone(), noop());

        assert!(notifier.cancel_at(Turn(2), &key));
        assert!(!notifier.cancel_at(Turn(2), &key));
        assert_eq!(notifier.next_due(&key), Some(Turn(4)));
    }

    #[test]
    fn cancelling_a_collected_listener_stops_it_firing() {
        let mut notifier = TurnNotifier::new();
        notifier.notify_in(1, "a", noop());
        notifier.notify_in(1, "b", noop());

        let (_, due) = notifier.advance();
        assert_eq!(due.len(), 2);
        assert!(notifier.begin_firing(&due[0].key));
        assert_eq!(notifier.cancel(&ListenerKey::from("b")), 1);
        assert!(!notifier.begin_firing(&due[1].key));
    }

    #[test]
    fn cancel_at_current_turn_stops_a_collected_listener() {
        let mut notifier = TurnNotifier::new();
        let key = ListenerKey::from("warn");
        notifier.notify_in(1, key.clone(), noop());
        notifier.notify_in(3, key.clone(), noop());

        let (turn, due) = notifier.advance();
        assert_eq!(keys(&due), vec!["warn"]);
        assert!(notifier.cancel_at(turn, &key));
        assert!(!notifier.cancel_at(turn, &key));
        assert!(!notifier.begin_firing(&due[0].key));
        assert_eq!(notifier.next_due(&key), Some(Turn(3)));
    }

    #[test]
    fn collected_listener_counts_as_scheduled_until_it_fires() {
        let mut notifier = TurnNotifier::new();
        let key = ListenerKey::from("warn");
        notifier.notify_in(1, key.clone(), noop());

        let (turn, due) = notifier.advance();
        assert!(notifier.is_scheduled(&key));
        assert_eq!(notifier.next_due(&key), Some(turn));

        assert!(notifier.begin_firing(&due[0].key));
        assert!(!notifier.is_scheduled(&key));
        assert_eq!(notifier.next_due(&key), None);
    }

    #[test]
    fn cancelled_collected_listener_is_no_longer_scheduled() {
        let mut notifier = TurnNotifier::new();
        let key = ListenerKey::from("warn");
        notifier.notify_in(1, key.clone(), noop());

        notifier.advance();
        assert_eq!(notifier.cancel(&key), 1);
        assert!(!notifier.is_scheduled(&key));
    }
}
