mod fault;
mod metrics;
mod notifier;
mod server;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::world::World;

pub(crate) use fault::{contain, Fault};
pub use metrics::{TurnMetricsHandle, TurnMetricsSnapshot, TurnTotals};
pub use notifier::{ListenerKey, Rearm, ScheduleOutcome, TurnListener, TurnNotifier};
pub use server::{
    ActionSender, ServerClosed, ShutdownHandle, SubmittedAction, TickReport, TurnServer,
};

/// A value of the global turn counter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Turn(pub u64);

impl Turn {
    pub const ZERO: Turn = Turn(0);

    pub fn next(self) -> Turn {
        Turn(self.0.saturating_add(1))
    }

    pub fn after(self, turns: u64) -> Turn {
        Turn(self.0.saturating_add(turns))
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable view handed to action handlers and turn listeners on the turn thread.
pub struct TurnContext<'a> {
    pub turn: Turn,
    pub world: &'a mut World,
    pub notifier: &'a mut TurnNotifier,
}
