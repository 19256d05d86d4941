mod attack;
mod dispatch;
mod payload;

pub use attack::{AttackAction, ATTACK_ACTION};
pub use dispatch::{ActionDispatcher, ActionHandler, DispatchOutcome};
pub use payload::{Action, ActionParseError};
