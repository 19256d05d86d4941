use std::collections::HashMap;

use tracing::{debug, error, warn};

use super::payload::Action;
use crate::error::{ConfigError, HandlerError};
use crate::turn::{contain, Fault, TurnContext};
use crate::world::Identifier;

/// Handles one action type. Runs on the turn thread with exclusive access to
/// the world for the duration of the call.
pub trait ActionHandler {
    fn on_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
        player: &Identifier,
        action: &Action,
    ) -> Result<(), HandlerError>;
}

impl<F> ActionHandler for F
where
    F: FnMut(&mut TurnContext<'_>, &Identifier, &Action) -> Result<(), HandlerError>,
{
    fn on_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
        player: &Identifier,
        action: &Action,
    ) -> Result<(), HandlerError> {
        self(ctx, player, action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No handler for the type; the action had no effect.
    UnknownType,
    /// The handler returned an error or panicked. Already logged.
    Faulted,
}

struct RegisteredHandler {
    action_type: String,
    handler: Box<dyn ActionHandler>,
}

/// Routes an action to the handler registered for its type name.
#[derive(Default)]
pub struct ActionDispatcher {
    handlers: Vec<RegisteredHandler>,
    lookup_by_type: HashMap<String, usize>,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("action_types", &self.action_types().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        action_type: impl Into<String>,
        handler: impl ActionHandler + 'static,
    ) -> Result<(), ConfigError> {
        let action_type = action_type.into();
        if action_type.trim().is_empty() {
            return Err(ConfigError::EmptyActionType);
        }
        if self.lookup_by_type.contains_key(&action_type) {
            return Err(ConfigError::DuplicateActionType { action_type });
        }

        self.lookup_by_type
            .insert(action_type.clone(), self.handlers.len());
        self.handlers.push(RegisteredHandler {
            action_type,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn is_registered(&self, action_type: &str) -> bool {
        self.lookup_by_type.contains_key(action_type)
    }

    /// Registered type names in registration order.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .map(|registered| registered.action_type.as_str())
    }

    pub fn dispatch(
        &mut self,
        ctx: &mut TurnContext<'_>,
        player: &Identifier,
        action: &Action,
    ) -> DispatchOutcome {
        let Some(index) = self.lookup_by_type.get(action.kind()).copied() else {
            debug!(
                turn = %ctx.turn,
                player = %player,
                action_type = action.kind(),
                "action_unknown_type"
            );
            return DispatchOutcome::UnknownType;
        };

        let handler = &mut self.handlers[index].handler;
        match contain(|| handler.on_action(ctx, player, action)) {
            Ok(()) => DispatchOutcome::Handled,
            Err(Fault::Failed(err)) => {
                warn!(
                    turn = %ctx.turn,
                    player = %player,
                    action_type = action.kind(),
                    error = %err,
                    "action_handler_failed"
                );
                DispatchOutcome::Faulted
            }
            Err(Fault::Panicked(message)) => {
                error!(
                    turn = %ctx.turn,
                    player = %player,
                    action_type = action.kind(),
                    panic = %message,
                    "action_handler_panicked"
                );
                DispatchOutcome::Faulted
            }
        }
    }
}
