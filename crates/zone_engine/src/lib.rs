pub mod action;
pub mod config;
mod error;
pub mod turn;
pub mod world;

pub use action::{
    Action, ActionDispatcher, ActionHandler, ActionParseError, AttackAction, DispatchOutcome,
    ATTACK_ACTION,
};
pub use config::{
    build_world, load_world_config, parse_world_config, ConfiguratorRegistry, TurnLoopConfig,
    WorldConfig, ZoneConfig, ZoneConfigurator, TURN_MS_ENV_VAR,
};
pub use error::{ConfigError, HandlerError, NotFound};
pub use turn::{
    ActionSender, ListenerKey, Rearm, ScheduleOutcome, ServerClosed, ShutdownHandle,
    SubmittedAction, TickReport, Turn, TurnContext, TurnListener, TurnMetricsHandle,
    TurnMetricsSnapshot, TurnNotifier, TurnServer, TurnTotals,
};
pub use world::{
    AttributeValue, Attributes, Behavior, BehaviorContext, Bounds, Entity, FixedPath, Identifier,
    ObjectId, ObjectKind, PathFollower, Position, World, WorldObject, WorldUpdateReport, Zone,
    ZoneError, ZoneId, ZoneUpdateReport,
};
