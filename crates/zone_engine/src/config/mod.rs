mod configurator;
mod turn_loop;
mod world_file;

pub use configurator::{build_world, ConfiguratorRegistry, ZoneConfigurator};
pub use turn_loop::{TurnLoopConfig, TURN_MS_ENV_VAR};
pub use world_file::{load_world_config, parse_world_config, WorldConfig, ZoneConfig};
