use std::collections::HashMap;

use tracing::info;

use super::WorldConfig;
use crate::error::ConfigError;
use crate::world::{Attributes, Bounds, World, Zone};

/// Populates a freshly created zone. Called once per zone that names it,
/// before the zone is registered with the world.
pub trait ZoneConfigurator {
    fn configure_zone(&self, zone: &mut Zone, attributes: &Attributes) -> Result<(), ConfigError>;
}

impl<F> ZoneConfigurator for F
where
    F: Fn(&mut Zone, &Attributes) -> Result<(), ConfigError>,
{
    fn configure_zone(&self, zone: &mut Zone, attributes: &Attributes) -> Result<(), ConfigError> {
        self(zone, attributes)
    }
}

struct NamedConfigurator {
    name: String,
    configurator: Box<dyn ZoneConfigurator>,
}

#[derive(Default)]
pub struct ConfiguratorRegistry {
    configurators: Vec<NamedConfigurator>,
    lookup_by_name: HashMap<String, usize>,
}

impl ConfiguratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        configurator: impl ZoneConfigurator + 'static,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyConfiguratorName);
        }
        if self.lookup_by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateConfigurator { name });
        }

        self.lookup_by_name
            .insert(name.clone(), self.configurators.len());
        self.configurators.push(NamedConfigurator {
            name,
            configurator: Box::new(configurator),
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ZoneConfigurator> {
        let index = self.lookup_by_name.get(name)?;
        self.configurators
            .get(*index)
            .map(|named| named.configurator.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configurators.iter().map(|named| named.name.as_str())
    }
}

/// Creates every zone in `config`, runs its configurators in order, and
/// registers it. Any failure aborts startup.
pub fn build_world(
    config: &WorldConfig,
    registry: &ConfiguratorRegistry,
) -> Result<World, ConfigError> {
    if config.zones.is_empty() {
        return Err(ConfigError::NoZones);
    }

    let mut world = World::new();
    for zone_config in &config.zones {
        if zone_config.id.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyZoneId);
        }
        let bounds = Bounds::new(zone_config.width, zone_config.height).ok_or_else(|| {
            ConfigError::InvalidZoneBounds {
                zone: zone_config.id.clone(),
                width: zone_config.width,
                height: zone_config.height,
            }
        })?;
        if world.has_zone(&zone_config.id) {
            return Err(ConfigError::DuplicateZone {
                zone: zone_config.id.clone(),
            });
        }

        let configurators = zone_config
            .configurators
            .iter()
            .map(|name| {
                registry
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownConfigurator {
                        zone: zone_config.id.clone(),
                        configurator: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut zone = Zone::new(zone_config.id.clone(), bounds);
        for configurator in configurators {
            configurator.configure_zone(&mut zone, &zone_config.attributes)?;
        }
        info!(
            zone = %zone.id(),
            configurators = zone_config.configurators.len(),
            object_count = zone.len(),
            "zone_configured"
        );
        world.register_zone(zone)?;
    }
    Ok(world)
}
