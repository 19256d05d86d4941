use std::collections::BTreeMap;

use tracing::info;

use super::entity::WorldObject;
use super::ids::{Identifier, ZoneId};
use super::zone::Zone;
use crate::error::{ConfigError, NotFound};
use crate::turn::Turn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldUpdateReport {
    pub zones_updated: usize,
    pub entities_moved: usize,
    pub entities_died: usize,
    pub faults: usize,
}

/// Zone registry for one world instance. Owned by the turn server, so every
/// lookup and mutation happens on the turn thread.
#[derive(Debug, Default)]
pub struct World {
    zones: BTreeMap<ZoneId, Zone>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_zone(&mut self, zone: Zone) -> Result<(), ConfigError> {
        if self.zones.contains_key(zone.id()) {
            return Err(ConfigError::DuplicateZone {
                zone: zone.id().clone(),
            });
        }
        info!(
            zone = %zone.id(),
            width = zone.bounds().width(),
            height = zone.bounds().height(),
            object_count = zone.len(),
            "zone_registered"
        );
        self.zones.insert(zone.id().clone(), zone);
        Ok(())
    }

    pub fn unload_zone(&mut self, id: &ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(id)?;
        info!(zone = %id, object_count = zone.len(), "zone_unloaded");
        Some(zone)
    }

    pub fn has_zone(&self, id: &ZoneId) -> bool {
        self.zones.contains_key(id)
    }

    pub fn zone(&self, id: &ZoneId) -> Result<&Zone, NotFound> {
        self.zones.get(id).ok_or_else(|| NotFound::Zone(id.clone()))
    }

    pub fn zone_mut(&mut self, id: &ZoneId) -> Result<&mut Zone, NotFound> {
        self.zones
            .get_mut(id)
            .ok_or_else(|| NotFound::Zone(id.clone()))
    }

    /// The zone an identifier is scoped to.
    pub fn zone_of(&self, identifier: &Identifier) -> Result<&Zone, NotFound> {
        self.zone(&identifier.zone)
    }

    pub fn zone_of_mut(&mut self, identifier: &Identifier) -> Result<&mut Zone, NotFound> {
        self.zone_mut(&identifier.zone)
    }

    pub fn object(&self, identifier: &Identifier) -> Result<&WorldObject, NotFound> {
        self.zone_of(identifier)?
            .get(identifier.object)
            .ok_or_else(|| NotFound::Object(identifier.clone()))
    }

    pub fn object_mut(&mut self, identifier: &Identifier) -> Result<&mut WorldObject, NotFound> {
        self.zone_of_mut(identifier)?
            .get_mut(identifier.object)
            .ok_or_else(|| NotFound::Object(identifier.clone()))
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.keys()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Updates every zone in zone-id order.
    pub fn update_zones(&mut self, turn: Turn) -> WorldUpdateReport {
        let mut report = WorldUpdateReport::default();
        for zone in self.zones.values_mut() {
            let zone_report = zone.update(turn);
            report.zones_updated += 1;
            report.entities_moved += zone_report.moved;
            report.entities_died += zone_report.died.len();
            report.faults += zone_report.faults;
        }
        report
    }
}
