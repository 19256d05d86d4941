use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::entity::{Behavior, BehaviorContext, Entity, ObjectKind, WorldObject};
use super::geometry::{Bounds, Position};
use super::ids::{Identifier, ObjectId, ObjectIdAllocator, ZoneId};
use crate::error::HandlerError;
use crate::turn::{contain, Fault, Turn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("object {identifier} is already present")]
    AlreadyPresent { identifier: Identifier },
    #[error("object {identifier} cannot be added to zone {zone}")]
    WrongZone { zone: ZoneId, identifier: Identifier },
    #[error("position ({x}, {y}) is outside zone {zone}")]
    OutOfBounds { zone: ZoneId, x: i32, y: i32 },
    #[error("object {identifier} does not exist")]
    Missing { identifier: Identifier },
    #[error("object {identifier} has no position")]
    NotAnEntity { identifier: Identifier },
    #[error("zone {zone} has no object ids left")]
    IdsExhausted { zone: ZoneId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneUpdateReport {
    pub moved: usize,
    pub blocked: usize,
    pub faults: usize,
    pub died: Vec<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookResult {
    Missing,
    NoBehavior,
    Ran,
    Faulted,
}

/// A spatial container of world objects keyed by zone-scoped object id.
/// Lookups go through a hash index; iteration and per-turn updates run in
/// ascending id order.
#[derive(Debug)]
pub struct Zone {
    id: ZoneId,
    bounds: Bounds,
    allocator: ObjectIdAllocator,
    objects: HashMap<ObjectId, WorldObject>,
    order: BTreeSet<ObjectId>,
    last_turn: Turn,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            bounds,
            allocator: ObjectIdAllocator::default(),
            objects: HashMap::new(),
            order: BTreeSet::new(),
            last_turn: Turn::ZERO,
        }
    }

    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn last_turn(&self) -> Turn {
        self.last_turn
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn identifier_for(&self, object: ObjectId) -> Identifier {
        Identifier::new(object, self.id.clone())
    }

    /// Inserts a detached object, assigning a fresh id unless one was requested.
    pub fn add(&mut self, mut object: WorldObject) -> Result<Identifier, ZoneError> {
        if let Some(position) = object.entity().map(Entity::position) {
            if !self.bounds.contains(position) {
                return Err(ZoneError::OutOfBounds {
                    zone: self.id.clone(),
                    x: position.x,
                    y: position.y,
                });
            }
        }

        let identifier = match object.identifier() {
            Some(requested) if requested.zone != self.id => {
                return Err(ZoneError::WrongZone {
                    zone: self.id.clone(),
                    identifier: requested.clone(),
                });
            }
            Some(requested) if self.objects.contains_key(&requested.object) => {
                return Err(ZoneError::AlreadyPresent {
                    identifier: requested.clone(),
                });
            }
            Some(requested) => requested.clone(),
            None => {
                let object_id = self
                    .allocator
                    .allocate()
                    .filter(|id| !self.objects.contains_key(id))
                    .ok_or_else(|| ZoneError::IdsExhausted {
                        zone: self.id.clone(),
                    })?;
                self.identifier_for(object_id)
            }
        };

        self.allocator.reserve(identifier.object);
        object.set_identifier(Some(identifier.clone()));
        debug!(
            zone = %self.id,
            object_id = %identifier.object,
            name = object.name(),
            "object_added"
        );
        self.objects.insert(identifier.object, object);
        self.order.insert(identifier.object);
        self.invoke_behavior(identifier.object, self.last_turn, "spawn", |behavior, ctx| {
            behavior.on_spawn(ctx)
        });
        Ok(identifier)
    }

    /// Detaches and returns the object; `None` when it is not here.
    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        let mut object = self.objects.remove(&id)?;
        self.order.remove(&id);
        object.set_identifier(None);
        debug!(zone = %self.id, object_id = %id, name = object.name(), "object_removed");
        Some(object)
    }

    pub fn has(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.iter().copied().collect()
    }

    /// Moves an entity, refusing positions outside the zone.
    pub fn place(&mut self, id: ObjectId, position: Position) -> Result<(), ZoneError> {
        if !self.bounds.contains(position) {
            return Err(ZoneError::OutOfBounds {
                zone: self.id.clone(),
                x: position.x,
                y: position.y,
            });
        }
        let identifier = self.identifier_for(id);
        let object = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| ZoneError::Missing {
                identifier: identifier.clone(),
            })?;
        let entity = object
            .entity_mut()
            .ok_or(ZoneError::NotAnEntity { identifier })?;
        entity.set_position(position);
        Ok(())
    }

    /// Runs the target's interaction hook. Returns false when there is no
    /// target, no behavior, or the behavior faulted.
    pub fn interact(&mut self, target: ObjectId, actor: &Identifier, turn: Turn) -> bool {
        let result = self.invoke_behavior(target, turn, "interact", |behavior, ctx| {
            behavior.on_interact(ctx, actor)
        });
        result == HookResult::Ran
    }

    /// One turn of entity activity: path movement and the turn hook per entity
    /// in id order, then attack-intent upkeep and removal of dead non-players.
    pub fn update(&mut self, turn: Turn) -> ZoneUpdateReport {
        self.last_turn = turn;
        let mut report = ZoneUpdateReport::default();

        for id in self.ids() {
            self.advance_movement(id, turn, &mut report);
            if self.invoke_behavior(id, turn, "turn", |behavior, ctx| behavior.on_turn(ctx))
                == HookResult::Faulted
            {
                report.faults += 1;
            }
        }

        self.clear_stale_attack_targets();
        self.remove_dead(turn, &mut report);
        report
    }

    fn advance_movement(&mut self, id: ObjectId, turn: Turn, report: &mut ZoneUpdateReport) {
        let bounds = self.bounds;
        let Some(entity) = self.objects.get_mut(&id).and_then(WorldObject::entity_mut) else {
            return;
        };
        let from = entity.position();
        let Some(next) = entity
            .path_mut()
            .and_then(|follower| follower.propose_step(from))
        else {
            return;
        };
        if bounds.contains(next) {
            entity.set_position(next);
            report.moved += 1;
        } else {
            report.blocked += 1;
            debug!(
                zone = %self.id,
                object_id = %id,
                turn = %turn,
                x = next.x,
                y = next.y,
                "path_step_out_of_bounds"
            );
        }
    }

    fn clear_stale_attack_targets(&mut self) {
        let attackable: HashSet<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_attackable())
            .map(|(id, _)| *id)
            .collect();

        for object in self.objects.values_mut() {
            let Some(entity) = object.entity_mut() else {
                continue;
            };
            let stale = entity
                .attack_target()
                .is_some_and(|target| !attackable.contains(&target));
            if stale || entity.is_dead() {
                entity.stop_attack();
            }
        }
    }

    fn remove_dead(&mut self, turn: Turn, report: &mut ZoneUpdateReport) {
        let dead: Vec<ObjectId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.objects.get(id).is_some_and(|object| {
                    object.kind() != ObjectKind::Player
                        && object.entity().is_some_and(Entity::is_dead)
                })
            })
            .collect();

        for id in dead {
            if let Some(object) = self.remove(id) {
                info!(
                    zone = %self.id,
                    object_id = %id,
                    name = object.name(),
                    turn = %turn,
                    "entity_died"
                );
                report.died.push(id);
            }
        }
    }

    fn invoke_behavior<F>(
        &mut self,
        id: ObjectId,
        turn: Turn,
        hook: &'static str,
        call: F,
    ) -> HookResult
    where
        F: FnOnce(&mut dyn Behavior, &mut BehaviorContext<'_>) -> Result<(), HandlerError>,
    {
        let Some(object) = self.objects.get_mut(&id) else {
            return HookResult::Missing;
        };
        let Some(mut behavior) = object
            .entity_mut()
            .and_then(|entity| entity.behavior.take())
        else {
            return HookResult::NoBehavior;
        };

        let outcome = {
            let mut ctx = BehaviorContext {
                turn,
                zone: &self.id,
                object: &mut *object,
            };
            contain(|| call(behavior.as_mut(), &mut ctx))
        };

        // A hook may install a replacement behavior; keep it if so.
        if let Some(entity) = object.entity_mut() {
            if entity.behavior.is_none() {
                entity.behavior = Some(behavior);
            }
        }

        match outcome {
            Ok(()) => HookResult::Ran,
            Err(Fault::Failed(err)) => {
                warn!(
                    zone = %self.id,
                    object_id = %id,
                    turn = %turn,
                    hook,
                    error = %err,
                    "entity_behavior_failed"
                );
                HookResult::Faulted
            }
            Err(Fault::Panicked(message)) => {
                error!(
                    zone = %self.id,
                    object_id = %id,
                    turn = %turn,
                    hook,
                    panic = %message,
                    "entity_behavior_panicked"
                );
                HookResult::Faulted
            }
        }
    }
}
