use std::fmt;

use super::attributes::{AttributeValue, Attributes};
use super::geometry::Position;
use super::ids::{Identifier, ObjectId, ZoneId};
use super::path::{FixedPath, PathFollower};
use crate::error::HandlerError;
use crate::turn::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Player,
    Npc,
    Item,
}

pub struct BehaviorContext<'a> {
    pub turn: Turn,
    pub zone: &'a ZoneId,
    pub object: &'a mut WorldObject,
}

/// Callbacks attached to an entity when its zone is configured. All hooks
/// default to doing nothing.
pub trait Behavior {
    fn on_spawn(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_turn(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_interact(
        &mut self,
        _ctx: &mut BehaviorContext<'_>,
        _actor: &Identifier,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Positioned, living refinement of a world object.
pub struct Entity {
    position: Position,
    hp: u32,
    base_hp: u32,
    path: Option<PathFollower>,
    attack_target: Option<ObjectId>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("position", &self.position)
            .field("hp", &self.hp)
            .field("base_hp", &self.base_hp)
            .field("path", &self.path)
            .field("attack_target", &self.attack_target)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

impl Entity {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            hp: 1,
            base_hp: 1,
            path: None,
            attack_target: None,
            behavior: None,
        }
    }

    pub fn with_hp(mut self, hp: u32) -> Self {
        self.init_hp(hp);
        self
    }

    pub fn with_path(mut self, path: FixedPath) -> Self {
        self.set_path(Some(path));
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn init_hp(&mut self, hp: u32) {
        self.base_hp = hp;
        self.hp = hp;
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn base_hp(&self) -> u32 {
        self.base_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    pub fn damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_add(amount).min(self.base_hp);
        self.hp
    }

    /// Replaces the current path; traversal restarts at the new path's first waypoint.
    pub fn set_path(&mut self, path: Option<FixedPath>) {
        self.path = path.map(PathFollower::new);
    }

    pub fn path(&self) -> Option<&PathFollower> {
        self.path.as_ref()
    }

    pub(crate) fn path_mut(&mut self) -> Option<&mut PathFollower> {
        self.path.as_mut()
    }

    pub fn start_attack(&mut self, target: ObjectId) {
        self.attack_target = Some(target);
    }

    pub fn stop_attack(&mut self) {
        self.attack_target = None;
    }

    pub fn attack_target(&self) -> Option<ObjectId> {
        self.attack_target
    }

    pub fn is_attacking(&self) -> bool {
        self.attack_target.is_some()
    }

    pub fn set_behavior(&mut self, behavior: Option<Box<dyn Behavior>>) {
        self.behavior = behavior;
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}

/// Anything that can live in a zone. Created detached; the zone assigns the
/// identifier on `add` and clears it on `remove`.
#[derive(Debug)]
pub struct WorldObject {
    identifier: Option<Identifier>,
    kind: ObjectKind,
    name: String,
    attributes: Attributes,
    entity: Option<Entity>,
}

impl WorldObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            identifier: None,
            kind,
            name: name.into(),
            attributes: Attributes::new(),
            entity: None,
        }
    }

    pub fn player(name: impl Into<String>, entity: Entity) -> Self {
        Self::new(ObjectKind::Player, name).with_entity(entity)
    }

    pub fn npc(name: impl Into<String>, entity: Entity) -> Self {
        Self::new(ObjectKind::Npc, name).with_entity(entity)
    }

    pub fn item(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Item, name)
    }

    /// Requests a specific id; `Zone::add` still validates zone and uniqueness.
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub(crate) fn set_identifier(&mut self, identifier: Option<Identifier>) {
        self.identifier = identifier;
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    pub fn entity_mut(&mut self) -> Option<&mut Entity> {
        self.entity.as_mut()
    }

    pub fn is_attackable(&self) -> bool {
        self.entity.as_ref().is_some_and(|entity| !entity.is_dead())
    }
}
