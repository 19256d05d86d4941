mod attributes;
mod entity;
mod geometry;
mod ids;
mod path;
mod registry;
mod zone;

pub use attributes::{AttributeValue, Attributes};
pub use entity::{Behavior, BehaviorContext, Entity, ObjectKind, WorldObject};
pub use geometry::{Bounds, Position};
pub use ids::{Identifier, ObjectId, ZoneId};
pub(crate) use ids::ObjectIdAllocator;
pub use path::{FixedPath, PathFollower};
pub use registry::{World, WorldUpdateReport};
pub use zone::{Zone, ZoneError, ZoneUpdateReport};
