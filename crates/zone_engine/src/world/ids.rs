use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ZoneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names one live object: the object id is only unique inside `zone`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub object: ObjectId,
    pub zone: ZoneId,
}

impl Identifier {
    pub fn new(object: ObjectId, zone: impl Into<ZoneId>) -> Self {
        Self {
            object,
            zone: zone.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.zone, self.object)
    }
}

/// Monotonic per-zone allocator. Ids handed out or reserved are never issued
/// again; once `u32::MAX` has been used the allocator is exhausted.
#[derive(Debug, Default)]
pub(crate) struct ObjectIdAllocator {
    next: u64,
}

impl ObjectIdAllocator {
    pub(crate) fn allocate(&mut self) -> Option<ObjectId> {
        let id = u32::try_from(self.next).ok()?;
        self.next += 1;
        Some(ObjectId(id))
    }

    pub(crate) fn reserve(&mut self, id: ObjectId) {
        self.next = self.next.max(u64::from(id.0) + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_skips_past_reserved_ids() {
        let mut allocator = ObjectIdAllocator::default();
        assert_eq!(allocator.allocate(), Some(ObjectId(0)));
        allocator.reserve(ObjectId(10));
        assert_eq!(allocator.allocate(), Some(ObjectId(11)));
        allocator.reserve(ObjectId(3));
        assert_eq!(allocator.allocate(), Some(ObjectId(12)));
    }

    #[test]
    fn allocator_is_exhausted_after_the_last_id() {
        let mut allocator = ObjectIdAllocator::default();
        allocator.reserve(ObjectId(u32::MAX - 1));
        assert_eq!(allocator.allocate(), Some(ObjectId(u32::MAX)));
        assert_eq!(allocator.allocate(), None);

        let mut allocator = ObjectIdAllocator::default();
        allocator.reserve(ObjectId(u32::MAX));
        assert_eq!(allocator.allocate(), None);
    }

    #[test]
    fn identifier_display_includes_zone_and_object() {
        let id = Identifier::new(ObjectId(7), "tavern");
        assert_eq!(id.to_string(), "tavern#7");
    }
}
