//! Entity trait: identity + continuity across state changes.

use crate::id::RecordId;

/// A persisted record with a store-assigned identity.
pub trait Entity {
    fn id(&self) -> RecordId;
}
