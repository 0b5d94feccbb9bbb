//! Back-reference contract for entities that issue further requests.

use crate::error::Result;
use crate::rehydrate::OwnerSlot;

/// An entity that needs its owner after decoding.
///
/// The owner is never part of the JSON body. The [`Rehydrator`] fills the
/// slot exactly once, right after decoding; the entity's own accessors read
/// it whenever they need to go back to the API.
///
/// [`Rehydrator`]: crate::Rehydrator
pub trait OwnedEntity {
    /// The owning value (a client, a repository, ...).
    type Owner: Clone;

    /// The slot the owner is stored in.
    fn owner_slot(&self) -> &OwnerSlot<Self::Owner>;

    /// Attach `owner` to nested entities that also declare this contract.
    ///
    /// Called by the rehydrator after the top-level slot is set.
    fn attach_nested(&self, _owner: &Self::Owner) -> Result<()> {
        Ok(())
    }
}
