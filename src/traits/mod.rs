//! Trait definitions for the late-binding contract.
//!
//! Each response type implements the traits it needs: every type is
//! [`Decodable`], types refreshed in place are [`Refreshable`], types that go
//! back to the API are [`OwnedEntity`], and canonical identities are
//! [`Internable`].

mod decodable;
mod internable;
mod owned;

pub use decodable::{Decodable, Refreshable};
pub use internable::Internable;
pub use owned::OwnedEntity;
