//! Identity contract for canonical, session-interned entities.

/// An entity with a stable identity that should resolve to one in-memory
/// instance per session.
pub trait Internable: Send + Sync + 'static {
    /// Stable identity key (e.g. a user login).
    fn identity_key(&self) -> &str;
}
