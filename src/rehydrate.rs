//! Late binding of owners and session-scoped interning.
//!
//! Owners are never serialized over the wire. After decoding, every entity
//! that declares [`OwnedEntity`] goes through the [`Rehydrator`], which sets
//! its [`OwnerSlot`] exactly once and recurses into nested owned entities.
//! Canonical identities (users, organizations) are deduplicated per session
//! by the [`InternCache`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::{GitHubError, Result};
use crate::traits::{Internable, OwnedEntity};

/// Write-once back-reference slot.
///
/// Empty after decoding, filled once by the rehydrator, never reset. The
/// slot is invisible to equality (any two slots compare equal) and is
/// skipped by serialization.
pub struct OwnerSlot<O> {
    cell: OnceLock<O>,
}

impl<O> OwnerSlot<O> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The owner, if bound.
    pub fn get(&self) -> Option<&O> {
        self.cell.get()
    }

    /// Returns true once an owner has been attached.
    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The owner, or a [`GitHubError::Design`] naming `entity`.
    pub fn require(&self, entity: &str) -> Result<&O> {
        self.cell.get().ok_or_else(|| {
            GitHubError::Design(format!(
                "{entity} has no owner; it was decoded without going through the rehydrator"
            ))
        })
    }

    fn bind(&self, owner: O) -> Result<()> {
        self.cell.set(owner).map_err(|_| {
            GitHubError::Design("entity is already bound to an owner".to_string())
        })
    }
}

impl<O> Default for OwnerSlot<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Clone> Clone for OwnerSlot<O> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<O> PartialEq for OwnerSlot<O> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<O> Eq for OwnerSlot<O> {}

impl<O> fmt::Debug for OwnerSlot<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bound() {
            f.write_str("OwnerSlot(bound)")
        } else {
            f.write_str("OwnerSlot(unbound)")
        }
    }
}

/// Lifecycle of an owned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Fields from JSON only; no owner.
    Decoded,
    /// Owner attached.
    Bound,
    /// Owner attached and on-demand fields fetched.
    Populated,
}

/// Attaches owners to freshly decoded entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rehydrator;

impl Rehydrator {
    /// Attach `owner` to `item` (and its nested entities) and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Design`] if `item`, or any nested entity, is
    /// already bound.
    pub fn attach<E: OwnedEntity>(item: E, owner: &E::Owner) -> Result<E> {
        Self::attach_ref(&item, owner)?;
        Ok(item)
    }

    /// Attach `owner` to an entity in place.
    pub fn attach_ref<E: OwnedEntity + ?Sized>(item: &E, owner: &E::Owner) -> Result<()> {
        item.owner_slot().bind(owner.clone())?;
        item.attach_nested(owner)
    }

    /// Attach `owner` to every item.
    pub fn attach_all<E: OwnedEntity>(items: Vec<E>, owner: &E::Owner) -> Result<Vec<E>> {
        items
            .into_iter()
            .map(|item| Self::attach(item, owner))
            .collect()
    }
}

type InternKey = (TypeId, String);

/// Session-scoped cache of canonical entities.
///
/// Reads take a shared lock; insertions take the write lock. The cache lives
/// as long as the client that owns it and can be cleared on teardown.
#[derive(Default)]
pub struct InternCache {
    entries: RwLock<HashMap<InternKey, Arc<dyn Any + Send + Sync>>>,
}

impl fmt::Debug for InternCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternCache")
            .field("len", &self.len())
            .finish()
    }
}

impl InternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical instance for `candidate`'s identity.
    ///
    /// The first candidate seen for an identity becomes canonical; later
    /// candidates are dropped in favor of it.
    pub fn intern<T: Internable>(&self, candidate: T) -> Arc<T> {
        let key = (TypeId::of::<T>(), candidate.identity_key().to_string());

        if let Some(existing) = self.lookup::<T>(&key) {
            return existing;
        }

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another writer may have won the race between the read and the write.
        if let Some(existing) = entries
            .get(&key)
            .and_then(|e| Arc::clone(e).downcast::<T>().ok())
        {
            return existing;
        }

        tracing::debug!(key = %key.1, "interning new canonical entity");
        let canonical = Arc::new(candidate);
        entries.insert(key, canonical.clone());
        canonical
    }

    /// Look up the canonical instance for `identity`, if any.
    pub fn get<T: Internable>(&self, identity: &str) -> Option<Arc<T>> {
        self.lookup(&(TypeId::of::<T>(), identity.to_string()))
    }

    /// Number of canonical entities held.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every canonical entity.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lookup<T: Internable>(&self, key: &InternKey) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|e| Arc::clone(e).downcast::<T>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Login {
        login: String,
        seen: u32,
    }

    impl Internable for Login {
        fn identity_key(&self) -> &str {
            &self.login
        }
    }

    #[derive(Debug, Default)]
    struct Leaf {
        owner: OwnerSlot<String>,
    }

    impl OwnedEntity for Leaf {
        type Owner = String;

        fn owner_slot(&self) -> &OwnerSlot<String> {
            &self.owner
        }
    }

    #[derive(Debug, Default)]
    struct Composite {
        owner: OwnerSlot<String>,
        children: Vec<Leaf>,
    }

    impl OwnedEntity for Composite {
        type Owner = String;

        fn owner_slot(&self) -> &OwnerSlot<String> {
            &self.owner
        }

        fn attach_nested(&self, owner: &String) -> Result<()> {
            for child in &self.children {
                Rehydrator::attach_ref(child, owner)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_attach_sets_owner_once() {
        let leaf = Rehydrator::attach(Leaf::default(), &"repo".to_string()).unwrap();
        assert_eq!(leaf.owner.get().map(String::as_str), Some("repo"));
    }

    #[test]
    fn test_second_attach_is_design_error() {
        let leaf = Rehydrator::attach(Leaf::default(), &"a".to_string()).unwrap();
        let err = Rehydrator::attach(leaf, &"b".to_string()).unwrap_err();
        assert!(matches!(err, GitHubError::Design(_)));
    }

    #[test]
    fn test_attach_recurses_into_nested_entities() {
        let composite = Composite {
            owner: OwnerSlot::new(),
            children: vec![Leaf::default(), Leaf::default()],
        };
        let composite = Rehydrator::attach(composite, &"repo".to_string()).unwrap();
        assert!(composite.owner.is_bound());
        assert!(composite.children.iter().all(|c| c.owner.is_bound()));
    }

    #[test]
    fn test_require_on_unbound_slot_is_design_error() {
        let slot: OwnerSlot<String> = OwnerSlot::new();
        assert!(matches!(slot.require("commit"), Err(GitHubError::Design(_))));
    }

    #[test]
    fn test_slots_are_invisible_to_equality() {
        let bound: OwnerSlot<String> = OwnerSlot::new();
        bound.bind("x".to_string()).unwrap();
        assert_eq!(bound, OwnerSlot::new());
    }

    #[test]
    fn test_intern_returns_canonical_instance() {
        let cache = InternCache::new();
        let first = cache.intern(Login {
            login: "octocat".into(),
            seen: 1,
        });
        let second = cache.intern(Login {
            login: "octocat".into(),
            seen: 2,
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.seen, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_intern_is_per_cache() {
        let session_a = InternCache::new();
        let session_b = InternCache::new();
        let a = session_a.intern(Login {
            login: "octocat".into(),
            seen: 1,
        });
        let b = session_b.intern(Login {
            login: "octocat".into(),
            seen: 1,
        });
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clear_discards_session_state() {
        let cache = InternCache::new();
        cache.intern(Login {
            login: "octocat".into(),
            seen: 1,
        });
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get::<Login>("octocat").is_none());
    }

    #[test]
    fn test_concurrent_interning_converges() {
        let cache = Arc::new(InternCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.intern(Login {
                        login: "octocat".into(),
                        seen: i,
                    })
                })
            })
            .collect();

        let results: Vec<Arc<Login>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
