//! Decoding contract implemented by every response type.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::decode::ContextBindings;

/// A type the response decoder can produce.
///
/// Decoding is tolerant of unknown fields. Types that carry context-sourced
/// fields (values that are never present in the JSON body) mark them
/// `#[serde(skip)]` and fill them in [`Decodable::bind_context`].
///
/// # Example
///
/// ```ignore
/// impl Decodable for Compare {
///     fn bind_context(&mut self, context: &ContextBindings) {
///         self.listing = CommitListing::from_context(context);
///     }
/// }
/// ```
pub trait Decodable: DeserializeOwned + Send {
    /// Copy declared context values into context-sourced fields.
    ///
    /// Absent bindings leave the fields at their defaults.
    fn bind_context(&mut self, _context: &ContextBindings) {}
}

impl<T: Decodable> Decodable for Vec<T> {
    fn bind_context(&mut self, context: &ContextBindings) {
        for item in self.iter_mut() {
            item.bind_context(context);
        }
    }
}

impl Decodable for serde_json::Value {}

/// A type that can be refreshed in place from a later, fuller response.
///
/// Refreshing serializes the existing instance, overlays the new body, and
/// decodes the result. State that never crosses the wire (owner slots) is
/// handed over from the replaced instance by [`Refreshable::carry_unserialized`].
pub trait Refreshable: Decodable + Serialize {
    /// Move unserialized state from `previous` into `self`.
    fn carry_unserialized(&mut self, previous: Self);
}
