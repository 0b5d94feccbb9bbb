//! Response decoding.
//!
//! Maps raw response bodies onto [`Decodable`] types, either as fresh values
//! or merged into an existing instance, and threads [`ContextBindings`]
//! supplied by the request into the fields a type sources from context.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde_json::Value;

use crate::error::Result;
use crate::traits::{Decodable, Refreshable};

/// Values supplied to the decoder out-of-band from the JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBindings(BTreeMap<String, Value>);

impl ContextBindings {
    /// Create an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Look up a boolean binding. Non-boolean values read as absent.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Decode a fresh instance of `T` from `body`.
///
/// # Errors
///
/// Returns [`GitHubError::Decode`](crate::GitHubError::Decode) when a
/// required field is absent or has the wrong type.
pub fn decode<T: Decodable>(body: &[u8], context: &ContextBindings) -> Result<T> {
    let mut value: T = serde_json::from_slice(body)?;
    value.bind_context(context);
    Ok(value)
}

/// Merge `body` into `existing`.
///
/// Top-level fields present in `body` overwrite the existing ones; fields the
/// body omits keep their current values. Unserialized state (owner slots) is
/// carried over to the refreshed instance.
///
/// # Errors
///
/// Returns a decode error if the merged document no longer fits `T`. In that
/// case `existing` is left untouched.
pub fn decode_into<T: Refreshable>(
    body: &[u8],
    existing: &mut T,
    context: &ContextBindings,
) -> Result<()> {
    let incoming: Value = serde_json::from_slice(body)?;
    let mut merged = serde_json::to_value(&*existing)?;
    merge_top_level(&mut merged, incoming);

    let mut fresh: T = serde_json::from_value(merged)?;
    fresh.bind_context(context);

    let previous = std::mem::replace(existing, fresh);
    existing.carry_unserialized(previous);
    Ok(())
}

/// Decode an array body, treating an object body as "not ready yet".
///
/// Some statistics endpoints answer with an object, or with no body at all,
/// while the data is still being computed. That answer maps to `Ok(None)`.
/// Any other mismatch is an error.
pub fn decode_array_or_not_ready<T: Decodable>(
    body: &[u8],
    context: &ContextBindings,
) -> Result<Option<Vec<T>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!("expected an array but received an empty body; data is not ready yet");
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)?;
    if value.is_object() {
        tracing::warn!("expected an array but received an object; data is not ready yet");
        return Ok(None);
    }

    let mut items: Vec<T> = serde_json::from_value(value)?;
    items.bind_context(context);
    Ok(Some(items))
}

fn merge_top_level(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                target.insert(key, value);
            }
        }
        (target, incoming) => *target = incoming,
    }
}

/// Turns one page body into its items.
pub trait PageDecoder<T>: Send + Sync {
    /// Decode the items carried by one page.
    fn decode_page(&self, body: &[u8], context: &ContextBindings) -> Result<Vec<T>>;
}

/// Page decoder for endpoints whose body is a JSON array of items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayPage;

impl<T: Decodable> PageDecoder<T> for ArrayPage {
    fn decode_page(&self, body: &[u8], context: &ContextBindings) -> Result<Vec<T>> {
        decode::<Vec<T>>(body, context)
    }
}

/// Page decoder for endpoints whose body is a wrapper object `W` embedding
/// the page items.
pub struct EmbeddedPage<W, F> {
    extract: F,
    _wrapper: PhantomData<fn() -> W>,
}

impl<W, F> EmbeddedPage<W, F> {
    /// Create a decoder that pulls the items out of `W` with `extract`.
    pub fn new(extract: F) -> Self {
        Self {
            extract,
            _wrapper: PhantomData,
        }
    }
}

impl<W, T, F> PageDecoder<T> for EmbeddedPage<W, F>
where
    W: Decodable,
    F: Fn(W) -> Vec<T> + Send + Sync,
{
    fn decode_page(&self, body: &[u8], context: &ContextBindings) -> Result<Vec<T>> {
        let wrapper: W = decode(body, context)?;
        Ok((self.extract)(wrapper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GitHubError;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(skip)]
        mode: bool,
        #[serde(skip)]
        transient: u32,
    }

    impl Decodable for Sample {
        fn bind_context(&mut self, context: &ContextBindings) {
            self.mode = context.get_bool("sample.mode").unwrap_or_default();
        }
    }

    impl Refreshable for Sample {
        fn carry_unserialized(&mut self, previous: Self) {
            self.transient = previous.transient;
        }
    }

    #[test]
    fn test_decode_tolerates_unknown_fields() {
        let body = br#"{"name": "a", "count": 2, "unexpected": [1, 2, 3]}"#;
        let sample: Sample = decode(body, &ContextBindings::new()).unwrap();
        assert_eq!(sample.name, "a");
        assert_eq!(sample.count, 2);
    }

    #[test]
    fn test_decode_missing_required_field_is_decode_error() {
        let body = br#"{"count": 2}"#;
        let err = decode::<Sample>(body, &ContextBindings::new()).unwrap_err();
        assert!(matches!(err, GitHubError::Decode(_)));
    }

    #[test]
    fn test_decode_type_mismatch_is_decode_error() {
        let body = br#"{"name": 7}"#;
        let err = decode::<Sample>(body, &ContextBindings::new()).unwrap_err();
        assert!(matches!(err, GitHubError::Decode(_)));
    }

    #[test]
    fn test_context_binding_fills_context_field() {
        let mut context = ContextBindings::new();
        context.insert("sample.mode", true);

        let sample: Sample = decode(br#"{"name": "a"}"#, &context).unwrap();
        assert!(sample.mode);

        // The body cannot supply a context-sourced field.
        let sample: Sample = decode(br#"{"name": "a", "mode": true}"#, &ContextBindings::new())
            .unwrap();
        assert!(!sample.mode);
    }

    #[test]
    fn test_context_bindings_reach_array_items() {
        let mut context = ContextBindings::new();
        context.insert("sample.mode", true);

        let items: Vec<Sample> = decode(br#"[{"name": "a"}, {"name": "b"}]"#, &context).unwrap();
        assert!(items.iter().all(|s| s.mode));
    }

    #[test]
    fn test_decode_into_merges_and_keeps_unserialized_state() {
        let mut existing = Sample {
            name: "a".to_string(),
            count: 1,
            detail: None,
            mode: false,
            transient: 42,
        };

        decode_into(
            br#"{"detail": "filled in"}"#,
            &mut existing,
            &ContextBindings::new(),
        )
        .unwrap();

        assert_eq!(existing.name, "a");
        assert_eq!(existing.count, 1);
        assert_eq!(existing.detail.as_deref(), Some("filled in"));
        assert_eq!(existing.transient, 42);
    }

    #[test]
    fn test_decode_into_failure_leaves_instance_untouched() {
        let mut existing = Sample {
            name: "a".to_string(),
            transient: 7,
            ..Default::default()
        };

        let result = decode_into(br#"{"name": 5}"#, &mut existing, &ContextBindings::new());
        assert!(result.is_err());
        assert_eq!(existing.name, "a");
        assert_eq!(existing.transient, 7);
    }

    #[test]
    fn test_not_ready_object_maps_to_none() {
        let result =
            decode_array_or_not_ready::<Sample>(br#"{}"#, &ContextBindings::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_not_ready_empty_body_maps_to_none() {
        let empty = decode_array_or_not_ready::<Sample>(b"", &ContextBindings::new()).unwrap();
        assert!(empty.is_none());

        let blank =
            decode_array_or_not_ready::<Sample>(b" \r\n", &ContextBindings::new()).unwrap();
        assert!(blank.is_none());
    }

    #[test]
    fn test_not_ready_array_decodes_items() {
        let result = decode_array_or_not_ready::<Sample>(
            br#"[{"name": "a"}]"#,
            &ContextBindings::new(),
        )
        .unwrap();
        assert_eq!(result.map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_not_ready_does_not_swallow_other_mismatches() {
        let result = decode_array_or_not_ready::<Sample>(br#"17"#, &ContextBindings::new());
        assert!(matches!(result, Err(GitHubError::Decode(_))));
    }

    #[test]
    fn test_embedded_page_extracts_items() {
        #[derive(Deserialize)]
        struct Wrapper {
            items: Vec<Sample>,
        }
        impl Decodable for Wrapper {}

        let decoder = EmbeddedPage::<Wrapper, _>::new(|w: Wrapper| w.items);
        let items: Vec<Sample> = decoder
            .decode_page(br#"{"items": [{"name": "x"}], "total": 1}"#, &ContextBindings::new())
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "x");
    }
}
