//! Request descriptions.
//!
//! A [`RequestBuilder`] accumulates method, target, parameters and context
//! values; [`RequestBuilder::build`] turns that state into an immutable
//! [`RequestSpec`]. Building performs no I/O and can be repeated freely.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use url::Url;

use crate::decode::ContextBindings;
use crate::error::{GitHubError, Result};

/// Separator used when an accumulated list parameter is sent as one value.
pub const LIST_SEPARATOR: &str = ",";

/// Query parameter carrying the requested page size.
pub const PAGE_SIZE_PARAM: &str = "per_page";

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    /// The verb as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether parameters travel in the body by default for this verb.
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single request parameter.
///
/// `Null` means "omit this parameter".
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Returns true if the parameter should be omitted.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Rendering used in a query string. `None` for omitted parameters.
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Str(s) => Some(s.clone()),
            Self::List(items) => Some(items.join(LIST_SEPARATOR)),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::String(s.clone()),
            Self::List(items) => Value::from(items.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or_else(|_| Self::Str(v.to_string()), Self::Int)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Str(v.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Path relative to the API root.
    Path(String),
    /// Absolute URL, used verbatim.
    Raw(String),
}

/// Immutable description of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    params: Vec<(String, ParamValue)>,
    context: ContextBindings,
    headers: BTreeMap<String, String>,
    page_size: u32,
    params_in_body: bool,
    body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// The HTTP verb.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target URL without parameters.
    pub fn base_url(&self) -> &Url {
        &self.url
    }

    /// Parameters in the order they were supplied.
    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Context values threaded into the decoder.
    pub fn context(&self) -> &ContextBindings {
        &self.context
    }

    /// Extra request headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Requested page size; 0 leaves the choice to the server.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// A copy of this request with a different page size.
    #[must_use]
    pub fn with_page_size(&self, page_size: u32) -> Self {
        Self {
            page_size,
            ..self.clone()
        }
    }

    fn params_in_query(&self) -> bool {
        !self.method.has_body() || !self.params_in_body || self.body.is_some()
    }

    /// Full URL of the exchange, including query parameters when they are
    /// not carried in the body.
    pub fn url(&self) -> Url {
        let mut url = self.url.clone();
        if self.params_in_query() {
            let pairs: Vec<(&str, String)> = self
                .params
                .iter()
                .filter_map(|(name, value)| value.to_query_value().map(|v| (name.as_str(), v)))
                .collect();
            if !pairs.is_empty() {
                let mut query = url.query_pairs_mut();
                for (name, value) in pairs {
                    query.append_pair(name, &value);
                }
            }
        }
        url
    }

    /// Request body: the raw override if one was set, otherwise the
    /// non-null parameters as a JSON object for body-carrying verbs.
    pub fn body(&self) -> Result<Option<Vec<u8>>> {
        if let Some(raw) = &self.body {
            return Ok(Some(raw.clone()));
        }
        if self.params_in_query() {
            return Ok(None);
        }

        let object: Map<String, Value> = self
            .params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Ok(Some(serde_json::to_vec(&Value::Object(object))?))
    }
}

/// Fluent builder for [`RequestSpec`].
///
/// # Example
///
/// ```
/// use ghapi::{Method, RequestBuilder};
/// use url::Url;
///
/// let spec = RequestBuilder::new(Url::parse("https://api.github.com/").unwrap())
///     .method(Method::Get)
///     .with_url_path("repos/octocat/hello-world/issues")
///     .with("state", "open")
///     .append("labels", "bug")
///     .append("labels", "ui")
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     spec.url().as_str(),
///     "https://api.github.com/repos/octocat/hello-world/issues?state=open&labels=bug%2Cui"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    api_url: Url,
    target: Option<Target>,
    params: Vec<(String, ParamValue)>,
    context: ContextBindings,
    headers: BTreeMap<String, String>,
    page_size: u32,
    params_in_body: bool,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Start a GET request against the API rooted at `api_url`.
    pub fn new(api_url: Url) -> Self {
        Self {
            method: Method::Get,
            api_url,
            target: None,
            params: Vec::new(),
            context: ContextBindings::new(),
            headers: BTreeMap::new(),
            page_size: 0,
            params_in_body: true,
            body: None,
        }
    }

    /// Set the HTTP verb.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Target a path relative to the API root.
    #[must_use]
    pub fn with_url_path(mut self, path: impl Into<String>) -> Self {
        self.target = Some(Target::Path(path.into()));
        self
    }

    /// Target an absolute URL (typically one returned by the API itself).
    #[must_use]
    pub fn with_raw_url(mut self, url: impl Into<String>) -> Self {
        self.target = Some(Target::Raw(url.into()));
        self
    }

    /// Set a parameter, replacing any previous value with the same name.
    ///
    /// A `None`/[`ParamValue::Null`] value omits the parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let name = name.into();
        self.params.retain(|(n, _)| *n != name);
        self.params.push((name, value.into()));
        self
    }

    /// Append `value` to the list parameter `name`.
    ///
    /// Repeated calls accumulate; the list is joined with
    /// [`LIST_SEPARATOR`] in query strings and sent as an array in bodies.
    #[must_use]
    pub fn append(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let Some(index) = self.params.iter().position(|(n, _)| *n == name) else {
            self.params.push((name, ParamValue::List(vec![value])));
            return self;
        };

        let existing = &mut self.params[index].1;
        match existing {
            ParamValue::List(items) => items.push(value),
            other => {
                let mut items: Vec<String> = other.to_query_value().into_iter().collect();
                items.push(value);
                *other = ParamValue::List(items);
            }
        }
        self
    }

    /// Supply a value to the decoder that is not part of the response body.
    #[must_use]
    pub fn inject_context(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(name, value);
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Request a page size for paginated iteration (0 = server default).
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Choose whether body-carrying verbs send parameters in the body
    /// (the default) or in the query string.
    #[must_use]
    pub fn in_body(mut self, in_body: bool) -> Self {
        self.params_in_body = in_body;
        self
    }

    /// Send `body` verbatim; parameters then go to the query string.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Produce the immutable request description.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Configuration`] when no target was set or the
    /// target does not form a valid URL.
    pub fn build(&self) -> Result<RequestSpec> {
        let url = match &self.target {
            None => {
                return Err(GitHubError::Configuration(
                    "request has no URL path or raw URL".to_string(),
                ))
            }
            Some(Target::Path(path)) => self
                .api_url
                .join(path.trim_start_matches('/'))
                .map_err(|e| {
                    GitHubError::Configuration(format!("invalid URL path '{path}': {e}"))
                })?,
            Some(Target::Raw(raw)) => Url::parse(raw)
                .map_err(|e| GitHubError::Configuration(format!("invalid URL '{raw}': {e}")))?,
        };

        Ok(RequestSpec {
            method: self.method,
            url,
            params: self.params.clone(),
            context: self.context.clone(),
            headers: self.headers.clone(),
            page_size: self.page_size,
            params_in_body: self.params_in_body,
            body: self.body.clone(),
        })
    }
}
