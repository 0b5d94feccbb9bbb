//! Request builder bound to a client.
//!
//! [`Requester`] wraps a [`RequestBuilder`] together with the
//! [`GitHubClient`] that will dispatch it, and provides the terminal
//! operations: fetch a value, refresh an existing value, check a status, or
//! hand out a lazy sequence.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::client::GitHubClient;
use crate::decode::{self, ArrayPage, PageDecoder};
use crate::error::{GitHubError, Result};
use crate::request::{Method, ParamValue, RequestBuilder, RequestSpec};
use crate::sequence::{ItemInitializer, PagedIterable};
use crate::traits::{Decodable, Refreshable};

/// A request under construction, bound to the client that will send it.
///
/// Nothing is sent until a terminal operation is called.
#[derive(Debug, Clone)]
pub struct Requester {
    client: GitHubClient,
    builder: RequestBuilder,
}

impl Requester {
    pub(crate) fn new(client: GitHubClient) -> Self {
        let builder = RequestBuilder::new(client.api_url().clone());
        Self { client, builder }
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            client: self.client,
            builder: f(self.builder),
        }
    }

    /// Set the HTTP verb.
    #[must_use]
    pub fn method(self, method: Method) -> Self {
        self.map(|b| b.method(method))
    }

    /// Target a path relative to the API root.
    #[must_use]
    pub fn with_url_path(self, path: impl Into<String>) -> Self {
        self.map(|b| b.with_url_path(path))
    }

    /// Target an absolute URL.
    #[must_use]
    pub fn with_raw_url(self, url: impl Into<String>) -> Self {
        self.map(|b| b.with_raw_url(url))
    }

    /// Set a parameter; `None` omits it.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.map(|b| b.with(name, value))
    }

    /// Append to a list parameter.
    #[must_use]
    pub fn append(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|b| b.append(name, value))
    }

    /// Supply a value to the decoder out-of-band from the body.
    #[must_use]
    pub fn inject_context(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map(|b| b.inject_context(name, value))
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|b| b.with_header(name, value))
    }

    /// Request a page size for iteration.
    #[must_use]
    pub fn page_size(self, page_size: u32) -> Self {
        self.map(|b| b.page_size(page_size))
    }

    /// Choose body or query placement for body-carrying verbs.
    #[must_use]
    pub fn in_body(self, in_body: bool) -> Self {
        self.map(|b| b.in_body(in_body))
    }

    /// Send `body` verbatim.
    #[must_use]
    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.map(|b| b.with_body(body))
    }

    /// Describe the request without sending it.
    pub fn build(&self) -> Result<RequestSpec> {
        self.builder.build()
    }

    /// Send the request and decode the response into a new `T`.
    pub async fn fetch<T: Decodable>(self) -> Result<T> {
        let spec = self.build()?;
        let response = self.client.send(&spec).await?;
        decode::decode(&response.body, spec.context())
    }

    /// Send the request and merge the response into `existing`.
    pub async fn fetch_into<T: Refreshable>(self, existing: &mut T) -> Result<()> {
        let spec = self.build()?;
        let response = self.client.send(&spec).await?;
        decode::decode_into(&response.body, existing, spec.context())
    }

    /// Send the request and decode an array, mapping an object body
    /// ("still being computed") to `None`.
    pub async fn fetch_array_or_not_ready<T: Decodable>(self) -> Result<Option<Vec<T>>> {
        let spec = self.build()?;
        let response = self.client.send(&spec).await?;
        decode::decode_array_or_not_ready(&response.body, spec.context())
    }

    /// Send the request and return only the status code.
    ///
    /// Non-success statuses are returned, not raised.
    pub async fn fetch_http_status_code(self) -> Result<u16> {
        let spec = self.build()?;
        let response = self.client.send_unchecked(&spec, spec.url()).await?;
        Ok(response.status)
    }

    /// Send the request and check that it succeeded.
    pub async fn send(self) -> Result<()> {
        let spec = self.build()?;
        self.client.send(&spec).await?;
        Ok(())
    }

    /// Send a GraphQL request and return its `data`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::GraphQl`] if the response lists errors or
    /// carries no data.
    pub async fn fetch_graphql<T: DeserializeOwned + Send + 'static>(self) -> Result<T> {
        let response: GraphQlResponse<T> = self.fetch().await?;
        response.into_data()
    }

    /// Describe a lazy sequence over an array endpoint.
    ///
    /// No request is sent until the sequence is iterated.
    pub fn to_iterable<T>(self) -> Result<PagedIterable<T>>
    where
        T: Decodable + Clone + Sync + 'static,
    {
        self.to_iterable_with(ArrayPage, None)
    }

    /// Describe a lazy sequence, running `initializer` on every item as it is
    /// decoded (typically to attach an owner).
    pub fn to_iterable_init<T, F>(self, initializer: F) -> Result<PagedIterable<T>>
    where
        T: Decodable + Clone + Sync + 'static,
        F: Fn(&mut T) -> Result<()> + Send + Sync + 'static,
    {
        let initializer: ItemInitializer<T> = Arc::new(initializer);
        self.to_iterable_with(ArrayPage, Some(initializer))
    }

    /// Describe a lazy sequence with a custom page decoder.
    pub fn to_iterable_with<T, D>(
        self,
        decoder: D,
        initializer: Option<ItemInitializer<T>>,
    ) -> Result<PagedIterable<T>>
    where
        T: Clone + Send + Sync + 'static,
        D: PageDecoder<T> + 'static,
    {
        let mut spec = self.build()?;
        if spec.page_size() == 0 && self.client.default_page_size() > 0 {
            spec = spec.with_page_size(self.client.default_page_size());
        }
        Ok(PagedIterable::new(
            self.client,
            spec,
            Arc::new(decoder),
            initializer,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T: DeserializeOwned + Send> Decodable for GraphQlResponse<T> {}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| GitHubError::GraphQl("response contained no data".to_string()))
    }
}
