//! Pagination utilities for GitHub API responses.
//!
//! [`PageCursor`] drives one exchange per page. Cursors come from transport
//! metadata only (the `Link` header, or page-number substitution for legacy
//! endpoints), so bodies that are not themselves arrays paginate the same
//! way as plain array endpoints.

use serde::Serialize;
use url::Url;

use crate::client::GitHubClient;
use crate::error::Result;
use crate::request::{RequestSpec, PAGE_SIZE_PARAM};
use crate::transport::RawResponse;

/// Query parameter carrying the page number for legacy endpoints.
pub const PAGE_NUMBER_PARAM: &str = "page";

/// Opaque token for requesting an adjacent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(CursorKind);

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorKind {
    /// URL handed out by the server.
    Link(Url),
    /// Page number computed on the client.
    PageNumber(u32),
}

impl Cursor {
    /// Returns true if the cursor was computed locally rather than handed
    /// out by the server. Such cursors cannot tell whether more data exists.
    pub fn is_synthesized(&self) -> bool {
        matches!(self.0, CursorKind::PageNumber(_))
    }
}

/// How the next page is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorStrategy {
    /// Follow `rel="next"` in the `Link` response header.
    #[default]
    LinkHeader,
    /// Increment the `page` query parameter until an empty page comes back.
    PageNumber,
}

/// A page of decoded results.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page, in server order.
    pub items: Vec<T>,
    /// Cursor for the following page.
    #[serde(skip)]
    pub next: Option<Cursor>,
    /// Cursor for the preceding page.
    #[serde(skip)]
    pub prev: Option<Cursor>,
}

impl<T> Page<T> {
    /// Create a page from items and adjacent cursors.
    #[must_use]
    pub fn new(items: Vec<T>, next: Option<Cursor>, prev: Option<Cursor>) -> Self {
        Self { items, next, prev }
    }

    /// Whether the sequence ends with this page.
    pub fn is_last(&self) -> bool {
        match &self.next {
            None => true,
            Some(cursor) => cursor.is_synthesized() && self.items.is_empty(),
        }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
            prev: self.prev,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An undecoded page: the raw response plus its adjacent cursors.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub response: RawResponse,
    pub next: Option<Cursor>,
    pub prev: Option<Cursor>,
}

/// Fetches pages for one request.
///
/// Holds no state beyond configuration; the caller carries the cursor from
/// one call to the next.
#[derive(Debug, Clone)]
pub struct PageCursor {
    client: GitHubClient,
    strategy: CursorStrategy,
}

impl PageCursor {
    /// Create a cursor issuing requests through `client`.
    pub fn new(client: GitHubClient, strategy: CursorStrategy) -> Self {
        Self { client, strategy }
    }

    /// Fetch the first page of `spec`.
    pub async fn first_page(&self, spec: &RequestSpec) -> Result<RawPage> {
        let mut url = spec.url();
        if self.strategy == CursorStrategy::PageNumber && find_param(&url, PAGE_NUMBER_PARAM).is_none() {
            set_query_param(&mut url, PAGE_NUMBER_PARAM, "1");
        }
        self.exchange(spec, url).await
    }

    /// Fetch the page `cursor` points at.
    pub async fn next_page(&self, spec: &RequestSpec, cursor: &Cursor) -> Result<RawPage> {
        let url = match &cursor.0 {
            CursorKind::Link(url) => url.clone(),
            CursorKind::PageNumber(page) => {
                let mut url = spec.url();
                set_query_param(&mut url, PAGE_NUMBER_PARAM, &page.to_string());
                url
            }
        };
        self.exchange(spec, url).await
    }

    async fn exchange(&self, spec: &RequestSpec, mut url: Url) -> Result<RawPage> {
        if spec.page_size() > 0 {
            set_query_param(&mut url, PAGE_SIZE_PARAM, &spec.page_size().to_string());
        }

        tracing::debug!(%url, "fetching page");
        let response = self.client.send_to(spec, url).await?;
        let (next, prev) = self.extract_cursors(&response);
        Ok(RawPage {
            response,
            next,
            prev,
        })
    }

    fn extract_cursors(&self, response: &RawResponse) -> (Option<Cursor>, Option<Cursor>) {
        match self.strategy {
            CursorStrategy::LinkHeader => {
                let link = |rel: &str| {
                    response
                        .header("link")
                        .and_then(|header| parse_link_header(header, rel))
                        .and_then(|url| Url::parse(&url).ok())
                        .map(|url| Cursor(CursorKind::Link(url)))
                };
                (link("next"), link("prev"))
            }
            CursorStrategy::PageNumber => {
                let current = find_param(&response.url, PAGE_NUMBER_PARAM)
                    .and_then(|p| p.parse::<u32>().ok())
                    .unwrap_or(1);
                let prev = (current > 1).then(|| Cursor(CursorKind::PageNumber(current - 1)));
                (Some(Cursor(CursorKind::PageNumber(current + 1))), prev)
            }
        }
    }
}

/// Parse a Link header and extract the URL for the given rel.
fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // Link header format: <url>; rel="next", <url>; rel="prev"
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(stripped) = segment.strip_prefix("rel=") {
                rel = Some(stripped.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(u), Some(r)) = (url, rel) {
            if r.split_whitespace().any(|r| r == target_rel) {
                return Some(u.to_string());
            }
        }
    }

    None
}

fn find_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Set `name=value` in the query, replacing any existing occurrence.
fn set_query_param(url: &mut Url, name: &str, value: &str) {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut query = url.query_pairs_mut();
    query.clear();
    for (k, v) in &retained {
        query.append_pair(k, v);
    }
    query.append_pair(name, value);
}
