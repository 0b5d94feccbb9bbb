//! Lazy, restartable sequences over paginated endpoints.
//!
//! A [`PagedIterable`] is a description of a sequence: it holds the request
//! and the page decoder but no items. Each call to [`PagedIterable::iter`]
//! hands out a fresh [`PagedIterator`] that re-issues the first request when
//! it is first pulled. Iterators buffer one page at a time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};

use crate::client::GitHubClient;
use crate::decode::PageDecoder;
use crate::error::{GitHubError, Result};
use crate::pagination::{Cursor, CursorStrategy, Page, PageCursor, RawPage};
use crate::request::RequestSpec;

/// Hook run on every item right after it is decoded.
pub type ItemInitializer<T> = Arc<dyn Fn(&mut T) -> Result<()> + Send + Sync>;

enum Source<T> {
    Remote {
        client: GitHubClient,
        spec: RequestSpec,
        strategy: CursorStrategy,
        decoder: Arc<dyn PageDecoder<T>>,
    },
    Fixed(Arc<Vec<T>>),
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Remote {
                client,
                spec,
                strategy,
                decoder,
            } => Self::Remote {
                client: client.clone(),
                spec: spec.clone(),
                strategy: *strategy,
                decoder: Arc::clone(decoder),
            },
            Self::Fixed(items) => Self::Fixed(Arc::clone(items)),
        }
    }
}

/// A lazy sequence of `T` backed by one or more pages.
///
/// Creating the sequence sends nothing. Iteration is pull-based: the first
/// page is requested when an iterator is first asked whether it has an item,
/// and each following page when the current one runs out.
pub struct PagedIterable<T> {
    source: Source<T>,
    initializer: Option<ItemInitializer<T>>,
    started: Arc<AtomicBool>,
}

impl<T> Clone for PagedIterable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            initializer: self.initializer.clone(),
            started: Arc::clone(&self.started),
        }
    }
}

impl<T> fmt::Debug for PagedIterable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PagedIterable");
        match &self.source {
            Source::Remote { spec, strategy, .. } => {
                s.field("url", &spec.base_url().as_str())
                    .field("page_size", &spec.page_size())
                    .field("strategy", strategy);
            }
            Source::Fixed(items) => {
                s.field("fixed_len", &items.len());
            }
        }
        s.field("started", &self.started.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> PagedIterable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A sequence fetched page by page through `client`.
    pub fn new(
        client: GitHubClient,
        spec: RequestSpec,
        decoder: Arc<dyn PageDecoder<T>>,
        initializer: Option<ItemInitializer<T>>,
    ) -> Self {
        Self {
            source: Source::Remote {
                client,
                spec,
                strategy: CursorStrategy::default(),
                decoder,
            },
            initializer,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A sequence over items already in memory (a single page).
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            source: Source::Fixed(Arc::new(items)),
            initializer: None,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use `strategy` to locate following pages.
    #[must_use]
    pub fn with_cursor_strategy(mut self, strategy: CursorStrategy) -> Self {
        if let Source::Remote { strategy: s, .. } = &mut self.source {
            *s = strategy;
        }
        self
    }

    /// Requested page size (0 = server default).
    pub fn page_size(&self) -> u32 {
        match &self.source {
            Source::Remote { spec, .. } => spec.page_size(),
            Source::Fixed(_) => 0,
        }
    }

    /// The request this sequence issues, if it is backed by the network.
    pub fn spec(&self) -> Option<&RequestSpec> {
        match &self.source {
            Source::Remote { spec, .. } => Some(spec),
            Source::Fixed(_) => None,
        }
    }

    /// Returns true once any iterator of this sequence has fetched a page.
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// A copy of this sequence requesting `page_size` items per page.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::State`] if this sequence has already started
    /// fetching. The sequence itself is never modified.
    pub fn with_page_size(&self, page_size: u32) -> Result<Self> {
        if self.has_started() {
            return Err(GitHubError::State(
                "page size cannot change after iteration has started".to_string(),
            ));
        }

        let source = match &self.source {
            Source::Remote {
                client,
                spec,
                strategy,
                decoder,
            } => Source::Remote {
                client: client.clone(),
                spec: spec.with_page_size(page_size),
                strategy: *strategy,
                decoder: Arc::clone(decoder),
            },
            Source::Fixed(items) => Source::Fixed(Arc::clone(items)),
        };

        Ok(Self {
            source,
            initializer: self.initializer.clone(),
            started: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A fresh iterator starting from the first page.
    pub fn iter(&self) -> PagedIterator<T> {
        match &self.source {
            Source::Remote {
                client,
                spec,
                strategy,
                decoder,
            } => PagedIterator {
                remote: Some(RemoteState {
                    cursor: PageCursor::new(client.clone(), *strategy),
                    spec: spec.clone(),
                    decoder: Arc::clone(decoder),
                    started: Arc::clone(&self.started),
                }),
                position: Position::NotStarted,
                buffer: VecDeque::new(),
                initializer: self.initializer.clone(),
                pages_fetched: 0,
            },
            Source::Fixed(items) => PagedIterator {
                remote: None,
                position: Position::Done,
                buffer: items.iter().cloned().collect(),
                initializer: None,
                pages_fetched: 0,
            },
        }
    }

    /// Drain a fresh iterator into a list.
    ///
    /// Fetches every page; only suitable for bounded result sets.
    pub async fn to_list(&self) -> Result<Vec<T>> {
        let mut iter = self.iter();
        let mut items = Vec::new();
        while let Some(item) = iter.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Drain a fresh iterator into a boxed slice.
    pub async fn to_array(&self) -> Result<Box<[T]>> {
        Ok(self.to_list().await?.into_boxed_slice())
    }

    /// A stream over a fresh iterator.
    pub fn stream(&self) -> impl Stream<Item = Result<T>> + Send + 'static {
        stream::try_unfold(self.iter(), |mut iter| async move {
            Ok(iter.try_next().await?.map(|item| (item, iter)))
        })
    }
}

struct RemoteState<T> {
    cursor: PageCursor,
    spec: RequestSpec,
    decoder: Arc<dyn PageDecoder<T>>,
    started: Arc<AtomicBool>,
}

enum Position {
    NotStarted,
    At(Cursor),
    Done,
}

/// Single-pass iterator over a [`PagedIterable`].
///
/// Not meant to be shared; every method takes `&mut self`.
pub struct PagedIterator<T> {
    remote: Option<RemoteState<T>>,
    position: Position,
    buffer: VecDeque<T>,
    initializer: Option<ItemInitializer<T>>,
    pages_fetched: usize,
}

impl<T> fmt::Debug for PagedIterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedIterator")
            .field("buffered", &self.buffer.len())
            .field("pages_fetched", &self.pages_fetched)
            .field("done", &matches!(self.position, Position::Done))
            .finish()
    }
}

impl<T> PagedIterator<T> {
    /// Returns true if another item is available, fetching the next page
    /// when the current one is exhausted.
    ///
    /// Pages that come back empty but still point at a following page are
    /// skipped.
    pub async fn has_next(&mut self) -> Result<bool> {
        while self.buffer.is_empty() {
            let Some(page) = self.fetch_page().await? else {
                return Ok(false);
            };
            self.buffer.extend(page);
        }
        Ok(true)
    }

    /// The next buffered item.
    ///
    /// Never fetches; returns `None` when [`has_next`](Self::has_next) has
    /// not been called or returned `false`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<T> {
        self.buffer.pop_front()
    }

    /// [`has_next`](Self::has_next) followed by [`next`](Self::next).
    pub async fn try_next(&mut self) -> Result<Option<T>> {
        if self.has_next().await? {
            Ok(self.next())
        } else {
            Ok(None)
        }
    }

    /// The rest of the current page, or the following page if the current
    /// one is exhausted. `None` once the sequence is over.
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
        if !self.buffer.is_empty() {
            let items = self.buffer.drain(..).collect();
            return Ok(Some(Page::new(items, self.next_cursor(), None)));
        }
        self.fetch_page().await
    }

    /// Number of pages requested so far by this iterator.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn next_cursor(&self) -> Option<Cursor> {
        match &self.position {
            Position::At(cursor) => Some(cursor.clone()),
            Position::NotStarted | Position::Done => None,
        }
    }

    async fn fetch_page(&mut self) -> Result<Option<Page<T>>> {
        let Some(remote) = &self.remote else {
            self.position = Position::Done;
            return Ok(None);
        };

        let raw: RawPage = match &self.position {
            Position::Done => return Ok(None),
            Position::NotStarted => {
                // Fetching has begun even if the exchange fails.
                remote.started.store(true, Ordering::Release);
                remote.cursor.first_page(&remote.spec).await?
            }
            Position::At(cursor) => remote.cursor.next_page(&remote.spec, cursor).await?,
        };
        self.pages_fetched += 1;

        let mut items = remote
            .decoder
            .decode_page(&raw.response.body, remote.spec.context())?;
        if let Some(init) = &self.initializer {
            for item in &mut items {
                init(item)?;
            }
        }

        let page = Page::new(items, raw.next, raw.prev);
        tracing::debug!(
            page = self.pages_fetched,
            items = page.len(),
            last = page.is_last(),
            "decoded page"
        );

        self.position = match (&page.next, page.is_last()) {
            (Some(cursor), false) => Position::At(cursor.clone()),
            _ => Position::Done,
        };
        Ok(Some(page))
    }
}
