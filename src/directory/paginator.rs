use std::collections::{HashSet, VecDeque};
use std::future::Future;

use crate::error::{Error, Result};

/// One page of a listing plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        // services signal the last page with either a missing or an empty token
        let next_token = next_token.filter(|token| !token.is_empty());
        Self { items, next_token }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}

/// Anything able to fetch a page for a cursor.
pub trait PageSource {
    type Item;

    fn fetch(&self, token: Option<String>) -> impl Future<Output = Result<Page<Self::Item>>>;
}

impl<F, Fut, T> PageSource for F
where
    F: Fn(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    type Item = T;

    fn fetch(&self, token: Option<String>) -> impl Future<Output = Result<Page<T>>> {
        self(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy, finite, restartable sequence over a paginated listing.
///
/// A failed page discards everything not yet yielded and exhausts the
/// paginator; `restart` begins again from the first page. A next token that
/// was already sent since the first page is a malformed response.
pub struct Paginator<S: PageSource> {
    operation: &'static str,
    source: S,
    state: PageState,
    buffer: VecDeque<S::Item>,
    sent_tokens: HashSet<String>,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(operation: &'static str, source: S) -> Self {
        Self {
            operation,
            source,
            state: PageState::Start,
            buffer: VecDeque::new(),
            sent_tokens: HashSet::new(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PageState::Exhausted && self.buffer.is_empty()
    }

    pub fn restart(&mut self) {
        self.state = PageState::Start;
        self.buffer.clear();
        self.sent_tokens.clear();
    }

    fn fail(&mut self) {
        self.state = PageState::Exhausted;
        self.buffer.clear();
    }

    /// Returns the next batch of items: whatever is left of the current page
    /// first, otherwise a freshly fetched page.
    /// Returns `None` once the last cursor has been consumed.
    pub async fn next_page(&mut self) -> Option<Result<Vec<S::Item>>> {
        if !self.buffer.is_empty() {
            return Some(Ok(self.buffer.drain(..).collect()));
        }
        self.fetch_page().await
    }

    async fn fetch_page(&mut self) -> Option<Result<Vec<S::Item>>> {
        let token = match &self.state {
            PageState::Start => None,
            PageState::Next(token) => Some(token.clone()),
            PageState::Exhausted => return None,
        };
        if let Some(token) = &token {
            self.sent_tokens.insert(token.clone());
        }

        tracing::debug!(operation = self.operation, token = ?token, "Fetching page");
        let page = match self.source.fetch(token).await {
            Ok(page) => page,
            Err(err) => {
                self.fail();
                return Some(Err(err));
            }
        };

        match page.next_token {
            Some(next) if self.sent_tokens.contains(&next) => {
                self.fail();
                Some(Err(Error::malformed(
                    self.operation,
                    format!("next token {next} was already sent"),
                )))
            }
            Some(next) => {
                self.state = PageState::Next(next);
                Some(Ok(page.items))
            }
            None => {
                self.state = PageState::Exhausted;
                Some(Ok(page.items))
            }
        }
    }

    pub async fn next(&mut self) -> Option<Result<S::Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.fetch_page().await? {
                Ok(items) => self.buffer.extend(items),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Drains the remaining sequence; fails on the first failed page.
    pub async fn try_collect(&mut self) -> Result<Vec<S::Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    pub async fn find<P>(&mut self, mut predicate: P) -> Result<Option<S::Item>>
    where
        P: FnMut(&S::Item) -> bool,
    {
        while let Some(item) = self.next().await {
            let item = item?;
            if predicate(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}
