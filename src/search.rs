//! Paginated keyword search.
//!
//! [`SearchSession`] is the pure state machine: it hands out a
//! [`PageRequest`] when a fetch may start and folds the outcome back in.
//! [`SearchAccumulator`] drives it against the catalog, holding the session
//! lock only around state transitions so a keyword edit lands immediately
//! even while a page is in flight.

use crate::catalog::CatalogApi;
use crate::error::Result;
use crate::models::{Movie, MoviePage};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    keyword: String,
    page: u32,
    results: Vec<Movie>,
    state: SearchState,
    error: Option<String>,
    total_pages: Option<u32>,
    /// Bumped on every keyword change; responses tagged with an older value
    /// are dropped.
    #[serde(skip)]
    generation: u64,
}

/// A page fetch the session has agreed to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub keyword: String,
    pub page: u32,
    generation: u64,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            page: 1,
            results: Vec::new(),
            state: SearchState::Idle,
            error: None,
            total_pages: None,
            generation: 0,
        }
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The page the next fetch will ask for.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> &[Movie] {
        &self.results
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == SearchState::Loading
    }

    /// Resets results and paging when the keyword actually changes.
    pub fn set_keyword(&mut self, keyword: &str) {
        if keyword == self.keyword {
            return;
        }
        self.keyword = keyword.to_string();
        self.page = 1;
        self.results.clear();
        self.state = SearchState::Idle;
        self.error = None;
        self.total_pages = None;
        self.generation += 1;
    }

    /// Starts over from page 1 of the current keyword.
    pub fn begin_submit(&mut self) -> Option<PageRequest> {
        if !self.can_fetch() {
            return None;
        }
        self.page = 1;
        Some(self.begin())
    }

    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if !self.can_fetch() {
            return None;
        }
        Some(self.begin())
    }

    fn can_fetch(&self) -> bool {
        !self.is_loading() && !self.keyword.is_empty()
    }

    fn begin(&mut self) -> PageRequest {
        self.state = SearchState::Loading;
        self.error = None;
        PageRequest {
            keyword: self.keyword.clone(),
            page: self.page,
            generation: self.generation,
        }
    }

    /// Applies a finished fetch. Returns `false` when the response belongs to
    /// a keyword that has since been replaced and was ignored.
    pub fn complete(&mut self, request: PageRequest, outcome: Result<MoviePage>) -> bool {
        if request.generation != self.generation {
            return false;
        }
        match outcome {
            Ok(page) => {
                if request.page == 1 {
                    self.results = page.results;
                } else {
                    self.results.extend(page.results);
                }
                self.page = request.page + 1;
                self.total_pages = Some(page.total_pages);
                self.state = SearchState::Loaded;
            }
            Err(e) => {
                self.state = SearchState::Error;
                self.error = Some(format!("Error fetching movies: {e}"));
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct SearchAccumulator {
    catalog: Arc<dyn CatalogApi>,
    session: Arc<Mutex<SearchSession>>,
}

impl SearchAccumulator {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            session: Arc::new(Mutex::new(SearchSession::new())),
        }
    }

    pub async fn snapshot(&self) -> SearchSession {
        self.session.lock().await.clone()
    }

    pub async fn set_keyword(&self, keyword: &str) -> SearchSession {
        let mut session = self.session.lock().await;
        session.set_keyword(keyword);
        session.clone()
    }

    pub async fn submit(&self) -> SearchSession {
        let request = self.session.lock().await.begin_submit();
        self.run(request).await
    }

    pub async fn load_more(&self) -> SearchSession {
        let request = self.session.lock().await.begin_load_more();
        self.run(request).await
    }

    async fn run(&self, request: Option<PageRequest>) -> SearchSession {
        let Some(request) = request else {
            return self.snapshot().await;
        };
        debug!(keyword = %request.keyword, page = request.page, "searching");
        let outcome = self
            .catalog
            .search_movies(&request.keyword, request.page)
            .await;
        if let Err(e) = &outcome {
            warn!("Search for '{}' failed: {}", request.keyword, e);
        }

        let mut session = self.session.lock().await;
        let keyword = request.keyword.clone();
        if !session.complete(request, outcome) {
            debug!(%keyword, "discarded response for replaced keyword");
        }
        session.clone()
    }
}
