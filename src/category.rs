use crate::catalog::{join_ids, CatalogApi};
use crate::error::Result;
use crate::models::{Genre, Movie};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Genre ids picked by the user, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenreSelection(Vec<i32>);

impl GenreSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.0.contains(&id)
    }

    /// Adds the id if absent, removes it if present.
    pub fn toggle(&mut self, id: i32) {
        if self.contains(id) {
            self.0.retain(|g| *g != id);
        } else {
            self.0.push(id);
        }
    }

    pub fn ids(&self) -> &[i32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What the result view receives: the selection plus the genre names it
/// needs for its header.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryQuery {
    pub selected: GenreSelection,
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResults {
    pub label: String,
    pub results: Vec<Movie>,
    pub error: Option<String>,
}

impl CategoryQuery {
    pub fn with_genres_param(&self) -> String {
        join_ids(self.selected.ids())
    }

    /// "Result of Action, Drama Genre"
    pub fn label(&self) -> String {
        let names = self
            .selected
            .ids()
            .iter()
            .map(|id| {
                self.genres
                    .iter()
                    .find(|g| g.id == *id)
                    .map(|g| g.name.as_str())
                    .unwrap_or("Unknown Genre")
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("Result of {names} Genre")
    }

    /// One discover call, no paging. A failed fetch becomes an inline error
    /// with no results.
    pub async fn fetch(&self, catalog: &dyn CatalogApi) -> CategoryResults {
        let label = self.label();
        match catalog.discover_by_genres(self.selected.ids()).await {
            Ok(page) => CategoryResults {
                label,
                results: page.results,
                error: None,
            },
            Err(e) => {
                warn!("Error fetching search results: {}", e);
                CategoryResults {
                    label,
                    results: Vec::new(),
                    error: Some(format!("Error fetching search results: {e}")),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorySnapshot {
    pub genres: Vec<Genre>,
    pub selected: GenreSelection,
}

/// Genre picker state: the vocabulary is fetched on first use and kept for
/// the rest of the session.
#[derive(Clone)]
pub struct CategorySearch {
    catalog: Arc<dyn CatalogApi>,
    state: Arc<Mutex<CategorySnapshot>>,
}

impl CategorySearch {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            state: Arc::new(Mutex::new(CategorySnapshot::default())),
        }
    }

    pub async fn load(&self) -> Result<CategorySnapshot> {
        {
            let state = self.state.lock().await;
            if !state.genres.is_empty() {
                return Ok(state.clone());
            }
        }
        let genres = self.catalog.genres().await?;
        info!("Loaded {} genres", genres.len());
        let mut state = self.state.lock().await;
        if state.genres.is_empty() {
            state.genres = genres;
        }
        Ok(state.clone())
    }

    pub async fn toggle(&self, id: i32) -> GenreSelection {
        let mut state = self.state.lock().await;
        state.selected.toggle(id);
        state.selected.clone()
    }

    pub async fn submit(&self) -> CategoryQuery {
        let state = self.state.lock().await;
        CategoryQuery {
            selected: state.selected.clone(),
            genres: state.genres.clone(),
        }
    }

    pub fn catalog(&self) -> &dyn CatalogApi {
        self.catalog.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let mut selection = GenreSelection::new();
        selection.toggle(28);
        let before = selection.clone();
        selection.toggle(5);
        assert!(selection.contains(5));
        selection.toggle(5);
        assert_eq!(selection, before);
    }

    #[test]
    fn label_and_param_follow_selection_order() {
        let mut selected = GenreSelection::new();
        selected.toggle(18);
        selected.toggle(28);
        selected.toggle(999);
        let query = CategoryQuery {
            selected,
            genres: vec![genre(28, "Action"), genre(18, "Drama")],
        };
        assert_eq!(query.with_genres_param(), "18,28,999");
        assert_eq!(query.label(), "Result of Drama, Action, Unknown Genre Genre");
    }

    struct FakeCatalog {
        genre_calls: AtomicUsize,
        fail_discover: bool,
    }

    #[async_trait]
    impl CatalogApi for FakeCatalog {
        async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
            match path {
                "genre/movie/list" => {
                    self.genre_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "genres": [
                        { "id": 28, "name": "Action" },
                        { "id": 35, "name": "Comedy" }
                    ] }))
                }
                "discover/movie" if self.fail_discover => {
                    Err(Error::fetch(Some(401), "invalid token"))
                }
                "discover/movie" => {
                    assert_eq!(query[0], ("with_genres", "35,28".to_string()));
                    Ok(json!({ "page": 1, "results": [{ "id": 1, "title": "Rush Hour" }] }))
                }
                other => Err(Error::fetch(Some(404), other.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn fetches_genres_once_and_discovers_selection() {
        let catalog = Arc::new(FakeCatalog {
            genre_calls: AtomicUsize::new(0),
            fail_discover: false,
        });
        let picker = CategorySearch::new(catalog.clone());
        assert_eq!(picker.load().await.unwrap().genres.len(), 2);
        picker.load().await.unwrap();
        assert_eq!(catalog.genre_calls.load(Ordering::SeqCst), 1);

        picker.toggle(35).await;
        picker.toggle(28).await;
        let query = picker.submit().await;
        let results = query.fetch(picker.catalog()).await;
        assert_eq!(results.label, "Result of Comedy, Action Genre");
        assert_eq!(results.results.len(), 1);
        assert!(results.error.is_none());
    }

    #[tokio::test]
    async fn discover_failure_becomes_inline_error() {
        let catalog = FakeCatalog {
            genre_calls: AtomicUsize::new(0),
            fail_discover: true,
        };
        let mut selected = GenreSelection::new();
        selected.toggle(35);
        let query = CategoryQuery {
            selected,
            genres: vec![genre(35, "Comedy")],
        };
        let results = query.fetch(&catalog).await;
        assert!(results.results.is_empty());
        assert!(results.error.unwrap().contains("status 401"));
    }
}
