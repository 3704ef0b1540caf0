use crate::error::{Error, Result};
use crate::models::Movie;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub const FAVORITES_KEY: &str = "@FavoriteList";

/// The persisted favorites list: one JSON array under [`FAVORITES_KEY`].
///
/// Every mutation is a read-modify-write of the whole array. Nothing guards
/// two concurrent mutations against each other; the later write wins.
/// Adding an id that is already present stores it a second time.
#[derive(Clone)]
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Missing or unparsable data reads as an empty list. Only a failing
    /// storage backend is an error.
    pub async fn list_favorites(&self) -> Result<Vec<Movie>> {
        let raw = self.storage.get(FAVORITES_KEY).await?;
        match decode_list(raw.as_deref()) {
            Ok(list) => Ok(list),
            Err(e) => {
                warn!("Treating favorites as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn is_favorite(&self, id: i32) -> Result<bool> {
        Ok(self.list_favorites().await?.iter().any(|m| m.id == id))
    }

    pub async fn add_favorite(&self, movie: &Movie) -> Result<()> {
        let mut list = self.list_favorites().await?;
        list.push(movie.clone());
        self.write(&list).await?;
        debug!(id = movie.id, count = list.len(), "added favorite");
        Ok(())
    }

    pub async fn remove_favorite(&self, id: i32) -> Result<()> {
        let mut list = self.list_favorites().await?;
        let before = list.len();
        list.retain(|m| m.id != id);
        self.write(&list).await?;
        debug!(id, removed = before - list.len(), "removed favorite");
        Ok(())
    }

    async fn write(&self, list: &[Movie]) -> Result<()> {
        let blob = serde_json::to_string(list).map_err(Error::store)?;
        self.storage.set(FAVORITES_KEY, &blob).await
    }
}

fn decode_list(raw: Option<&str>) -> Result<Vec<Movie>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| Error::ParseFailed(e.to_string())),
    }
}
