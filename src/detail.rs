use crate::catalog::CatalogApi;
use crate::error::Result;
use crate::favorites::FavoritesStore;
use crate::models::{CoverType, Movie};
use serde::Serialize;
use tracing::warn;

/// A movie's detail screen: the record, its recommendations and whether it
/// is currently a favorite.
#[derive(Debug, Clone)]
pub struct MovieDetail {
    pub movie: Movie,
    pub recommendations: Vec<Movie>,
    pub cover: CoverType,
    is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailView {
    pub movie: Movie,
    pub image_url: Option<String>,
    pub rating: String,
    pub popularity: String,
    pub release_date: String,
    pub is_favorite: bool,
    pub recommendations: Vec<Movie>,
}

impl MovieDetail {
    /// Detail and recommendations are fetched concurrently; either failing
    /// fails the load. A favorites read failure only costs the flag.
    pub async fn load(
        catalog: &dyn CatalogApi,
        favorites: &FavoritesStore,
        id: i32,
        cover: CoverType,
    ) -> Result<Self> {
        let (movie, recommendations) =
            tokio::try_join!(catalog.fetch_movie(id), catalog.recommendations(id))?;
        let mut detail = Self::from_movie(movie, favorites, cover).await;
        detail.recommendations = recommendations.results;
        Ok(detail)
    }

    /// A detail around an already fetched record, without recommendations.
    pub async fn from_movie(movie: Movie, favorites: &FavoritesStore, cover: CoverType) -> Self {
        let is_favorite = match favorites.is_favorite(movie.id).await {
            Ok(flag) => flag,
            Err(e) => {
                warn!("Error checking favorites for {}: {}", movie.id, e);
                false
            }
        };
        Self {
            movie,
            recommendations: Vec::new(),
            cover,
            is_favorite,
        }
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Removes or adds the movie, then flips the flag. The flag only moves
    /// once the store call has succeeded; on failure it is logged and the
    /// previous state is kept.
    pub async fn toggle_favorite(&mut self, favorites: &FavoritesStore) -> bool {
        let outcome = if self.is_favorite {
            favorites.remove_favorite(self.movie.id).await
        } else {
            favorites.add_favorite(&self.movie).await
        };
        match outcome {
            Ok(()) => self.is_favorite = !self.is_favorite,
            Err(e) => warn!("Error updating favorite {}: {}", self.movie.id, e),
        }
        self.is_favorite
    }

    pub fn view(&self, image_base: &str) -> MovieDetailView {
        MovieDetailView {
            image_url: self.cover.image_url(image_base, &self.movie),
            rating: self.movie.rating_label(),
            popularity: self.movie.popularity_label(),
            release_date: self.movie.release_date_label(),
            is_favorite: self.is_favorite,
            recommendations: self.recommendations.clone(),
            movie: self.movie.clone(),
        }
    }
}
