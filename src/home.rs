use crate::catalog::CatalogApi;
use crate::models::{Category, CoverType, Movie};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

pub struct HomeSection {
    pub title: &'static str,
    pub category: Category,
    pub cover: CoverType,
}

pub static HOME_SECTIONS: [HomeSection; 4] = [
    HomeSection {
        title: "Now Playing in Theater",
        category: Category::NowPlaying,
        cover: CoverType::Backdrop,
    },
    HomeSection {
        title: "Upcoming Movies",
        category: Category::Upcoming,
        cover: CoverType::Poster,
    },
    HomeSection {
        title: "Top Rated Movies",
        category: Category::TopRated,
        cover: CoverType::Poster,
    },
    HomeSection {
        title: "Popular Movies",
        category: Category::Popular,
        cover: CoverType::Poster,
    },
];

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub title: &'static str,
    pub category: Category,
    pub cover: CoverType,
    pub movies: Vec<Movie>,
    pub error: Option<String>,
}

/// Loads every home section concurrently. A failed section reports its own
/// error and leaves the others alone.
pub async fn load_home(catalog: &dyn CatalogApi) -> Vec<SectionView> {
    let loads = HOME_SECTIONS.iter().map(|section| async move {
        match catalog.list_category(section.category, 1).await {
            Ok(page) => SectionView {
                title: section.title,
                category: section.category,
                cover: section.cover,
                movies: page.results,
                error: None,
            },
            Err(e) => {
                warn!("Failed to load '{}': {}", section.title, e);
                SectionView {
                    title: section.title,
                    category: section.category,
                    cover: section.cover,
                    movies: Vec::new(),
                    error: Some("Failed to fetch data".to_string()),
                }
            }
        }
    });
    join_all(loads).await
}
