use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Category, Genre, Movie, MoviePage};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Read access to the movie catalog.
///
/// Every typed operation is a thin layer over [`CatalogApi::fetch_json`];
/// implementations only have to answer raw JSON for a path and query.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;

    async fn list_category(&self, category: Category, page: u32) -> Result<MoviePage> {
        let path = format!("movie/{}", category.as_path());
        let query = [("language", "en-US".to_string()), ("page", page.to_string())];
        decode(&path, self.fetch_json(&path, &query).await?)
    }

    async fn fetch_movie(&self, id: i32) -> Result<Movie> {
        let path = format!("movie/{id}");
        decode(&path, self.fetch_json(&path, &[]).await?)
    }

    async fn recommendations(&self, id: i32) -> Result<MoviePage> {
        let path = format!("movie/{id}/recommendations");
        decode(&path, self.fetch_json(&path, &[]).await?)
    }

    async fn search_movies(&self, keyword: &str, page: u32) -> Result<MoviePage> {
        let path = "search/movie";
        let query = [("query", keyword.to_string()), ("page", page.to_string())];
        decode(path, self.fetch_json(path, &query).await?)
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreList {
            genres: Vec<Genre>,
        }

        let path = "genre/movie/list";
        let list: GenreList = decode(path, self.fetch_json(path, &[]).await?)?;
        Ok(list.genres)
    }

    /// Single page only; the result view never asks for more.
    async fn discover_by_genres(&self, genre_ids: &[i32]) -> Result<MoviePage> {
        let path = "discover/movie";
        let query = [("with_genres", join_ids(genre_ids))];
        decode(path, self.fetch_json(path, &query).await?)
    }
}

pub fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::InvalidResponse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let user_agent = format!("movieshelf/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::fetch(None, format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.catalog_base_url, &config.api_access_token)
    }

    /// Absolute URLs pass through untouched; anything else is joined to the
    /// catalog base.
    fn url_for(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            return path_or_url.to_string();
        }
        format!("{}/{}", self.base_url, path_or_url.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path_or_url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url_for(path_or_url);
        debug!(%url, "catalog request");
        let res = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::fetch(e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Error::fetch(Some(status.as_u16()), format!("reading body: {e}")))?;
        if !status.is_success() {
            return Err(Error::fetch(
                Some(status.as_u16()),
                format!("{} -> {}", path_or_url, text),
            ));
        }
        serde_json::from_str(&text).map_err(|e| Error::InvalidResponse {
            path: path_or_url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn fetch_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.get_json(path, query).await
    }
}
