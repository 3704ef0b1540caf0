use crate::catalog::{CatalogApi, CatalogClient};
use crate::category::CategorySearch;
use crate::config::Config;
use crate::detail::MovieDetail;
use crate::error::Error;
use crate::favorites::FavoritesStore;
use crate::home::load_home;
use crate::models::{Category, CoverType};
use crate::search::SearchAccumulator;
use crate::storage::{FileStore, KeyValueStore};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub favorites: FavoritesStore,
    pub search: SearchAccumulator,
    pub categories: CategorySearch,
    pub image_base: Arc<str>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        storage: Arc<dyn KeyValueStore>,
        image_base: &str,
    ) -> Self {
        Self {
            favorites: FavoritesStore::new(storage),
            search: SearchAccumulator::new(catalog.clone()),
            categories: CategorySearch::new(catalog.clone()),
            catalog,
            image_base: Arc::from(image_base),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(CatalogClient::from_config(&config)?);
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.favorites_path).await?);
    let state = AppState::new(catalog, storage, &config.image_base_url);

    let app = build_router(state).layer(TraceLayer::new_for_http());

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/home", get(home))
        .route("/lists/:category", get(category_list))
        .route("/movies/:id", get(movie_detail))
        .route("/movies/:id/favorite", post(toggle_favorite))
        .route("/favorites", get(favorites))
        .route("/search", get(search_snapshot))
        .route("/search/keyword", put(set_keyword))
        .route("/search/submit", post(search_submit))
        .route("/search/more", post(search_more))
        .route("/genres", get(genres))
        .route("/genres/selection/:id", post(toggle_genre))
        .route("/genres/results", post(genre_results))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn home(State(state): State<AppState>) -> Response {
    Json(load_home(state.catalog.as_ref()).await).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn category_list(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, Error> {
    let category = Category::parse(&category)
        .ok_or_else(|| Error::InvalidInput(format!("unknown category '{category}'")))?;
    let page = state
        .catalog
        .list_category(category, query.page.unwrap_or(1).max(1))
        .await?;
    Ok(Json(page).into_response())
}

#[derive(Deserialize)]
struct DetailQuery {
    cover: Option<String>,
}

async fn movie_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<DetailQuery>,
) -> Result<Response, Error> {
    let cover = match query.cover.as_deref() {
        None => CoverType::default(),
        Some(raw) => CoverType::parse(raw)
            .ok_or_else(|| Error::InvalidInput(format!("unknown cover type '{raw}'")))?,
    };
    let detail = MovieDetail::load(state.catalog.as_ref(), &state.favorites, id, cover).await?;
    Ok(Json(detail.view(&state.image_base)).into_response())
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, Error> {
    let movie = state.catalog.fetch_movie(id).await?;
    let mut detail = MovieDetail::from_movie(movie, &state.favorites, CoverType::Poster).await;
    let is_favorite = detail.toggle_favorite(&state.favorites).await;
    Ok(Json(json!({ "id": id, "is_favorite": is_favorite })).into_response())
}

async fn favorites(State(state): State<AppState>) -> Response {
    match state.favorites.list_favorites().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => {
            error!("Failed to load favorite movies: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load favorite movies." })),
            )
                .into_response()
        }
    }
}

async fn search_snapshot(State(state): State<AppState>) -> Response {
    Json(state.search.snapshot().await).into_response()
}

#[derive(Deserialize)]
struct KeywordBody {
    keyword: String,
}

async fn set_keyword(State(state): State<AppState>, Json(body): Json<KeywordBody>) -> Response {
    Json(state.search.set_keyword(&body.keyword).await).into_response()
}

async fn search_submit(State(state): State<AppState>) -> Response {
    Json(state.search.submit().await).into_response()
}

async fn search_more(State(state): State<AppState>) -> Response {
    Json(state.search.load_more().await).into_response()
}

async fn genres(State(state): State<AppState>) -> Result<Response, Error> {
    Ok(Json(state.categories.load().await?).into_response())
}

async fn toggle_genre(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    Json(state.categories.toggle(id).await).into_response()
}

async fn genre_results(State(state): State<AppState>) -> Response {
    let query = state.categories.submit().await;
    info!("Searching for movies with genres: {}", query.with_genres_param());
    Json(query.fetch(state.categories.catalog()).await).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
