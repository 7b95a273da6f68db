use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use engine::persist::{load_catalog, CatalogPaths};
use engine::{Catalog, CatalogError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tmdb::PosterClient;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct RecommendParams {
    pub title: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    5
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<RecommendHit>,
}

#[derive(Serialize)]
pub struct RecommendHit {
    pub movie_id: u32,
    pub title: String,
    pub score: f64,
    pub poster_url: Option<String>,
}

#[derive(Serialize)]
pub struct MovieListResponse {
    pub count: usize,
    pub titles: Vec<String>,
}

#[derive(Serialize)]
pub struct MovieDetail {
    pub movie_id: u32,
    pub title: String,
    pub tags: String,
    pub poster_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub posters: Arc<PosterClient>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn not_found(message: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

pub fn build_app(catalog_dir: &str, posters: PosterClient) -> Result<Router> {
    // Load the catalog once at startup; it is read-only from here on.
    let catalog = load_catalog(&CatalogPaths::new(catalog_dir))?;
    tracing::info!(
        num_movies = catalog.len(),
        matrix = catalog.has_matrix(),
        posters = posters.enabled(),
        "catalog loaded"
    );
    let state = AppState {
        catalog: Arc::new(catalog),
        posters: Arc::new(posters),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/movies", get(movies_handler))
        .route("/movie/:movie_id", get(movie_handler))
        .route("/recommend", get(recommend_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let start = Instant::now();
    let k = params.k.max(1).min(100);

    let ranked = match state.catalog.recommend(&params.title, k) {
        Ok(ranked) => ranked,
        Err(CatalogError::TitleNotFound(title)) => {
            return Err(not_found(format!("title not found: {title}")));
        }
    };

    // Posters resolve sequentially so the response order stays rank order;
    // a failed lookup only degrades its own entry to null.
    let mut results = Vec::with_capacity(ranked.len());
    for (index, score) in ranked {
        let Some(record) = state.catalog.record(index) else {
            continue;
        };
        let poster_url = state.posters.poster_url(record.movie_id).await;
        results.push(RecommendHit {
            movie_id: record.movie_id,
            title: record.title.clone(),
            score,
            poster_url,
        });
    }

    Ok(Json(RecommendResponse {
        query: params.title,
        took_s: start.elapsed().as_secs_f64(),
        results,
    }))
}

pub async fn movies_handler(State(state): State<AppState>) -> Json<MovieListResponse> {
    let titles: Vec<String> = state.catalog.titles().map(|t| t.to_string()).collect();
    Json(MovieListResponse {
        count: titles.len(),
        titles,
    })
}

pub async fn movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<u32>,
) -> Result<Json<MovieDetail>, ApiError> {
    let Some(record) = state.catalog.record_by_movie_id(movie_id) else {
        return Err(not_found(format!("movie id not found: {movie_id}")));
    };
    let poster_url = state.posters.poster_url(record.movie_id).await;
    Ok(Json(MovieDetail {
        movie_id: record.movie_id,
        title: record.title.clone(),
        tags: record.tags.clone(),
        poster_url,
    }))
}
