use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engine::persist::{
    save_meta, save_records, save_vectors, CatalogMeta, CatalogPaths, CATALOG_VERSION,
};
use engine::{vectorize, MovieRecord, TermVector};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn movie(movie_id: u32, title: &str, tags: &str) -> MovieRecord {
    MovieRecord {
        movie_id,
        title: title.to_string(),
        tags: tags.to_string(),
    }
}

fn build_tiny_catalog(dir: &std::path::Path) {
    let records = vec![
        movie(11, "Solar Winds", "space action hero"),
        movie(22, "Dark Matter", "space action villain"),
        movie(33, "Iron Orbit", "space station drama"),
        movie(44, "Green Acres", "farm drama family"),
        movie(55, "Belly Laughs", "comedy family feelgood"),
        movie(66, "Ocean Floor", "deepsea documentary nature"),
        movie(77, "Last Tango", "dance romance drama"),
    ];
    let vectors: Vec<TermVector> = records.iter().map(|r| vectorize(&r.tags)).collect();

    let paths = CatalogPaths::new(dir);
    save_records(&paths, &records).unwrap();
    save_vectors(&paths, &vectors).unwrap();
    let meta = CatalogMeta {
        num_movies: records.len() as u32,
        created_at: "2024-01-01T00:00:00Z".into(),
        version: CATALOG_VERSION,
    };
    save_meta(&paths, &meta).unwrap();
}

fn test_app(dir: &std::path::Path) -> Router {
    // Key-less poster client: lookups short-circuit to None, no network.
    let posters = tmdb::PosterClient::new(None).unwrap();
    server::build_app(&dir.to_string_lossy(), posters).unwrap()
}

async fn call(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

#[tokio::test]
async fn recommend_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/recommend?title=Solar%20Winds&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["query"], "Solar Winds");

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    // Two shared tags rank above one.
    assert_eq!(results[0]["title"], "Dark Matter");
    assert_eq!(results[1]["title"], "Iron Orbit");
    assert!(results[0]["score"].as_f64().unwrap() > results[1]["score"].as_f64().unwrap());
    // No API key configured, so posters degrade to null.
    assert!(results[0]["poster_url"].is_null());
}

#[tokio::test]
async fn recommend_defaults_to_five_results() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/recommend?title=Solar%20Winds").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert!(results
        .iter()
        .all(|hit| hit["title"] != "Solar Winds"));
}

#[tokio::test]
async fn k_zero_is_clamped_to_one_result() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/recommend?title=Solar%20Winds&k=0").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Dark Matter");
}

#[tokio::test]
async fn oversized_k_is_capped_by_available_candidates() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    // k clamps to 100, then truncates to the six non-query rows.
    let (status, body) = call(app, "/recommend?title=Solar%20Winds&k=500").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|hit| hit["title"] != "Solar Winds"));
}

#[tokio::test]
async fn unknown_title_returns_404() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/recommend?title=Nope%20Film").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "title not found: Nope Film");
}

#[tokio::test]
async fn movies_lists_titles_in_catalog_order() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/movies").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["count"], 7);
    let titles = json["titles"].as_array().unwrap();
    assert_eq!(titles[0], "Solar Winds");
    assert_eq!(titles[6], "Last Tango");
}

#[tokio::test]
async fn movie_detail_resolves_by_external_id() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());

    let (status, body) = call(test_app(dir.path()), "/movie/33").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "Iron Orbit");
    assert_eq!(json["tags"], "space station drama");
    assert!(json["poster_url"].is_null());

    let (status, _) = call(test_app(dir.path()), "/movie/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_answers_ok() {
    let dir = tempdir().unwrap();
    build_tiny_catalog(dir.path());
    let app = test_app(dir.path());

    let (status, body) = call(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
