//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Density and category tiles over HTTP
//! - Error cases (unknown dataset, invalid zoom, out-of-bounds tiles)
//! - HTTP response codes and headers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::Rgb;
use tempfile::TempDir;
use tower::ServiceExt;

use isbn_atlas::{category_color, create_router, RouterConfig};

use super::test_utils::{create_service, decode_tile, greens};

async fn test_router(cache_dir: &TempDir) -> Router {
    create_router(create_service(cache_dir.path()).await, RouterConfig::new())
}

async fn get(router: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_density_tile_success() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/sample/1/0/0.webp").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/webp");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(response.headers().get("x-tile-cache-hit").unwrap(), "false");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let tile = decode_tile(&body);
    assert_eq!(tile.dimensions(), (2, 2));
    assert_eq!(greens(&tile), vec![255, 255, 255, 0]);
    assert!(tile.pixels().all(|p| p[0] == 0 && p[2] == 0));
}

#[tokio::test]
async fn test_density_tile_extension_optional() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/sample/1/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let first = get(router.clone(), "/tiles/density/sample/1/0/0.webp").await;
    assert_eq!(first.headers().get("x-tile-cache-hit").unwrap(), "false");
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = get(router, "/tiles/density/sample/1/0/0.webp").await;
    assert_eq!(second.headers().get("x-tile-cache-hit").unwrap(), "true");
    let second_body = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn test_union_dataset_served() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/all_isbns/1/0/0.webp").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(greens(&decode_tile(&body)), vec![255, 255, 255, 0]);
}

#[tokio::test]
async fn test_empty_region_is_black() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/sample/4/100/100.webp").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let tile = decode_tile(&body);
    assert_eq!(tile.dimensions(), (16, 16));
    assert!(tile.pixels().all(|p| *p == Rgb([0, 0, 0])));
}

#[tokio::test]
async fn test_countries_tile() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/countries/16/0/0.webp").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let tile = decode_tile(&body);
    assert_eq!(tile.dimensions(), (256, 256));
    // Row i samples 978 followed by 256 * 65536 * i.
    assert_eq!(*tile.get_pixel(0, 0), category_color(0));
    assert_eq!(*tile.get_pixel(0, 6), category_color(1));
    assert_eq!(*tile.get_pixel(0, 15), Rgb([0, 0, 0]));
}

#[tokio::test]
async fn test_publishers_tile() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/publishers/16/0/0.webp").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let tile = decode_tile(&body);
    assert_eq!(*tile.get_pixel(0, 0), category_color(0));
    assert_eq!(*tile.get_pixel(0, 2), category_color(1));
    // 978-1 only has an unassigned range.
    assert_eq!(*tile.get_pixel(0, 6), Rgb([0, 0, 0]));
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_unknown_dataset() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/nonexistent/1/0/0.webp").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_invalid_zoom() {
    let cache_dir = TempDir::new().unwrap();

    for uri in [
        "/tiles/density/sample/0/0/0.webp",
        "/tiles/density/sample/17/0/0.webp",
        "/tiles/countries/0/0/0.webp",
        "/tiles/publishers/17/0/0.webp",
    ] {
        let response = get(test_router(&cache_dir).await, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["error"], "invalid_zoom");
    }
}

#[tokio::test]
async fn test_tile_out_of_bounds() {
    let cache_dir = TempDir::new().unwrap();

    for uri in [
        "/tiles/density/sample/16/0/1.webp",
        "/tiles/density/sample/16/1/0.webp",
        "/tiles/countries/1/7630/0.webp",
        "/tiles/publishers/1/0/32768.webp",
    ] {
        let response = get(test_router(&cache_dir).await, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["error"], "tile_out_of_bounds");
    }
}

#[tokio::test]
async fn test_invalid_coordinate() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/countries/1/0/abc.webp").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_coordinate");
}

#[tokio::test]
async fn test_non_numeric_zoom_and_row_return_json() {
    let cache_dir = TempDir::new().unwrap();

    for uri in [
        "/tiles/density/sample/abc/0/0.webp",
        "/tiles/density/sample/1/xyz/0.webp",
        "/tiles/countries/-1/0/0.webp",
        "/tiles/publishers/1/99999999999/0.webp",
    ] {
        let response = get(test_router(&cache_dir).await, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_coordinate", "{uri}");
        assert_eq!(json["status"], 400);
        assert!(json["message"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_rejected_requests_write_nothing() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/tiles/density/sample/17/0/0.webp").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(cache_dir.path()).unwrap().count(), 0);
}

// =============================================================================
// Metadata Endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_datasets_listing() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let response = get(router, "/datasets").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let datasets = json["datasets"].as_array().unwrap();
    let names: Vec<&str> = datasets.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["all_isbns", "other", "sample"]);
    assert_eq!(datasets[0]["points"], 4);
    assert_eq!(datasets[2]["points"], 3);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let cache_dir = TempDir::new().unwrap();
    let router = test_router(&cache_dir).await;

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let cache_dir = TempDir::new().unwrap();
    let service = create_service(cache_dir.path()).await;
    let router = create_router(service, RouterConfig::new().with_cache_max_age(60));

    let response = get(router, "/tiles/countries/1/0/0.webp").await;
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=60"
    );
}
