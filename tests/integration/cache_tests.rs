//! Disk cache integration tests.
//!
//! Tests verify:
//! - Generated tiles are persisted under the expected layout
//! - Cached tiles survive a service restart
//! - No-cache mode regenerates and overwrites
//! - Concurrent requests for one tile all see the same bytes

use std::sync::Arc;

use tempfile::TempDir;

use isbn_atlas::tile::{TileEncoder, TileFormat, TileRequest};

use super::test_utils::{create_service, create_service_with, decode_tile, greens};

#[tokio::test]
async fn test_tiles_persisted_by_kind() {
    let cache_dir = TempDir::new().unwrap();
    let service = create_service(cache_dir.path()).await;

    service
        .get_tile(TileRequest::density("sample", 1, 0, 0))
        .await
        .unwrap();
    service
        .get_tile(TileRequest::countries(2, 3, 4))
        .await
        .unwrap();
    service
        .get_tile(TileRequest::publishers(5, 6, 7))
        .await
        .unwrap();

    let root = cache_dir.path();
    assert!(root.join("density/sample/1/0/0.webp").is_file());
    assert!(root.join("countries/2/3/4.webp").is_file());
    assert!(root.join("publishers/5/6/7.webp").is_file());
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let cache_dir = TempDir::new().unwrap();
    let request = TileRequest::density("sample", 1, 0, 0);

    let first = create_service(cache_dir.path())
        .await
        .get_tile(request.clone())
        .await
        .unwrap();
    assert!(!first.cache_hit);

    let second = create_service(cache_dir.path())
        .await
        .get_tile(request)
        .await
        .unwrap();
    assert!(second.cache_hit);
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn test_cached_file_served_as_is() {
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("countries/1/0/0.webp");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"stale bytes").unwrap();

    let service = create_service(cache_dir.path()).await;
    let response = service
        .get_tile(TileRequest::countries(1, 0, 0))
        .await
        .unwrap();

    assert!(response.cache_hit);
    assert_eq!(&response.data[..], b"stale bytes");
}

#[tokio::test]
async fn test_no_cache_regenerates_and_overwrites() {
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("density/sample/1/0/0.webp");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"stale bytes").unwrap();

    let service = create_service_with(cache_dir.path(), TileEncoder::new(), false).await;
    let request = TileRequest::density("sample", 1, 0, 0);

    let first = service.get_tile(request.clone()).await.unwrap();
    let second = service.get_tile(request).await.unwrap();

    assert!(!first.cache_hit);
    assert!(!second.cache_hit);
    assert_eq!(first.data, second.data);
    assert_eq!(std::fs::read(&path).unwrap(), first.data.to_vec());
    assert_eq!(greens(&decode_tile(&first.data)), vec![255, 255, 255, 0]);
}

#[tokio::test]
async fn test_jpeg_tiles() {
    let cache_dir = TempDir::new().unwrap();
    let encoder = TileEncoder::with_format(TileFormat::Jpeg, 90);
    let service = create_service_with(cache_dir.path(), encoder, true).await;

    let response = service
        .get_tile(TileRequest::countries(8, 0, 0))
        .await
        .unwrap();

    assert_eq!(response.format, TileFormat::Jpeg);
    assert_eq!(&response.data[..2], &[0xFF, 0xD8]);
    assert!(cache_dir.path().join("countries/8/0/0.jpg").is_file());
    assert_eq!(decode_tile(&response.data).dimensions(), (256, 256));
}

#[tokio::test]
async fn test_concurrent_requests_share_result() {
    let cache_dir = TempDir::new().unwrap();
    let service = Arc::new(create_service(cache_dir.path()).await);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .get_tile(TileRequest::publishers(12, 0, 0))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert!(results.windows(2).all(|w| w[0].data == w[1].data));

    // Only the final tile remains; no temporary files are left behind.
    let dir = cache_dir.path().join("publishers/12/0");
    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["0.webp".to_string()]);
}

#[tokio::test]
async fn test_failed_request_leaves_no_file() {
    let cache_dir = TempDir::new().unwrap();
    let service = create_service(cache_dir.path()).await;

    let result = service
        .get_tile(TileRequest::density("missing", 1, 0, 0))
        .await;

    assert!(result.is_err());
    assert!(!cache_dir.path().join("density").exists());
}
