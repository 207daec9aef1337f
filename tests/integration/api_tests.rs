//! API integration tests for conversion and error handling.
//!
//! Tests verify:
//! - Conversion of a decodable image to JPEG with matching dimensions
//! - Decode failures answer 400, never 500
//! - Encode failures answer 500, never 400
//! - Unreadable request bodies answer 400 like undecodable ones
//! - Deadline expiry answers 500
//! - Conversions beyond the concurrency bound never start
//! - Response headers and the health endpoint

use std::io;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::BodyExt;
use tower::ServiceExt;

use unheic::convert::{Converter, ImageCodec};
use unheic::{create_router, RouterConfig};

use super::test_utils::{
    create_test_png, is_valid_jpeg, ConcurrencyCodec, FailingEncodeCodec, RecordingCodec,
    SlowCodec,
};

fn convert_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(header::CONTENT_TYPE, "image/heic")
        .body(body.into())
        .unwrap()
}

fn default_router() -> Router {
    create_router(Converter::new(ImageCodec::new()), RouterConfig::new())
}

async fn body_text(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

// =============================================================================
// Successful Conversion
// =============================================================================

#[tokio::test]
async fn test_convert_success() {
    let router = default_router();

    let response = router
        .oneshot(convert_request(create_test_png(64, 48)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=converted.jpg"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_jpeg(&body), "Response should be a valid JPEG");

    // Dimensions survive the conversion
    let decoded = image::load_from_memory_with_format(&body, image::ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[tokio::test]
async fn test_convert_is_idempotent() {
    let input = create_test_png(40, 30);

    let first = default_router()
        .oneshot(convert_request(input.clone()))
        .await
        .unwrap();
    let first = first.into_body().collect().await.unwrap().to_bytes();

    let second = default_router()
        .oneshot(convert_request(input))
        .await
        .unwrap();
    let second = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_convert_uses_fixed_quality() {
    let codec = RecordingCodec::default();
    let encodes = codec.encodes.clone();
    let last_quality = codec.last_quality.clone();
    let router = create_router(Converter::new(codec), RouterConfig::new());

    let response = router
        .oneshot(convert_request(create_test_png(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(encodes.load(Ordering::SeqCst), 1);
    assert_eq!(last_quality.load(Ordering::SeqCst), 90);
}

#[tokio::test]
async fn test_convert_large_body_accepted() {
    // Larger than axum's default 2MB body limit
    let mut padded = create_test_png(64, 64);
    padded.resize(3 * 1024 * 1024, 0);

    let response = default_router()
        .oneshot(convert_request(padded))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Decode Failures
// =============================================================================

#[tokio::test]
async fn test_convert_empty_body() {
    let response = default_router()
        .oneshot(convert_request(Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("decoding HEIF image:"), "got: {}", text);
}

#[tokio::test]
async fn test_convert_garbage_body() {
    let response = default_router()
        .oneshot(convert_request(&b"this is not an image at all"[..]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_truncated_image() {
    let mut input = create_test_png(32, 32);
    input.truncate(input.len() / 2);

    let response = default_router()
        .oneshot(convert_request(input))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_decode_failure_never_server_error() {
    // Decode failures stay client faults even when the encoder is broken
    let router = create_router(Converter::new(FailingEncodeCodec), RouterConfig::new());

    let response = router
        .oneshot(convert_request(Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_response_headers() {
    let response = default_router()
        .oneshot(convert_request(Body::empty()))
        .await
        .unwrap();

    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[cfg(feature = "heif")]
#[tokio::test]
async fn test_heif_codec_rejects_other_rasters() {
    let router = create_router(
        Converter::new(unheic::convert::HeifCodec::new()),
        RouterConfig::new(),
    );

    let response = router
        .oneshot(convert_request(create_test_png(4, 4)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("decoding HEIF image:"));
}

// =============================================================================
// Unreadable Request Bodies
// =============================================================================

#[tokio::test]
async fn test_convert_body_reset_mid_upload() {
    let stream = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"\x89PNG")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
    ]);

    let response = default_router()
        .oneshot(convert_request(Body::from_stream(stream)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

    let text = body_text(response).await;
    assert!(text.starts_with("decoding HEIF image:"), "got: {}", text);
    assert!(text.contains("peer reset"), "got: {}", text);
}

#[tokio::test]
async fn test_convert_body_read_timeout() {
    // One frame, then the upload stalls
    let stream = futures::stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(b"\x89PNG"))])
        .chain(futures::stream::pending());

    let config = RouterConfig::new().with_read_timeout(Duration::from_millis(50));
    let router = create_router(Converter::new(ImageCodec::new()), config);

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        router.oneshot(convert_request(Body::from_stream(stream))),
    )
    .await
    .expect("read timeout should end the request")
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let text = body_text(response).await;
    assert!(text.starts_with("decoding HEIF image:"), "got: {}", text);
}

// =============================================================================
// Encode Failures
// =============================================================================

#[tokio::test]
async fn test_convert_encode_failure() {
    let router = create_router(Converter::new(FailingEncodeCodec), RouterConfig::new());

    let response = router
        .oneshot(convert_request(create_test_png(16, 16)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("encoding JPEG image:"), "got: {}", text);
    assert!(text.contains("injected encoder fault"));
}

// =============================================================================
// Deadline
// =============================================================================

#[tokio::test]
async fn test_convert_deadline_exceeded() {
    let codec = SlowCodec {
        delay: Duration::from_millis(500),
    };
    let config = RouterConfig::new().with_conversion_timeout(Duration::from_millis(50));
    let router = create_router(Converter::new(codec), config);

    let response = router
        .oneshot(convert_request(create_test_png(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("converting HEIF to JPEG:"), "got: {}", text);
    assert!(text.contains("deadline"));
}

#[tokio::test]
async fn test_convert_within_deadline() {
    let codec = SlowCodec {
        delay: Duration::from_millis(10),
    };
    let config = RouterConfig::new().with_conversion_timeout(Duration::from_secs(5));
    let router = create_router(Converter::new(codec), config);

    let response = router
        .oneshot(convert_request(create_test_png(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_conversions_bounded_after_deadline() {
    let codec = ConcurrencyCodec {
        delay: Duration::from_millis(300),
        ..Default::default()
    };
    let peak = codec.peak.clone();
    let finished = codec.finished.clone();

    let config = RouterConfig::new()
        .with_conversion_timeout(Duration::from_millis(100))
        .with_max_conversions(1);
    let router = create_router(Converter::new(codec), config);

    let (first, second, third) = tokio::join!(
        router.clone().oneshot(convert_request(create_test_png(8, 8))),
        router.clone().oneshot(convert_request(create_test_png(8, 8))),
        router.oneshot(convert_request(create_test_png(8, 8))),
    );
    for response in [first, second, third] {
        assert_eq!(response.unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // Let the abandoned conversion run out
    for _ in 0..50 {
        if finished.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Requests that timed out waiting for a permit never started decoding
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = default_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_convert_requires_post() {
    let request = Request::builder()
        .uri("/convert")
        .body(Body::empty())
        .unwrap();

    let response = default_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route() {
    let request = Request::builder()
        .uri("/convert/batch")
        .body(Body::empty())
        .unwrap();

    let response = default_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
