//! The inbound shim acks immediately and forwards raw parameters untouched.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cellmon::http::{self, ACK_TEXT};
use tokio::sync::mpsc;
use tower::util::ServiceExt;

#[tokio::test]
async fn update_acks_and_forwards_params() {
    let (tx, mut rx) = mpsc::channel(4);
    let app = http::router(tx);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/update?battery_level=87.5&charge_counter=500000&current_avg=-100000&current_now=-90000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(body.as_ref(), ACK_TEXT.as_bytes());

    let params = rx.recv().await.unwrap();
    assert_eq!(params.get("battery_level").map(String::as_str), Some("87.5"));
    assert_eq!(params.get("current_avg").map(String::as_str), Some("-100000"));
}

#[tokio::test]
async fn update_without_parameters_still_acks() {
    let (tx, mut rx) = mpsc::channel(4);
    let app = http::router(tx);

    let response = app
        .oneshot(Request::builder().uri("/update").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let params = rx.recv().await.unwrap();
    assert!(params.is_empty());
}

#[tokio::test]
async fn update_acks_even_when_the_pipeline_is_gone() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let app = http::router(tx);

    let response = app
        .oneshot(Request::builder().uri("/update?battery_level=1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
