//! Try-on pipeline over real HTTP against fake Replicate and Cloudinary.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use tryon_integration_tests::{SECURITY_KEY, TestContext};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

const IDM_VTON_VERSION: &str = "0513734a452173b8173e907e3a59d19a36266e55b48528559432bd21c7d7e985";
const HOSTED_URL: &str = "https://res.cloudinary.com/demo/image/upload/tryon_hd/result.png";

fn tryon_body(category: &str, key: &str) -> Value {
    json!({
        "person_image_url": "https://img.test/person.jpg",
        "clothing_image_url": "https://img.test/dress.jpg",
        "category": category,
        "user_id": "user-42",
        "security_key": key
    })
}

async fn mount_upload(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("folder=tryon_hd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": HOSTED_URL
        })))
        .mount(&ctx.vendor)
        .await;
}

#[tokio::test]
async fn generates_and_hosts_image() {
    let ctx = TestContext::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(body_partial_json(json!({
            "version": IDM_VTON_VERSION,
            "input": { "category": "dresses", "steps": 40, "seed": 42 }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-1",
            "status": "succeeded",
            "output": ["https://replicate.delivery/pred-1/0.png", "https://replicate.delivery/pred-1/1.png"]
        })))
        .expect(1)
        .mount(&ctx.vendor)
        .await;
    mount_upload(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("dresses", SECURITY_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result_image_url"], HOSTED_URL);

    let uploads = ctx.vendor_requests("/v1_1/demo/image/upload").await;
    assert_eq!(uploads.len(), 1);
    let form = String::from_utf8(uploads[0].body.clone()).unwrap();
    assert!(form.contains("file=https%3A%2F%2Freplicate.delivery%2Fpred-1%2F0.png"));
}

#[tokio::test]
async fn wrong_security_key_makes_no_vendor_call() {
    let ctx = TestContext::start().await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("upper_body", "not-the-key"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid security key.");
    assert!(ctx.vendor.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn null_output_fails_without_upload() {
    let ctx = TestContext::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-2",
            "status": "succeeded",
            "output": null
        })))
        .mount(&ctx.vendor)
        .await;
    mount_upload(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("upper_body", SECURITY_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.vendor_requests("/v1_1/demo/image/upload").await.is_empty());
}

#[tokio::test]
async fn polls_running_prediction() {
    let ctx = TestContext::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-3",
            "status": "processing"
        })))
        .mount(&ctx.vendor)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/predictions/pred-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pred-3",
            "status": "succeeded",
            "output": "https://replicate.delivery/pred-3/out.png"
        })))
        .mount(&ctx.vendor)
        .await;
    mount_upload(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("lower_body", SECURITY_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.vendor_requests("/v1/predictions/pred-3").await.len(), 1);
}

#[tokio::test]
async fn failed_upscale_keeps_unrefined_image() {
    let ctx = TestContext::start_with(|config| {
        config.replicate.upscale_model = Some("nightmareai/real-esrgan:upscale-v1".to_string());
    })
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(body_partial_json(json!({ "version": IDM_VTON_VERSION })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-4",
            "status": "succeeded",
            "output": "https://replicate.delivery/pred-4/raw.png"
        })))
        .mount(&ctx.vendor)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(body_partial_json(json!({ "version": "upscale-v1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "up-4",
            "status": "failed",
            "error": "image too large"
        })))
        .mount(&ctx.vendor)
        .await;
    mount_upload(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("upper_body", SECURITY_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let uploads = ctx.vendor_requests("/v1_1/demo/image/upload").await;
    let form = String::from_utf8(uploads[0].body.clone()).unwrap();
    assert!(form.contains("pred-4%2Fraw.png"));
}

#[tokio::test]
async fn reject_policy_refuses_unknown_category() {
    let ctx = TestContext::start_with(|config| {
        config.category_policy = tryon_core::CategoryPolicy::Reject;
    })
    .await;

    let response = ctx
        .client
        .post(ctx.url("/api/v1/generate-tryon"))
        .json(&tryon_body("hat", SECURITY_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.vendor.received_requests().await.unwrap().is_empty());
}
