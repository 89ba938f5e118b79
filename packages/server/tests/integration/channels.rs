use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn channels_can_be_created_and_listed() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(
            routes::CHANNELS,
            &json!({"name": "beta", "description": "Beta testers"}),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["name"], "beta");
    assert_eq!(res.body["description"], "Beta testers");

    let list = app.get(routes::CHANNELS).await;
    assert_eq!(list.status, 200);
    let names: Vec<&str> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"beta"));
}

#[tokio::test]
async fn duplicate_channel_names_conflict() {
    let app = TestApp::spawn().await;

    let res = app.post_json(routes::CHANNELS, &json!({"name": "beta"})).await;
    assert_eq!(res.status, 201);

    let res = app.post_json(routes::CHANNELS, &json!({"name": "beta"})).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}

#[tokio::test]
async fn invalid_channel_names_are_rejected() {
    let app = TestApp::spawn().await;

    for name in ["", "Has Space", "UPPER", "under_score", &"x".repeat(51)] {
        let res = app.post_json(routes::CHANNELS, &json!({"name": name})).await;
        assert_eq!(res.status, 400, "name {name:?} should be rejected");
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn uploads_create_their_channel_implicitly() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "canary", b"v1", &[]).await;

    let list = app.get(routes::CHANNELS).await;
    let names: Vec<&str> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"canary"));
}

#[tokio::test]
async fn channels_with_releases_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "canary", b"v1", &[]).await;

    let res = app.delete(&routes::channel("canary")).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error_code(), "CONFLICT");
}

#[tokio::test]
async fn empty_channels_can_be_deleted() {
    let app = TestApp::spawn().await;
    app.post_json(routes::CHANNELS, &json!({"name": "beta"})).await;

    let res = app.delete(&routes::channel("beta")).await;
    assert_eq!(res.status, 204);

    let res = app.delete(&routes::channel("beta")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.error_code(), "NOT_FOUND");
}
