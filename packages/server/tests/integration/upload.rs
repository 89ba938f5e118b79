use crate::common::{TestApp, build_zip, export_zip, routes, sha256_hex};

#[tokio::test]
async fn upload_creates_an_active_release_served_by_the_manifest() {
    let app = TestApp::spawn().await;
    let bundle = b"console.log('hello v1');";

    let release_id = app
        .upload_ios_release("1.0.0", "production", bundle, &[("logo.png", b"PNGDATA" as &[u8])])
        .await;

    let res = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["id"].as_str().unwrap(), release_id);
    assert_eq!(res.body["runtimeVersion"], "1.0.0");
    assert_eq!(res.body["launchAsset"]["hash"], sha256_hex(bundle));
    assert_eq!(res.body["launchAsset"]["key"], "bundle");
    assert_eq!(res.body["launchAsset"]["contentType"], "application/javascript");
    assert_eq!(
        res.body["launchAsset"]["url"].as_str().unwrap(),
        format!("http://test.local/assets/{}", sha256_hex(bundle))
    );

    let assets = res.body["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["key"], "logo.png");
    assert_eq!(assets[0]["hash"], sha256_hex(b"PNGDATA"));
    assert_eq!(assets[0]["contentType"], "image/png");
}

#[tokio::test]
async fn identical_content_is_stored_once_across_releases() {
    let app = TestApp::spawn().await;
    let bundle = b"console.log('same bytes');";

    app.upload_ios_release("1.0.0", "production", bundle, &[("a.png", b"IMG" as &[u8])])
        .await;
    let stats = app.get(routes::STATS).await;
    let count_after_first = stats.body["storage"]["asset_count"].as_u64().unwrap();
    assert_eq!(count_after_first, 2);

    // Same content on a different channel: no new blobs.
    app.upload_ios_release("1.0.0", "staging", bundle, &[("a.png", b"IMG" as &[u8])])
        .await;
    let stats = app.get(routes::STATS).await;
    assert_eq!(
        stats.body["storage"]["asset_count"].as_u64().unwrap(),
        count_after_first
    );
}

#[tokio::test]
async fn archive_without_metadata_is_rejected() {
    let app = TestApp::spawn().await;
    let zip = build_zip(&[("bundles/main.js".to_string(), b"x".to_vec())]);

    let res = app
        .upload(
            &[("platform", "ios"), ("runtime_version", "1.0.0")],
            zip,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "INVALID_EXPORT");
}

#[tokio::test]
async fn export_for_a_different_platform_is_rejected() {
    let app = TestApp::spawn().await;
    let zip = export_zip("ios", b"bundle", &[]);

    let res = app
        .upload(
            &[("platform", "android"), ("runtime_version", "1.0.0")],
            zip,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "UNSUPPORTED_PLATFORM");
}

#[tokio::test]
async fn metadata_referencing_a_missing_file_is_rejected() {
    let app = TestApp::spawn().await;
    let metadata = serde_json::json!({
        "fileMetadata": {"ios": {"bundle": "bundles/missing.js", "assets": []}}
    });
    let zip = build_zip(&[(
        "metadata.json".to_string(),
        metadata.to_string().into_bytes(),
    )]);

    let res = app
        .upload(&[("platform", "ios"), ("runtime_version", "1.0.0")], zip)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "INVALID_EXPORT");
}

#[tokio::test]
async fn upload_without_archive_is_rejected() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new()
        .text("platform", "ios")
        .text("runtime_version", "1.0.0");
    let res = app
        .client
        .post(format!("http://{}{}", app.addr, routes::UPLOAD))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    let res = crate::common::TestResponse::from_response(res).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_platform_value_is_rejected() {
    let app = TestApp::spawn().await;
    let zip = export_zip("ios", b"bundle", &[]);

    let res = app
        .upload(
            &[("platform", "windows"), ("runtime_version", "1.0.0")],
            zip,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn new_upload_replaces_the_active_release_for_the_same_key() {
    let app = TestApp::spawn().await;

    let first = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    let second = app
        .upload_ios_release("1.0.0", "production", b"v2", &[])
        .await;
    assert_ne!(first, second);

    let res = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"].as_str().unwrap(), second);

    // The replaced release still exists, just inactive.
    let old = app.get(&routes::release(&first)).await;
    assert_eq!(old.status, 200);
    assert_eq!(old.body["is_active"], false);
    assert!(old.body["deactivated_at"].is_string());
}
