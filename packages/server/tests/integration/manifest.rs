use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde_json::json;
use sha2::Sha256;

use crate::common::{TestApp, routes, sha256_hex, test_signing_key};

fn extract_signature(header: &str) -> Vec<u8> {
    let start = header.find("sig=\"").expect("header should contain sig") + 5;
    let end = header[start..].find('"').expect("sig should be quoted") + start;
    BASE64
        .decode(&header[start..end])
        .expect("signature should be base64")
}

#[tokio::test]
async fn no_release_for_the_key_yields_no_content() {
    let app = TestApp::spawn().await;

    let res = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(res.status, 204);
    assert!(res.bytes.is_empty());
}

#[tokio::test]
async fn manifest_carries_protocol_headers_and_a_valid_signature() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "production", b"bundle-bytes", &[])
        .await;

    let res = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("update-protocol-version"), Some("1"));
    assert_eq!(res.header("cache-control"), Some("private, max-age=0"));

    let chain = res.header("update-certificate-chain").unwrap();
    assert!(!chain.contains('\n'));
    assert!(chain.starts_with("-----BEGIN CERTIFICATE-----"));

    let sig_header = res.header("update-signature").unwrap();
    assert!(sig_header.contains("keyid=\"main\""));
    assert!(sig_header.contains("alg=\"rsa-v1_5-sha256\""));

    // The signature covers the exact bytes on the wire.
    let sig_bytes = extract_signature(sig_header);
    let signature = Signature::try_from(sig_bytes.as_slice()).unwrap();
    let verifying_key = VerifyingKey::<Sha256>::new(test_signing_key().to_public_key());
    verifying_key
        .verify(&res.bytes, &signature)
        .expect("manifest signature should verify against the response body");
}

#[tokio::test]
async fn client_already_on_the_active_release_gets_no_content() {
    let app = TestApp::spawn().await;
    let release_id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    let res = app
        .get_manifest("ios", "1.0.0", "production", Some(&release_id))
        .await;
    assert_eq!(res.status, 204);

    // An outdated id still gets the manifest.
    let res = app
        .get_manifest(
            "ios",
            "1.0.0",
            "production",
            Some("00000000-0000-0000-0000-000000000000"),
        )
        .await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn keys_are_isolated_by_channel_and_runtime_version() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    let res = app.get_manifest("ios", "1.0.0", "staging", None).await;
    assert_eq!(res.status, 204);
    let res = app.get_manifest("ios", "2.0.0", "production", None).await;
    assert_eq!(res.status, 204);
    let res = app.get_manifest("android", "1.0.0", "production", None).await;
    assert_eq!(res.status, 204);
}

#[tokio::test]
async fn missing_or_invalid_protocol_headers_are_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::MANIFEST).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    let res = app
        .get_with_headers(routes::MANIFEST, &[("update-platform", "ios")])
        .await;
    assert_eq!(res.status, 400);

    let res = app.get_manifest("windows", "1.0.0", "production", None).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn assets_download_with_immutable_caching() {
    let app = TestApp::spawn().await;
    let content = b"image-bytes";
    app.upload_ios_release("1.0.0", "production", b"bundle", &[("pic.png", content as &[u8])])
        .await;

    let hash = sha256_hex(content);
    let res = app.get(&routes::asset(&hash)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, content);
    assert_eq!(res.header("content-type"), Some("image/png"));
    assert_eq!(
        res.header("cache-control"),
        Some("public, max-age=31536000, immutable")
    );
    assert_eq!(res.header("etag"), Some(format!("\"{hash}\"").as_str()));
}

#[tokio::test]
async fn malformed_and_unknown_asset_hashes_are_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::asset("..%2Fsecret")).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    let res = app.get(&routes::asset(&sha256_hex(b"never stored"))).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn client_error_reports_are_recorded_against_the_release() {
    let app = TestApp::spawn().await;
    let release_id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    let res = app
        .post_json(
            routes::EVENTS,
            &json!({
                "release_id": release_id,
                "error_message": "bundle failed to load",
                "platform": "ios",
                "runtime_version": "1.0.0",
            }),
        )
        .await;
    assert_eq!(res.status, 204);

    let events = app.get(&routes::release_events(&release_id)).await;
    assert_eq!(events.status, 200);
    let list = events.body.as_array().unwrap();
    assert!(
        list.iter().any(|e| e["event_type"] == "update_error"
            && e["error_message"] == "bundle failed to load")
    );
}

#[tokio::test]
async fn manifest_requests_are_recorded_as_events() {
    let app = TestApp::spawn().await;
    let release_id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    app.get_manifest("ios", "1.0.0", "production", None).await;

    let events = app.get(&routes::release_events(&release_id)).await;
    let list = events.body.as_array().unwrap();
    assert!(list.iter().any(|e| e["event_type"] == "manifest_request"));
}
