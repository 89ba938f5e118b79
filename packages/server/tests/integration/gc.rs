use crate::common::{TestApp, routes, sha256_hex};

#[tokio::test]
async fn sweep_removes_only_unreferenced_assets() {
    let app = TestApp::spawn_with_gc_grace(0).await;

    // Two releases sharing one asset; each has its own bundle.
    let shared = b"shared-image" as &[u8];
    let first = app
        .upload_ios_release("1.0.0", "production", b"bundle-v1", &[("shared.png", shared)])
        .await;
    app.upload_ios_release("1.0.0", "production", b"bundle-v2", &[("shared.png", shared)])
        .await;

    let orphaned_hash = sha256_hex(b"bundle-v1");
    let shared_hash = sha256_hex(shared);
    assert!(app.blob_path(&orphaned_hash).exists());

    let res = app.delete(&routes::release(&first)).await;
    assert_eq!(res.status, 204);

    let report = app.post(routes::GC).await;
    assert_eq!(report.status, 200, "{}", report.text);
    assert_eq!(report.body["removed"], 1);
    assert_eq!(
        report.body["bytes_freed"].as_u64().unwrap(),
        b"bundle-v1".len() as u64
    );

    // The orphaned bundle is gone from disk and from the API.
    assert!(!app.blob_path(&orphaned_hash).exists());
    let res = app.get(&routes::asset(&orphaned_hash)).await;
    assert_eq!(res.status, 404);

    // The shared asset and the surviving bundle are untouched.
    assert!(app.blob_path(&shared_hash).exists());
    let res = app.get(&routes::asset(&shared_hash)).await;
    assert_eq!(res.status, 200);
    let res = app.get(&routes::asset(&sha256_hex(b"bundle-v2"))).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn sweep_with_no_orphans_removes_nothing() {
    let app = TestApp::spawn_with_gc_grace(0).await;
    app.upload_ios_release("1.0.0", "production", b"v1", &[("a.png", b"IMG" as &[u8])])
        .await;

    let report = app.post(routes::GC).await;
    assert_eq!(report.status, 200);
    assert_eq!(report.body["removed"], 0);
    assert_eq!(report.body["scanned"], 2);
}

#[tokio::test]
async fn recent_orphans_are_protected_by_the_grace_period() {
    let app = TestApp::spawn().await; // default grace period

    let id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    app.delete(&routes::release(&id)).await;

    let report = app.post(routes::GC).await;
    assert_eq!(report.status, 200);
    assert_eq!(report.body["removed"], 0);
    assert!(app.blob_path(&sha256_hex(b"v1")).exists());
}
