use uuid::Uuid;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn releases_list_newest_first_with_pagination() {
    let app = TestApp::spawn().await;
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(
            app.upload_ios_release("1.0.0", "production", format!("v{i}").as_bytes(), &[])
                .await,
        );
    }

    let res = app.get(&format!("{}?limit=2", routes::RELEASES)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["meta"]["total"], 3);
    assert_eq!(res.body["meta"]["limit"], 2);
    let page = res.body["data"].as_array().unwrap();
    assert_eq!(page.len(), 2);

    let res = app
        .get(&format!("{}?limit=2&offset=2", routes::RELEASES))
        .await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn release_list_filters_by_platform_and_channel() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    app.upload_ios_release("1.0.0", "staging", b"v2", &[]).await;

    let res = app
        .get(&format!("{}?channel=staging", routes::RELEASES))
        .await;
    assert_eq!(res.body["meta"]["total"], 1);
    assert_eq!(res.body["data"][0]["channel"], "staging");

    let res = app
        .get(&format!("{}?platform=android", routes::RELEASES))
        .await;
    assert_eq!(res.body["meta"]["total"], 0);
}

#[tokio::test]
async fn at_most_one_release_per_key_is_active() {
    let app = TestApp::spawn().await;
    let first = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    let second = app
        .upload_ios_release("1.0.0", "production", b"v2", &[])
        .await;

    // Re-activate the older release; the newer one must be deactivated.
    let res = app.post(&routes::release_activate(&first)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["is_active"], true);

    let newer = app.get(&routes::release(&second)).await;
    assert_eq!(newer.body["is_active"], false);

    let list = app.get(routes::RELEASES).await;
    let active: Vec<_> = list.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["is_active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_str().unwrap(), first);
}

#[tokio::test]
async fn repeated_activations_keep_the_invariant() {
    let app = TestApp::spawn().await;
    let a = app
        .upload_ios_release("1.0.0", "production", b"a", &[])
        .await;
    let b = app
        .upload_ios_release("1.0.0", "production", b"b", &[])
        .await;

    for id in [&a, &b, &a, &b, &a] {
        let res = app.post(&routes::release_activate(id)).await;
        assert_eq!(res.status, 200);
    }

    let list = app.get(routes::RELEASES).await;
    let active_count = list.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["is_active"] == true)
        .count();
    assert_eq!(active_count, 1);
}

#[tokio::test]
async fn concurrent_activations_leave_exactly_one_active() {
    let app = std::sync::Arc::new(TestApp::spawn().await);
    let a = app
        .upload_ios_release("1.0.0", "production", b"a", &[])
        .await;
    let b = app
        .upload_ios_release("1.0.0", "production", b"b", &[])
        .await;

    // Race activations of both releases against each other.
    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        let id = if i % 2 == 0 { a.clone() } else { b.clone() };
        handles.push(tokio::spawn(async move {
            app.post(&routes::release_activate(&id)).await.status
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let list = app.get(routes::RELEASES).await;
    let active_count = list.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["is_active"] == true)
        .count();
    assert_eq!(active_count, 1);
}

#[tokio::test]
async fn deactivating_leaves_the_key_without_updates() {
    let app = TestApp::spawn().await;
    let id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    let res = app.post(&routes::release_deactivate(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["is_active"], false);

    let manifest = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(manifest.status, 204);
}

#[tokio::test]
async fn rollback_clones_the_source_release_and_activates_the_clone() {
    let app = TestApp::spawn().await;
    let old = app
        .upload_ios_release("1.0.0", "production", b"v1", &[("a.png", b"IMG" as &[u8])])
        .await;
    let newer = app
        .upload_ios_release("1.0.0", "production", b"v2", &[])
        .await;

    let res = app.post(&routes::release_rollback(&old)).await;
    assert_eq!(res.status, 201, "{}", res.text);
    let clone_id = res.body["id"].as_str().unwrap().to_string();
    assert_ne!(clone_id, old);
    assert_eq!(res.body["is_rollback"], true);
    assert_eq!(res.body["rollback_from_id"].as_str().unwrap(), old);
    assert_eq!(res.body["is_active"], true);

    // The clone serves the source's assets under its own id.
    let manifest = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(manifest.status, 200);
    assert_eq!(manifest.body["id"].as_str().unwrap(), clone_id);
    assert_eq!(manifest.body["assets"].as_array().unwrap().len(), 1);

    let replaced = app.get(&routes::release(&newer)).await;
    assert_eq!(replaced.body["is_active"], false);
}

#[tokio::test]
async fn rollback_survives_deleting_the_source_release() {
    let app = TestApp::spawn().await;
    let old = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    app.upload_ios_release("1.0.0", "production", b"v2", &[])
        .await;

    let res = app.post(&routes::release_rollback(&old)).await;
    let clone_id = res.body["id"].as_str().unwrap().to_string();

    let del = app.delete(&routes::release(&old)).await;
    assert_eq!(del.status, 204);

    let manifest = app.get_manifest("ios", "1.0.0", "production", None).await;
    assert_eq!(manifest.status, 200);
    assert_eq!(manifest.body["id"].as_str().unwrap(), clone_id);
}

#[tokio::test]
async fn deleting_a_release_removes_it_from_the_api() {
    let app = TestApp::spawn().await;
    let id = app
        .upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;

    let res = app.delete(&routes::release(&id)).await;
    assert_eq!(res.status, 204);

    let res = app.get(&routes::release(&id)).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn unknown_release_ids_yield_not_found() {
    let app = TestApp::spawn().await;
    let missing = Uuid::new_v4().to_string();

    for path in [
        routes::release(&missing),
        routes::release_activate(&missing),
        routes::release_rollback(&missing),
        routes::release_events(&missing),
    ] {
        let res = if path.ends_with("/activate") || path.ends_with("/rollback") {
            app.post(&path).await
        } else {
            app.get(&path).await
        };
        assert_eq!(res.status, 404, "{path}: {}", res.text);
        assert_eq!(res.error_code(), "NOT_FOUND");
    }

    let res = app.delete(&routes::release(&missing)).await;
    assert_eq!(res.status, 404);
}
