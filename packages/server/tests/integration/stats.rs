use crate::common::{TestApp, routes};

#[tokio::test]
async fn stats_reflect_uploads_and_manifest_traffic() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "production", b"v1", &[("a.png", b"IMG" as &[u8])])
        .await;
    app.upload_ios_release("1.0.0", "production", b"v2", &[])
        .await;

    app.get_manifest("ios", "1.0.0", "production", None).await;
    app.get_manifest("ios", "1.0.0", "production", None).await;

    let res = app.get(routes::STATS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["releases"]["total"], 2);
    assert_eq!(res.body["releases"]["active"], 1);
    assert_eq!(res.body["manifest_requests"]["total"], 2);
    assert_eq!(res.body["manifest_requests"]["last_24h"], 2);
    assert_eq!(res.body["storage"]["asset_count"], 3);
    let expected_bytes = (b"v1".len() + b"IMG".len() + b"v2".len()) as u64;
    assert_eq!(res.body["storage"]["total_bytes"].as_u64().unwrap(), expected_bytes);
}

#[tokio::test]
async fn recent_activity_lists_events_newest_first() {
    let app = TestApp::spawn().await;
    app.upload_ios_release("1.0.0", "production", b"v1", &[])
        .await;
    app.get_manifest("ios", "1.0.0", "production", None).await;

    let res = app.get(&format!("{}/activity", routes::STATS)).await;
    assert_eq!(res.status, 200);
    let events = res.body.as_array().unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0]["event_type"], "manifest_request");
}

#[tokio::test]
async fn health_reports_ok_when_subsystems_are_up() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], "ok");
    assert_eq!(res.body["storage"], "ok");
}
