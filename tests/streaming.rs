//! End-to-end tests for the archive endpoint and static pages.

use std::process::Command;
use std::time::Duration;

use axum::http::StatusCode;

mod common;

/// Concatenates every file under the album in a stable order.
const CAT_ALBUM: &str = "find \"$0\" -type f | sort | xargs -r cat";

#[tokio::test]
async fn test_pages_are_served() {
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;
    let client = common::client();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), common::INDEX_PAGE);

    let res = client.get(server.url("/404.html/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), common::NOT_FOUND_PAGE);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;

    let res = common::client()
        .get(server.url("/"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me-42");
}

#[tokio::test]
async fn test_archive_matches_archiver_output() {
    let (root, config) = common::scratch_config(common::sh_archiver(CAT_ALBUM), 0.0);
    let server = common::start_server(root, config).await;
    // Larger than two default chunks.
    common::make_album(&server.photos(), "7kna", 250_000);

    let res = common::client()
        .get(server.url("/archive/7kna/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "multipart/form-data");
    assert_eq!(res.headers()["content-disposition"], "filename=\"7kna.zip\"");
    let body = res.bytes().await.unwrap();

    let expected = Command::new("sh")
        .args(["-c", CAT_ALBUM, "7kna"])
        .current_dir(server.photos())
        .output()
        .unwrap()
        .stdout;
    assert_eq!(body.len(), 250_000);
    assert_eq!(&body[..], &expected[..]);

    assert!(server.tracker.wait_for_drain(Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_missing_archive_redirects_without_spawning() {
    // Any spawn attempt would answer 500 instead of redirecting.
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;

    let res = common::client()
        .get(server.url("/archive/doesnotexist/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/404.html/");
    assert_eq!(server.tracker.active_count(), 0);
}

#[tokio::test]
async fn test_traversal_identifiers_redirect() {
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;
    // A real directory next to the base dir that traversal would reach.
    common::make_album(server.root.path(), "secret", 30);

    let client = common::client();
    for path in [
        "/archive/..%2Fsecret/",
        "/archive/.hidden/",
        "/archive/-rf/",
        "/archive/a%20b/",
    ] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND, "{path}");
        assert_eq!(res.headers()["location"], "/404.html/", "{path}");
    }
}

#[tokio::test]
async fn test_spawn_failure_is_server_error() {
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;
    common::make_album(&server.photos(), "7kna", 30);

    let res = common::client()
        .get(server.url("/archive/7kna/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.headers().get("content-disposition").is_none());
}

#[tokio::test]
async fn test_empty_directory_completes() {
    let (root, config) = common::scratch_config(common::sh_archiver(CAT_ALBUM), 0.0);
    let server = common::start_server(root, config).await;
    std::fs::create_dir(server.photos().join("empty")).unwrap();

    let res = common::client()
        .get(server.url("/archive/empty/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_disconnect_reaps_archiver() {
    let (root, mut config) = common::scratch_config(common::missing_archiver(), 0.1);
    common::make_album(&root.path().join("photos"), "7kna", 30);

    // Endless archiver that records its pid first.
    let pid_file = root.path().join("archiver.pid");
    let script = format!("echo $$ > '{}'; exec yes", pid_file.display());
    config.archive.archiver = common::sh_archiver(&script);
    let server = common::start_server(root, config).await;

    let client = common::client();
    let mut res = client.get(server.url("/archive/7kna/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = res.chunk().await.unwrap().unwrap();
    assert!(!first.is_empty());

    let pid = common::read_pid(&pid_file).await;
    drop(res);
    drop(client);

    assert!(
        server.tracker.wait_for_drain(Duration::from_secs(5)).await,
        "stream still active after client went away"
    );
    assert!(!common::process_alive(pid), "archiver {pid} was not reaped");
}
