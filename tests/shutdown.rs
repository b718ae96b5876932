//! Graceful shutdown with archive streams in flight.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn test_shutdown_cancels_stream_and_reaps_archiver() {
    let (root, mut config) = common::scratch_config(common::missing_archiver(), 0.05);
    common::make_album(&root.path().join("photos"), "7kna", 30);
    let pid_file = root.path().join("archiver.pid");
    config.archive.archiver =
        common::sh_archiver(&format!("echo $$ > '{}'; exec yes", pid_file.display()));
    let server = common::start_server(root, config).await;

    let client = common::client();
    let mut res = client.get(server.url("/archive/7kna/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.chunk().await.unwrap().unwrap();
    let pid = common::read_pid(&pid_file).await;

    server.shutdown.trigger();

    // The body must not end cleanly: a truncated archive is an aborted transfer.
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match res.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    })
    .await
    .expect("body did not end after shutdown");
    assert!(drained.is_err(), "stream ended as if complete");

    let result = tokio::time::timeout(Duration::from_secs(10), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(server.tracker.active_count(), 0);
    assert!(!common::process_alive(pid), "archiver {pid} was not reaped");
}

#[tokio::test]
async fn test_shutdown_when_idle() {
    let (root, config) = common::scratch_config(common::missing_archiver(), 0.0);
    let server = common::start_server(root, config).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
