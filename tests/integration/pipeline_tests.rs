//! Document content: pagination and asset relocation through a full run

use crate::support::*;
use quip_export::checkpoint::{CheckpointStore, JsonFileStore};
use quip_export::pipeline::{AssetRelocation, LocalAssetStore, Pipeline};
use quip_export::sinks::{FilesystemSink, SinkDispatch};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_meta(server: &MockServer, id: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/1/threads/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "thread": { "id": id, "title": title } })),
        )
        .mount(server)
        .await;
}

fn fs_dispatch(root: &std::path::Path) -> SinkDispatch {
    let mut sinks = SinkDispatch::new();
    sinks.register(Box::new(FilesystemSink::new(root)));
    sinks
}

#[tokio::test]
async fn test_paginated_document_is_concatenated() {
    let server = MockServer::start().await;
    mount_user(&server, &["A"]).await;
    mount_folder(&server, "A", "Team", &[Child::Thread("T1")]).await;
    mount_meta(&server, "T1", "Long").await;

    // Most specific mocks first: the cursorless mock would match every page
    Mock::given(method("GET"))
        .and(path("/2/threads/T1/html"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "html": "<p>three</p>",
            "response_metadata": { "next_cursor": "" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/threads/T1/html"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "html": "<p>two</p>",
            "response_metadata": { "next_cursor": "c2" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/threads/T1/html"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "html": "<p>one</p>",
            "response_metadata": { "next_cursor": "c1" }
        })))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let mut c = coordinator(
        &server,
        Pipeline::new(),
        fs_dispatch(out.path()),
        Box::new(JsonFileStore::new(out.path().join("state.json"))),
        0,
    );
    c.resume_or_seed().await.unwrap();
    c.run().await.unwrap();

    let written = std::fs::read_to_string(out.path().join("Team/Long.html")).unwrap();
    assert_eq!(written, "<p>one</p><p>two</p><p>three</p>");
}

#[tokio::test]
async fn test_embedded_images_are_relocated() {
    let server = MockServer::start().await;
    mount_user(&server, &["A"]).await;
    mount_folder(&server, "A", "Team", &[Child::Thread("T1")]).await;
    mount_thread(
        &server,
        "T1",
        "Photos",
        r#"<p>Look:</p><img src="/blob/T1/b1" alt="pic.jpg"><img src="https://elsewhere.example/x.png">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/1/blob/T1/b1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xff, 0xd8, 0xff]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    let mut pipeline = Pipeline::new();
    let store = LocalAssetStore::new(assets.path(), "https://cdn.example.com/a/");
    pipeline.register(Box::new(AssetRelocation::new(Box::new(store)).unwrap()));

    let mut c = coordinator(
        &server,
        pipeline,
        fs_dispatch(out.path()),
        Box::new(JsonFileStore::new(out.path().join("state.json"))),
        0,
    );
    c.resume_or_seed().await.unwrap();
    c.run().await.unwrap();

    let written = std::fs::read_to_string(out.path().join("Team/Photos.html")).unwrap();
    assert!(written.contains(r#"src="https://cdn.example.com/a/T1-b1.jpg""#));
    assert!(written.contains(r#"src="https://elsewhere.example/x.png""#));
    assert_eq!(
        std::fs::read(assets.path().join("T1-b1.jpg")).unwrap(),
        vec![0xff, 0xd8, 0xff]
    );

    server.verify().await;
}

#[tokio::test]
async fn test_failed_asset_download_stops_run() {
    let server = MockServer::start().await;
    mount_user(&server, &["A"]).await;
    mount_folder(&server, "A", "Team", &[Child::Thread("T1")]).await;
    mount_thread(&server, "T1", "Photos", r#"<img src="/blob/T1/b1">"#).await;
    Mock::given(method("GET"))
        .and(path("/1/blob/T1/b1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let assets = TempDir::new().unwrap();
    let mut pipeline = Pipeline::new();
    let store = LocalAssetStore::new(assets.path(), "https://cdn.example.com/a");
    pipeline.register(Box::new(AssetRelocation::new(Box::new(store)).unwrap()));

    let state = out.path().join("state.json");
    let mut c = coordinator(
        &server,
        pipeline,
        fs_dispatch(out.path()),
        Box::new(JsonFileStore::new(&state)),
        0,
    );
    c.resume_or_seed().await.unwrap();
    assert!(c.run().await.is_err());

    // The document stays pending for the next run
    let saved = JsonFileStore::new(&state).load().unwrap();
    assert_eq!(saved.frontier.peek_file().unwrap().file_id, "T1");
    assert!(!out.path().join("Team/Photos.html").exists());
}
