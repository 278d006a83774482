//! Concrete sinks against a mocked Notion API and a temporary directory

use crate::support::*;
use quip_export::checkpoint::JsonFileStore;
use quip_export::crawler::ShutdownReason;
use quip_export::pipeline::{HtmlTree, Pipeline};
use quip_export::sinks::{
    ExportedDocument, FilesystemSink, NotionSink, Sink, SinkDispatch, SinkError,
};
use quip_export::source::ThreadMeta;
use quip_export::state::FolderRecord;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(header("Notion-Version", "2022-06-28"))
        .and(header("authorization", "Bearer notion-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "page-x" })))
        .mount(server)
        .await;
}

async fn page_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/v1/pages")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

fn title_of(body: &Value) -> &str {
    body["properties"]["title"]["title"][0]["text"]["content"]
        .as_str()
        .unwrap()
}

fn document(id: &str, title: &str, html: &str) -> ExportedDocument {
    ExportedDocument {
        meta: ThreadMeta {
            id: id.to_string(),
            title: title.to_string(),
            link: None,
            kind: None,
            created_usec: None,
            updated_usec: None,
        },
        html: html.to_string(),
        tree: HtmlTree::parse(html),
    }
}

fn folder(id: &str, title: &str) -> FolderRecord {
    FolderRecord {
        id: id.to_string(),
        title: title.to_string(),
        children: vec![],
    }
}

fn notion(server: &MockServer) -> NotionSink {
    NotionSink::new(&server.uri(), "notion-token", "root-page", 100).unwrap()
}

#[tokio::test]
async fn test_oversized_document_is_split_under_container() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let html: String = (0..250).map(|i| format!("<p>paragraph {}</p>", i)).collect();
    let mut sink = notion(&server);
    sink.on_file_discovered(&document("T1", "T", &html), &FolderRecord::root(&[]))
        .await
        .unwrap();

    let bodies = page_bodies(&server).await;
    assert_eq!(bodies.len(), 4);

    let container = &bodies[0];
    assert_eq!(title_of(container), "T");
    assert_eq!(container["parent"]["page_id"], "root-page");
    assert_eq!(container["children"].as_array().unwrap().len(), 0);

    let titles: Vec<&str> = bodies[1..].iter().map(title_of).collect();
    assert_eq!(titles, vec!["T (part 1/3)", "T (part 2/3)", "T (part 3/3)"]);

    let sizes: Vec<usize> = bodies[1..]
        .iter()
        .map(|b| b["children"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    for part in &bodies[1..] {
        assert_eq!(part["parent"]["page_id"], "page-x");
    }
    assert_eq!(
        bodies[2]["children"][0]["paragraph"]["rich_text"][0]["text"]["content"],
        "paragraph 100"
    );
    assert_eq!(sink.page_for("T1"), Some("page-x"));
}

#[tokio::test]
async fn test_small_document_is_one_page() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let mut sink = notion(&server);
    sink.on_file_discovered(
        &document("T1", "Notes", "<h1>Notes</h1><p>short</p>"),
        &FolderRecord::root(&[]),
    )
    .await
    .unwrap();

    let bodies = page_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(title_of(&bodies[0]), "Notes");
    assert_eq!(bodies[0]["children"][0]["type"], "heading_1");
}

#[tokio::test]
async fn test_notion_folders_nest_and_skip_redelivery() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let mut sink = notion(&server);
    let root = FolderRecord::root(&["A".to_string()]);
    let a = folder("A", "Team");
    sink.on_folder_discovered(&a, &root).await.unwrap();
    sink.on_folder_discovered(&a, &root).await.unwrap();
    sink.on_folder_discovered(&folder("B", "Specs"), &a)
        .await
        .unwrap();

    let bodies = page_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["parent"]["page_id"], "root-page");
    assert_eq!(bodies[1]["parent"]["page_id"], "page-x");
    assert_eq!(sink.pages_created(), 2);
}

#[tokio::test]
async fn test_notion_checkpoint_prevents_duplicate_pages() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let mut first = notion(&server);
    first
        .on_file_discovered(&document("T1", "Doc", "<p>x</p>"), &FolderRecord::root(&[]))
        .await
        .unwrap();
    let saved = first.save_checkpoint().unwrap();
    assert_eq!(saved, json!({ "paths": { "T1": "page-x" } }));

    let mut resumed = notion(&server);
    resumed.load_checkpoint(saved).unwrap();
    resumed
        .on_file_discovered(&document("T1", "Doc", "<p>x</p>"), &FolderRecord::root(&[]))
        .await
        .unwrap();

    assert_eq!(page_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn test_notion_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_string("validation_error"))
        .mount(&server)
        .await;

    let mut sink = notion(&server);
    let err = sink
        .on_folder_discovered(&folder("A", "Team"), &FolderRecord::root(&[]))
        .await
        .unwrap_err();

    match err {
        SinkError::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "validation_error");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
    assert!(sink.page_for("A").is_none());
}

#[tokio::test]
async fn test_filesystem_export_survives_resume() {
    let server = MockServer::start().await;
    mount_user(&server, &["A"]).await;
    mount_folder(&server, "A", "Team", &[Child::Folder("B"), Child::Thread("F")]).await;
    mount_folder(&server, "B", "Specs/Drafts", &[Child::Thread("G")]).await;
    mount_thread(&server, "F", "Roadmap", "<p>roadmap</p>").await;
    mount_thread(&server, "G", "Design", "<p>design</p>").await;

    let out = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let state = state_dir.path().join("state.json");

    loop {
        let mut sinks = SinkDispatch::new();
        sinks.register(Box::new(FilesystemSink::new(out.path())));
        let mut c = coordinator(
            &server,
            Pipeline::new(),
            sinks,
            Box::new(JsonFileStore::new(&state)),
            0,
        );
        c.resume_or_seed().await.unwrap();
        let more = c.step().await.unwrap();
        c.shutdown(ShutdownReason::Signal).unwrap();
        if !more || c.frontier().is_empty() {
            break;
        }
    }

    let roadmap = std::fs::read_to_string(out.path().join("Team/Roadmap.html")).unwrap();
    assert_eq!(roadmap, "<p>roadmap</p>");
    let design =
        std::fs::read_to_string(out.path().join("Team/Specs_Drafts/Design.html")).unwrap();
    assert_eq!(design, "<p>design</p>");
}

#[tokio::test]
async fn test_second_pass_reuses_notion_pages() {
    let server = MockServer::start().await;
    mount_pages(&server).await;
    mount_user(&server, &["A"]).await;
    mount_folder(&server, "A", "Team", &[Child::Thread("F")]).await;
    mount_thread(&server, "F", "Roadmap", "<p>roadmap</p>").await;

    let state_dir = TempDir::new().unwrap();
    let state = state_dir.path().join("state.json");

    for _ in 0..2 {
        let mut sinks = SinkDispatch::new();
        sinks.register(Box::new(notion(&server)));
        let mut c = coordinator(
            &server,
            Pipeline::new(),
            sinks,
            Box::new(JsonFileStore::new(&state)),
            0,
        );
        c.resume_or_seed().await.unwrap();
        let stats = c.run().await.unwrap();
        assert_eq!(stats.files_exported, 1);
        assert_eq!(stats.sink_failures, 0);
    }

    // Folder page and document page from the first pass only
    assert_eq!(page_bodies(&server).await.len(), 2);
}
