//! Shared fixtures: source API mocks, a recording sink and a counting store

use async_trait::async_trait;
use quip_export::checkpoint::{CheckpointResult, CheckpointStore, JsonFileStore, RunCheckpoint};
use quip_export::crawler::{Coordinator, RunOptions};
use quip_export::pipeline::Pipeline;
use quip_export::sinks::{ExportedDocument, Sink, SinkDispatch, SinkError, SinkResult};
use quip_export::source::SourceClient;
use quip_export::state::FolderRecord;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A child entry in a folder listing
pub enum Child<'a> {
    Folder(&'a str),
    Thread(&'a str),
}

pub async fn mount_user(server: &MockServer, group_folder_ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/1/users/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "U1",
            "name": "Test User",
            "group_folder_ids": group_folder_ids,
            "shared_folder_ids": [],
        })))
        .mount(server)
        .await;
}

pub fn folder_body(id: &str, title: &str, children: &[Child<'_>]) -> Value {
    let children: Vec<Value> = children
        .iter()
        .map(|child| match child {
            Child::Folder(id) => json!({ "folder_id": id }),
            Child::Thread(id) => json!({ "thread_id": id }),
        })
        .collect();
    json!({ "folder": { "id": id, "title": title }, "children": children })
}

pub async fn mount_folder(server: &MockServer, id: &str, title: &str, children: &[Child<'_>]) {
    Mock::given(method("GET"))
        .and(path(format!("/1/folders/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body(id, title, children)))
        .mount(server)
        .await;
}

pub async fn mount_thread(server: &MockServer, id: &str, title: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/1/threads/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "id": id, "title": title, "link": format!("https://quip.example/{}", id) }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/2/threads/{}/html", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "html": html,
            "response_metadata": { "next_cursor": "" }
        })))
        .mount(server)
        .await;
}

/// Records every event it receives as `<id>:folder:<folder>` or
/// `<id>:file:<document>`
pub struct RecordingSink {
    id: String,
    fail_on_files: bool,
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new(id: &str, events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            id: id.to_string(),
            fail_on_files: false,
            events,
        }
    }

    pub fn failing(id: &str, events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            fail_on_files: true,
            ..Self::new(id, events)
        }
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn on_folder_discovered(
        &mut self,
        folder: &FolderRecord,
        _parent: &FolderRecord,
    ) -> SinkResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:folder:{}", self.id, folder.id));
        Ok(())
    }

    async fn on_file_discovered(
        &mut self,
        document: &ExportedDocument,
        _parent: &FolderRecord,
    ) -> SinkResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:file:{}", self.id, document.id()));
        if self.fail_on_files {
            return Err(SinkError::Write("disk full".to_string()));
        }
        Ok(())
    }

    fn save_checkpoint(&self) -> SinkResult<Value> {
        Ok(Value::Null)
    }

    fn load_checkpoint(&mut self, _data: Value) -> SinkResult<()> {
        Ok(())
    }
}

/// JSON file store that counts how many times it was saved
pub struct CountingStore {
    inner: JsonFileStore,
    pub saves: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: JsonFileStore) -> Self {
        Self {
            inner,
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CheckpointStore for CountingStore {
    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn save(&mut self, checkpoint: &RunCheckpoint) -> CheckpointResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(checkpoint)
    }

    fn load(&self) -> CheckpointResult<RunCheckpoint> {
        self.inner.load()
    }

    fn clear(&mut self) -> CheckpointResult<()> {
        self.inner.clear()
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}

pub fn options(save_every: u32) -> RunOptions {
    RunOptions {
        save_every,
        ..RunOptions::default()
    }
}

/// Builds a coordinator against the mock server
pub fn coordinator(
    server: &MockServer,
    pipeline: Pipeline,
    sinks: SinkDispatch,
    store: Box<dyn CheckpointStore>,
    save_every: u32,
) -> Coordinator {
    let client = SourceClient::new(&server.uri(), "test-token").unwrap();
    Coordinator::new(client, pipeline, sinks, store, options(save_every))
}

/// A dispatcher holding a single recording sink
pub fn recording_dispatch(events: &Arc<Mutex<Vec<String>>>) -> SinkDispatch {
    let mut sinks = SinkDispatch::new();
    sinks.register(Box::new(RecordingSink::new("rec", events.clone())));
    sinks
}

pub fn events() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(events: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    events.lock().unwrap().clone()
}
