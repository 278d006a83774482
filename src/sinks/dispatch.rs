//! Fan-out of discovery events to every registered sink
//!
//! A failing sink is logged and counted; it never stops the other sinks or
//! the crawl.

use crate::checkpoint::SinkCheckpoint;
use crate::sinks::traits::{ExportedDocument, Sink};
use crate::state::FolderRecord;
use std::collections::BTreeMap;

/// Outcome of delivering one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of sinks that accepted the event
    pub delivered: usize,

    /// Ids of sinks that failed on the event
    pub failed: Vec<String>,
}

/// Registered sinks, called in registration order
#[derive(Default)]
pub struct SinkDispatch {
    sinks: Vec<Box<dyn Sink>>,
    failures: BTreeMap<String, u64>,
}

impl SinkDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink
    pub fn register(&mut self, sink: Box<dyn Sink>) {
        tracing::debug!("Registered sink {}", sink.id());
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Ids of the registered sinks
    pub fn ids(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.id().to_string()).collect()
    }

    /// Failure count per sink id since the dispatcher was created
    pub fn failure_counts(&self) -> &BTreeMap<String, u64> {
        &self.failures
    }

    /// Delivers a "folder discovered" event to every sink
    pub async fn folder_discovered(
        &mut self,
        folder: &FolderRecord,
        parent: &FolderRecord,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in self.sinks.iter_mut() {
            match sink.on_folder_discovered(folder, parent).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!(
                        "Sink {} failed on folder {} ({}): {}",
                        sink.id(),
                        folder.title,
                        folder.id,
                        e
                    );
                    *self.failures.entry(sink.id().to_string()).or_default() += 1;
                    report.failed.push(sink.id().to_string());
                }
            }
        }

        report
    }

    /// Delivers a "file discovered" event to every sink
    pub async fn file_discovered(
        &mut self,
        document: &ExportedDocument,
        parent: &FolderRecord,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in self.sinks.iter_mut() {
            match sink.on_file_discovered(document, parent).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!(
                        "Sink {} failed on file {} ({}): {}",
                        sink.id(),
                        document.title(),
                        document.id(),
                        e
                    );
                    *self.failures.entry(sink.id().to_string()).or_default() += 1;
                    report.failed.push(sink.id().to_string());
                }
            }
        }

        report
    }

    /// Collects every sink's checkpoint data
    ///
    /// A sink whose save fails is logged and left out; it will start from
    /// empty state when resumed.
    pub fn save_checkpoints(&self) -> Vec<SinkCheckpoint> {
        self.sinks
            .iter()
            .filter_map(|sink| match sink.save_checkpoint() {
                Ok(data) => Some(SinkCheckpoint {
                    sink_id: sink.id().to_string(),
                    data,
                }),
                Err(e) => {
                    tracing::error!("Sink {} could not save its checkpoint: {}", sink.id(), e);
                    None
                }
            })
            .collect()
    }

    /// Hands each sink its saved data
    ///
    /// Entries for unknown sinks are ignored; sinks without an entry keep
    /// their fresh state.
    pub fn load_checkpoints(&mut self, checkpoints: &[SinkCheckpoint]) {
        for checkpoint in checkpoints {
            let Some(sink) = self
                .sinks
                .iter_mut()
                .find(|s| s.id() == checkpoint.sink_id)
            else {
                tracing::warn!(
                    "Ignoring checkpoint data for unregistered sink {}",
                    checkpoint.sink_id
                );
                continue;
            };

            if let Err(e) = sink.load_checkpoint(checkpoint.data.clone()) {
                tracing::error!(
                    "Sink {} could not load its checkpoint, starting empty: {}",
                    checkpoint.sink_id,
                    e
                );
            }
        }
    }
}
