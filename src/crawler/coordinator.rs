//! Crawl coordinator - main export orchestration logic
//!
//! This module contains the depth-first loop that drives an export:
//! - Seeding the frontier from the current user or resuming a checkpoint
//! - Fetching folders and documents through the rate-gated client
//! - Running documents through the extension pipeline
//! - Dispatching discovery events to the sinks
//! - Saving checkpoints periodically and on shutdown
//!
//! # Commit discipline
//!
//! A folder unit is fetched and dispatched first, then committed in one
//! synchronous step: it is recorded as visited, removed from the folder
//! stack and its children are pushed. No await point sits between those
//! three changes, so a checkpoint taken whenever the loop is suspended sees
//! the unit either entirely pending or entirely done. Documents are removed
//! from the file stack only after their event was dispatched.

use crate::checkpoint::{CheckpointStore, RunCheckpoint};
use crate::crawler::shutdown::ShutdownReason;
use crate::pipeline::{Pipeline, RunContext};
use crate::sinks::{ExportedDocument, SinkDispatch};
use crate::source::{seed_folder_ids, SeedKind, SourceClient};
use crate::state::{ChildRef, FolderRecord, Frontier, VisitedRegistry, ROOT_FOLDER_ID};
use crate::ExportError;
use chrono::Utc;

/// Run-level settings that are not part of any component
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Folder sets that seed a fresh run
    pub seed: Vec<SeedKind>,

    /// Committed folder units between periodic checkpoints (0 disables them)
    pub save_every: u32,

    /// Hash of the configuration the run was started with
    pub config_hash: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: vec![SeedKind::Group],
            save_every: 25,
            config_hash: None,
        }
    }
}

/// How the coordinator obtained its initial state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Seeded from the current user's folders
    Seeded,

    /// Loaded from a saved checkpoint
    Resumed,
}

/// Counters for a single process lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub folders_fetched: u64,
    pub duplicates_skipped: u64,
    pub files_exported: u64,
    pub sink_failures: u64,
    pub checkpoints_written: u64,
}

/// Main export coordinator structure
pub struct Coordinator {
    client: SourceClient,
    pipeline: Pipeline,
    sinks: SinkDispatch,
    store: Box<dyn CheckpointStore>,
    options: RunOptions,
    frontier: Frontier,
    visited: VisitedRegistry,
    stats: RunStats,
    units_since_save: u32,
}

impl Coordinator {
    /// Creates a coordinator with empty run state
    ///
    /// Call [`Coordinator::resume_or_seed`] before stepping.
    pub fn new(
        client: SourceClient,
        pipeline: Pipeline,
        sinks: SinkDispatch,
        store: Box<dyn CheckpointStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            client,
            pipeline,
            sinks,
            store,
            options,
            frontier: Frontier::new(),
            visited: VisitedRegistry::new(FolderRecord::root(&[])),
            stats: RunStats::default(),
            units_since_save: 0,
        }
    }

    /// Loads the saved checkpoint if there is one, otherwise seeds the
    /// frontier from the current user's folders
    ///
    /// A checkpoint of a finished run starts a new pass from the seed
    /// folders. Sink state is carried over so sinks keep recognizing what
    /// they already exported.
    ///
    /// # Errors
    ///
    /// * `ExportError::CorruptCheckpoint` - The saved checkpoint is unreadable
    /// * Any client error from the current-user request
    pub async fn resume_or_seed(&mut self) -> Result<StartMode, ExportError> {
        if self.store.exists() {
            let checkpoint = self.store.load()?;
            if !checkpoint.is_complete() {
                self.restore(checkpoint);
                return Ok(StartMode::Resumed);
            }

            tracing::warn!(
                "Previous export finished at {}, starting a new pass (use --fresh to also discard sink state)",
                checkpoint.timestamp
            );
            self.sinks.load_checkpoints(&checkpoint.sinks);
        }

        let user = self.client.current_user().await?;
        let seeds = seed_folder_ids(&user, &self.options.seed);
        if seeds.is_empty() {
            tracing::warn!("Current user has no folders of the requested kinds");
        }

        self.seed(&seeds);
        tracing::info!("Seeded frontier with {} folders", seeds.len());
        Ok(StartMode::Seeded)
    }

    /// Replaces the run state with a fresh frontier over `seeds`
    ///
    /// Seeds are pushed in order, so the last one is processed first.
    pub fn seed(&mut self, seeds: &[String]) {
        self.frontier = Frontier::new();
        for id in seeds {
            self.frontier.push_folder(id.clone(), ROOT_FOLDER_ID);
        }
        self.visited = VisitedRegistry::new(FolderRecord::root(seeds));
    }

    fn restore(&mut self, checkpoint: RunCheckpoint) {
        match (&checkpoint.config_hash, &self.options.config_hash) {
            (Some(saved), Some(current)) if saved != current => {
                tracing::warn!(
                    "Configuration changed since checkpoint was written at {}, resuming anyway",
                    checkpoint.timestamp
                );
            }
            _ => {}
        }

        tracing::info!(
            "Resuming from {} ({} folders visited, {} folders and {} files pending)",
            self.store.location(),
            checkpoint.visited.len(),
            checkpoint.frontier.folders.len(),
            checkpoint.frontier.files.len()
        );

        self.sinks.load_checkpoints(&checkpoint.sinks);
        self.frontier = checkpoint.frontier;
        self.visited = checkpoint.visited;
    }

    /// Current run state as it would be saved
    pub fn snapshot(&self) -> RunCheckpoint {
        RunCheckpoint {
            timestamp: Utc::now(),
            config_hash: self.options.config_hash.clone(),
            frontier: self.frontier.clone(),
            visited: self.visited.clone(),
            sinks: self.sinks.save_checkpoints(),
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn visited(&self) -> &VisitedRegistry {
        &self.visited
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn client(&self) -> &SourceClient {
        &self.client
    }

    /// Saves the current state through the checkpoint store
    ///
    /// This is the single place checkpoints are written, whether the run
    /// completed, hit its rate budget, failed, was interrupted by a signal
    /// or just reached a periodic save.
    pub fn shutdown(&mut self, reason: ShutdownReason) -> Result<(), ExportError> {
        let checkpoint = self.snapshot();
        self.store.save(&checkpoint)?;
        self.stats.checkpoints_written += 1;
        self.units_since_save = 0;

        match reason {
            ShutdownReason::Periodic => tracing::debug!(
                "Checkpoint written to {} ({} folders visited)",
                self.store.location(),
                self.visited.len()
            ),
            ShutdownReason::Completed => tracing::info!(
                "Final checkpoint written to {}",
                self.store.location()
            ),
            reason => tracing::error!(
                "Stopping ({}), checkpoint written to {}",
                reason,
                self.store.location()
            ),
        }

        Ok(())
    }

    /// Processes one folder unit
    ///
    /// Files left on the stack by an interrupted run are drained first. The
    /// top folder is then skipped if it was already visited, or fetched,
    /// dispatched, committed and followed by its files.
    ///
    /// Returns `Ok(false)` once there is no work left.
    pub async fn step(&mut self) -> Result<bool, ExportError> {
        self.drain_files().await?;

        let Some(work) = self.frontier.peek_folder().cloned() else {
            return Ok(false);
        };

        if self.visited.contains(&work.folder_id) {
            tracing::debug!("Folder {} already visited, skipping", work.folder_id);
            self.frontier.pop_folder();
            self.stats.duplicates_skipped += 1;
            return Ok(true);
        }

        let record = self.client.read_folder(&work.folder_id).await?;
        self.stats.folders_fetched += 1;

        if record.id != work.folder_id && self.visited.contains(&record.id) {
            tracing::warn!(
                "Folder {} resolved to already visited folder {}, skipping",
                work.folder_id,
                record.id
            );
            self.frontier.pop_folder();
            self.stats.duplicates_skipped += 1;
            return Ok(true);
        }
        tracing::info!(
            "Folder {} ({}): {} children",
            record.title,
            record.id,
            record.children.len()
        );

        let parent = self.parent_record(&work.parent_folder_id);
        let report = self.sinks.folder_discovered(&record, &parent).await;
        self.stats.sink_failures += report.failed.len() as u64;

        // Commit. The entry must be popped before children land on top of it.
        self.frontier.pop_folder();
        for child in &record.children {
            match child {
                ChildRef::Folder(id) => self.frontier.push_folder(id.clone(), record.id.clone()),
                ChildRef::File(id) => self.frontier.push_file(id.clone(), record.id.clone()),
            }
        }
        let inserted = self.visited.insert(record);
        debug_assert!(inserted, "folder committed twice");
        self.units_since_save += 1;

        self.drain_files().await?;
        Ok(true)
    }

    async fn drain_files(&mut self) -> Result<(), ExportError> {
        while let Some(work) = self.frontier.peek_file().cloned() {
            let markup = self.client.thread_html(&work.file_id).await?;
            let ctx = RunContext {
                client: &self.client,
                document_id: &work.file_id,
            };
            let processed = self.pipeline.apply(&markup, &ctx).await?;
            let meta = self.client.thread(&work.file_id).await?;

            let document = ExportedDocument::new(meta, processed);
            let parent = self.parent_record(&work.parent_folder_id);
            let report = self.sinks.file_discovered(&document, &parent).await;
            self.stats.sink_failures += report.failed.len() as u64;

            self.frontier.pop_file();
            self.stats.files_exported += 1;
            tracing::info!("File {} ({})", document.title(), document.id());
        }
        Ok(())
    }

    /// Record of a parent folder, the root if it is unknown
    fn parent_record(&self, parent_id: &str) -> FolderRecord {
        self.visited
            .get(parent_id)
            .or_else(|| self.visited.root())
            .cloned()
            .unwrap_or_else(|| FolderRecord::root(&[]))
    }

    /// Runs until the frontier is empty or an error stops the run
    ///
    /// On error the checkpoint is saved once with a reason derived from the
    /// error, then the error is returned. On completion a final checkpoint
    /// with an empty frontier is written.
    pub async fn run(&mut self) -> Result<RunStats, ExportError> {
        let start_time = std::time::Instant::now();
        tracing::info!(
            "Starting export: {} folders and {} files pending, sinks: {}",
            self.frontier.folders.len(),
            self.frontier.files.len(),
            self.sinks.ids().join(", ")
        );

        loop {
            match self.step().await {
                Ok(true) => {
                    let save_every = self.options.save_every;
                    if save_every > 0 && self.units_since_save >= save_every {
                        self.shutdown(ShutdownReason::Periodic)?;
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    if let Err(save_error) = self.shutdown(ShutdownReason::from(&e)) {
                        tracing::error!("Failed to save checkpoint: {}", save_error);
                    }
                    return Err(e);
                }
            }
        }

        self.shutdown(ShutdownReason::Completed)?;

        tracing::info!(
            "Export completed in {:?}: {} folders, {} files, {} duplicates skipped, {} sink failures, {} requests",
            start_time.elapsed(),
            self.stats.folders_fetched,
            self.stats.files_exported,
            self.stats.duplicates_skipped,
            self.stats.sink_failures,
            self.client.requests_sent()
        );
        for (sink, count) in self.sinks.failure_counts() {
            tracing::warn!("Sink {} failed {} times", sink, count);
        }

        Ok(self.stats.clone())
    }
}
