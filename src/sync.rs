//! Sync Engine - moves tagged mail files into their configured folders
//!
//! This module provides the core synchronization loop: for every rule of a
//! source folder, query the index for matching messages, relocate the
//! matching file into the folder configured for the tag, and refresh the
//! index once afterwards so index and filesystem converge.

use crate::config::Rule;
use crate::index::{Index, IndexError, MessageMatch};
use crate::query::{build_query, TimeWindow};
use anyhow::Context;
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors surfaced by a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// The post-move index refresh failed. Files already moved stay moved;
    /// the index is stale until a later `notmuch new` succeeds.
    #[error("could not refresh index after syncing maildir '{folder}'")]
    RefreshFailed {
        folder: String,
        #[source]
        source: IndexError,
    },

    /// Any other failure: query execution or a filesystem move
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Results from a complete sync of one folder
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub folder: String,
    pub rules_processed: usize,
    /// Rules that matched at least one message
    pub rules_matched: usize,
    /// Messages matched across all rules, including ones left in place
    pub messages_matched: usize,
    /// Files actually relocated (always 0 in dry-run mode)
    pub files_moved: usize,
    pub duration: Duration,
}

/// The main sync engine driving the per-rule move loop
pub struct SyncEngine<I> {
    index: I,
    store_root: PathBuf,
    window: Option<TimeWindow>,
    dry_run: bool,
}

impl<I: Index> SyncEngine<I> {
    /// Create a new sync engine.
    ///
    /// The index handle and the resolved store root are injected; the age
    /// window is fixed here so every rule of this engine's lifetime shares
    /// one window.
    pub fn new(index: I, store_root: impl Into<PathBuf>, max_age_days: u64, dry_run: bool) -> Self {
        Self {
            index,
            store_root: store_root.into(),
            window: TimeWindow::new(max_age_days),
            dry_run,
        }
    }

    /// The age window shared by all queries of this engine, if any
    pub fn window(&self) -> Option<&TimeWindow> {
        self.window.as_ref()
    }

    /// Get the index handle for external inspection
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Move mails in `folder` according to the given rules, then refresh
    /// the index.
    ///
    /// Rules run in their listed order. A failed query or move aborts the
    /// run with the refresh unreached; partially moved files are not rolled
    /// back.
    pub fn sync(&self, folder: &str, rules: &[Rule]) -> Result<SyncSummary, SyncError> {
        let start_time = Instant::now();

        info!("syncing tags in '{}'", folder);

        let mut rules_matched = 0;
        let mut messages_matched = 0;
        let mut files_moved = 0;

        for rule in rules {
            let destination = self.destination_dir(&rule.destination);
            let query = build_query(folder, &rule.tag, self.window.as_ref());
            debug!("query: {}", query);

            let matches = self.index.search(&query).with_context(|| {
                format!("query failed for rule '{}' in '{}'", rule.tag, folder)
            })?;
            messages_matched += matches.len();

            // At most one message moves per rule per run; repeated runs
            // drain the remaining matches.
            if let Some(message) = matches.first() {
                rules_matched += 1;
                self.log_move_action(message, folder, rule);
                if !self.dry_run {
                    move_message(&message.filename, &destination)?;
                    files_moved += 1;
                }
            }
        }

        info!("updating index");
        if self.dry_run {
            info!("would refresh index");
        } else if let Err(source) = self.index.refresh() {
            error!(
                "could not refresh index after syncing maildir '{}': {}",
                folder, source
            );
            return Err(SyncError::RefreshFailed {
                folder: folder.to_string(),
                source,
            });
        }

        Ok(SyncSummary {
            folder: folder.to_string(),
            rules_processed: rules.len(),
            rules_matched,
            messages_matched,
            files_moved,
            duration: start_time.elapsed(),
        })
    }

    /// Resolve a rule's destination to `<store_root>/<destination>/cur/`
    fn destination_dir(&self, destination: &str) -> PathBuf {
        self.store_root.join(destination).join("cur").clean()
    }

    /// Report a mail identified for moving.
    ///
    /// Dry runs narrate at info level; real moves keep the narration at
    /// debug level.
    fn log_move_action(&self, message: &MessageMatch, folder: &str, rule: &Rule) {
        if self.dry_run {
            info!("I would move mail");
            info!("    {}", message.summary());
            info!("from '{}' to '{}'", folder, rule.destination);
        } else {
            debug!("moving mail");
            debug!("    {}", message.summary());
            debug!("from '{}' to '{}'", folder, rule.destination);
        }
        debug!("rule: '{}' in [{}]", rule.tag, message.tags.join(" "));
    }
}

/// Rename a message file into the destination directory.
///
/// Rename only: source and destination are assumed to live on one volume,
/// and the destination directory is assumed to exist.
fn move_message(filename: &Path, destination: &Path) -> Result<(), anyhow::Error> {
    let basename = filename
        .file_name()
        .with_context(|| format!("message filename has no basename: {:?}", filename))?;
    let target = destination.join(basename);

    std::fs::rename(filename, &target)
        .with_context(|| format!("failed to move {:?} to {:?}", filename, target))?;

    Ok(())
}
