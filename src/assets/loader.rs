//! Background asset loading.
//!
//! Decoding happens on a blocking pool; results travel back over a channel
//! and are drained on the engine thread at frame boundaries. GPU upload and
//! scene mutation therefore always happen on the engine thread, no matter
//! how many imports run concurrently.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::error::ImportError;

use super::{import, ImportedAsset};

/// Identifies one requested import. Tickets are never reused by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportTicket(u64);

/// A finished background import, successful or not.
#[derive(Debug)]
pub struct CompletedImport {
    pub ticket: ImportTicket,
    pub path: PathBuf,
    pub result: Result<ImportedAsset, ImportError>,
}

/// Schedules imports on a blocking pool and collects their results.
pub struct AssetLoader {
    runtime: tokio::runtime::Runtime,
    tx: mpsc::UnboundedSender<CompletedImport>,
    rx: mpsc::UnboundedReceiver<CompletedImport>,
    next_ticket: u64,
    in_flight: usize,
    cancelled: HashSet<ImportTicket>,
}

impl AssetLoader {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            tx,
            rx,
            next_ticket: 0,
            in_flight: 0,
            cancelled: HashSet::new(),
        })
    }

    /// Start decoding `path` in the background.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> ImportTicket {
        let ticket = ImportTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight += 1;

        let path = path.into();
        let tx = self.tx.clone();
        self.runtime.spawn_blocking(move || {
            let result = import(&path);
            // The receiver lives as long as the loader; a send failure only
            // happens during shutdown and the result is moot then.
            let _ = tx.send(CompletedImport {
                ticket,
                path,
                result,
            });
        });
        ticket
    }

    /// Cancel a pending import, best effort.
    ///
    /// A decode that already started still runs to completion; its result is
    /// silently discarded when it arrives.
    pub fn cancel(&mut self, ticket: ImportTicket) {
        self.cancelled.insert(ticket);
    }

    /// Imports started but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect every import that has finished since the last drain,
    /// in completion order. Cancelled tickets are dropped here.
    pub fn drain_completed(&mut self) -> Vec<CompletedImport> {
        let mut out = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            self.in_flight -= 1;
            if self.cancelled.remove(&done.ticket) {
                log::debug!("discarding cancelled import of {}", done.path.display());
                continue;
            }
            out.push(done);
        }
        out
    }

    /// Decode a batch of assets, blocking until all are done. Results come
    /// back in the order of `paths` regardless of completion order.
    pub fn import_all_blocking(
        &self,
        paths: &[PathBuf],
    ) -> Vec<Result<ImportedAsset, ImportError>> {
        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| self.runtime.spawn_blocking(move || import(&path)))
            .collect();
        self.runtime.block_on(async {
            futures::future::join_all(handles)
                .await
                .into_iter()
                .zip(paths)
                .map(|(joined, path)| match joined {
                    Ok(result) => result,
                    Err(e) => Err(ImportError::decode(path, "worker", e)),
                })
                .collect()
        })
    }
}
