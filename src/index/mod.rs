//! Incremental reindex coordinator.
//!
//! Owns the interner, the symbol graph and the payload cache. Encoding and decoding
//! run on any thread; publishing into the graph goes through a single write guard so
//! entry for one file never interleaves with another.

pub mod metrics;
pub mod options;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::{RetractStats, StagedEnter, SymbolGraph};
use crate::names::NameTable;
use crate::types::FileId;
use crate::unit::codec::{self, DecodeContext};
use crate::unit::payload::UnitPayload;
use crate::unit::Unit;

pub use metrics::{IndexMetrics, IndexMetricsSnapshot};
pub use options::IndexOptions;

/// Storage for the last payload seen per file.
///
/// Payloads hold raw short-name handles. An implementation that persists across
/// restarts must persist [`NameTable::short_names`] alongside, and the next process
/// builds its index with [`HierarchyIndex::with_names`] over
/// [`NameTable::from_short_names`] before calling [`HierarchyIndex::enter_cached`].
pub trait PayloadCache: Send + Sync {
    /// Last payload stored for `file`.
    fn get(&self, file: FileId) -> Option<UnitPayload>;
    /// Stores `payload` as the current one for `file`.
    fn put(&self, file: FileId, payload: UnitPayload);
    /// Forgets `file`, returning what was stored.
    fn remove(&self, file: FileId) -> Option<UnitPayload>;
}

/// In-process [`PayloadCache`].
#[derive(Default)]
pub struct MemoryPayloadCache {
    entries: Mutex<FxHashMap<FileId, UnitPayload>>,
}

impl MemoryPayloadCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PayloadCache for MemoryPayloadCache {
    fn get(&self, file: FileId) -> Option<UnitPayload> {
        self.entries.lock().get(&file).cloned()
    }

    fn put(&self, file: FileId, payload: UnitPayload) {
        self.entries.lock().insert(file, payload);
    }

    fn remove(&self, file: FileId) -> Option<UnitPayload> {
        self.entries.lock().remove(&file)
    }
}

/// Result of reindexing one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReindexOutcome {
    /// Payload matched the cached one; nothing was decoded.
    Unchanged,
    /// Prior contribution retracted and the new payload entered.
    Entered {
        /// Classes entered from the new payload.
        classes: usize,
        /// What the retraction of the prior contribution removed.
        retracted: RetractStats,
    },
}

/// Interner, symbol graph and payload cache behind one coordinator.
pub struct HierarchyIndex {
    names: Arc<NameTable>,
    graph: RwLock<SymbolGraph>,
    cache: Arc<dyn PayloadCache>,
    opts: IndexOptions,
    metrics: IndexMetrics,
}

impl HierarchyIndex {
    /// Creates an index backed by a [`MemoryPayloadCache`].
    pub fn new(opts: IndexOptions) -> Self {
        Self::with_cache(opts, Arc::new(MemoryPayloadCache::new()))
    }

    /// Creates an index backed by `cache` with a fresh interner.
    pub fn with_cache(opts: IndexOptions, cache: Arc<dyn PayloadCache>) -> Self {
        Self::with_names(opts, Arc::new(NameTable::new()), cache)
    }

    /// Creates an index over an existing interner, typically one restored with
    /// [`NameTable::from_short_names`] so that `cache` decodes to the same names.
    pub fn with_names(opts: IndexOptions, names: Arc<NameTable>, cache: Arc<dyn PayloadCache>) -> Self {
        Self {
            graph: RwLock::new(SymbolGraph::new(Arc::clone(&names))),
            names,
            cache,
            opts,
            metrics: IndexMetrics::default(),
        }
    }

    /// Interner shared by the codec and the graph.
    pub fn names(&self) -> &Arc<NameTable> {
        &self.names
    }

    /// Options this index was built with.
    pub fn options(&self) -> &IndexOptions {
        &self.opts
    }

    /// Reads the index counters.
    pub fn metrics_snapshot(&self) -> IndexMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Read guard over a consistent snapshot of the graph.
    pub fn graph(&self) -> RwLockReadGuard<'_, SymbolGraph> {
        self.graph.read()
    }

    /// Encodes a unit against this index's interner.
    pub fn encode(&self, unit: &Unit) -> Result<UnitPayload> {
        UnitPayload::from_unit(unit, &self.names)
    }

    /// Encodes and reindexes one file.
    pub fn reindex_unit(&self, file: FileId, unit: &Unit) -> Result<ReindexOutcome> {
        let payload = self.encode(unit)?;
        self.reindex_payload(file, payload)
    }

    /// Reindexes one file from an already encoded payload.
    ///
    /// A payload equal to the cached one is skipped. A corrupt payload leaves both the
    /// graph and the cache untouched.
    pub fn reindex_payload(&self, file: FileId, payload: UnitPayload) -> Result<ReindexOutcome> {
        if self.is_unchanged(file, &payload) {
            return Ok(ReindexOutcome::Unchanged);
        }
        let staged = self.stage(file, &payload)?;
        self.publish(file, payload, staged)
    }

    /// Reindexes many files. Encoding and decoding run in parallel once the batch
    /// reaches [`IndexOptions::parallel_encode_threshold`]; publishing stays serial
    /// and follows input order.
    pub fn reindex_batch(&self, units: Vec<(FileId, Unit)>) -> Vec<(FileId, Result<ReindexOutcome>)> {
        let prepare = |(file, unit): (FileId, Unit)| {
            let prepared = self.encode(&unit).and_then(|payload| {
                if self.is_unchanged(file, &payload) {
                    return Ok(None);
                }
                let staged = self.stage(file, &payload)?;
                Ok(Some((payload, staged)))
            });
            (file, prepared)
        };
        let prepared: Vec<_> = if units.len() >= self.opts.parallel_encode_threshold {
            units.into_par_iter().map(prepare).collect()
        } else {
            units.into_iter().map(prepare).collect()
        };

        prepared
            .into_iter()
            .map(|(file, prepared)| {
                let outcome = prepared.and_then(|staged| match staged {
                    None => Ok(ReindexOutcome::Unchanged),
                    Some((payload, staged)) => self.publish(file, payload, staged),
                });
                (file, outcome)
            })
            .collect()
    }

    /// Enters the cached payload for `file` without comparing, e.g. after a restart
    /// with a persistent cache. Returns `None` when nothing is cached.
    ///
    /// The interner must hold the short names the payload was written against; see
    /// [`PayloadCache`].
    pub fn enter_cached(&self, file: FileId) -> Result<Option<ReindexOutcome>> {
        let Some(payload) = self.cache.get(file) else {
            return Ok(None);
        };
        let staged = self.stage(file, &payload)?;
        self.publish(file, payload, staged).map(Some)
    }

    /// Retracts `file` from the graph and forgets its cached payload.
    pub fn remove_file(&self, file: FileId) -> RetractStats {
        let stats = self.graph.write().retract_file(file);
        self.cache.remove(file);
        if stats != RetractStats::default() {
            self.metrics.unit_retracted();
        }
        debug!(file = file.0, removed = stats.classes_removed, "index.remove_file");
        stats
    }

    fn is_unchanged(&self, file: FileId, payload: &UnitPayload) -> bool {
        let unchanged = self
            .cache
            .get(file)
            .is_some_and(|cached| &cached == payload);
        if unchanged {
            self.metrics.unit_skipped();
            debug!(file = file.0, len = payload.len(), "index.reindex.unchanged");
        }
        unchanged
    }

    fn stage(&self, file: FileId, payload: &UnitPayload) -> Result<StagedEnter> {
        let ctx = DecodeContext::with_options(file, &self.opts);
        let mut staged = StagedEnter::new();
        match codec::decode(payload.bytes(), &ctx, &self.names, &mut staged) {
            Ok(()) => Ok(staged),
            Err(err) => {
                if err.is_corrupt_payload() {
                    self.metrics.corrupt_unit();
                    warn!(file = file.0, len = payload.len(), error = %err, "index.decode.corrupt");
                }
                Err(err)
            }
        }
    }

    fn publish(&self, file: FileId, payload: UnitPayload, staged: StagedEnter) -> Result<ReindexOutcome> {
        let mut graph = self.graph.write();
        let retracted = graph.retract_file(file);
        if retracted != RetractStats::default() {
            self.metrics.unit_retracted();
        }
        let classes = match graph.apply(staged) {
            Ok(classes) => classes,
            Err(err) => {
                graph.retract_file(file);
                drop(graph);
                self.cache.remove(file);
                warn!(file = file.0, error = %err, "index.publish.failed");
                return Err(err);
            }
        };
        drop(graph);
        self.cache.put(file, payload);
        self.metrics.unit_entered(classes);
        debug!(file = file.0, classes, "index.reindex.entered");
        Ok(ReindexOutcome::Entered { classes, retracted })
    }
}

impl Default for HierarchyIndex {
    fn default() -> Self {
        Self::new(IndexOptions::default())
    }
}
