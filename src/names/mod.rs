#![forbid(unsafe_code)]
//! Interning of identifier segments and qualified names.
//!
//! Qualified names are stored as parent links: `a.b.C` is the entry `(a.b, C)`, and
//! `a.b` is `(a, b)`. Two segment sequences are equal exactly when their ids are.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::{Result, StubError};
use crate::types::{QualifiedNameId, ShortNameId};

/// Segment list returned by [`NameTable::segments_of`].
pub type Segments = SmallVec<[ShortNameId; 8]>;

/// Interner hit/miss counters.
#[derive(Debug, Default)]
pub struct NameMetrics {
    intern_calls: AtomicU64,
    intern_hits: AtomicU64,
    intern_misses: AtomicU64,
}

/// Point-in-time copy of [`NameMetrics`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NameMetricsSnapshot {
    /// Every `intern_*` call, hits and misses alike.
    pub intern_calls: u64,
    /// Calls answered by an existing id.
    pub intern_hits: u64,
    /// Calls that allocated a new id.
    pub intern_misses: u64,
}

impl NameMetricsSnapshot {
    /// Fraction of intern calls that were hits; `0.0` before any call.
    pub fn intern_hit_rate(&self) -> f64 {
        if self.intern_calls == 0 {
            return 0.0;
        }
        self.intern_hits as f64 / self.intern_calls as f64
    }
}

impl NameMetrics {
    /// Reads the counters.
    pub fn snapshot(&self) -> NameMetricsSnapshot {
        NameMetricsSnapshot {
            intern_calls: self.intern_calls.load(Ordering::Relaxed),
            intern_hits: self.intern_hits.load(Ordering::Relaxed),
            intern_misses: self.intern_misses.load(Ordering::Relaxed),
        }
    }

    fn hit(&self) {
        self.intern_calls.fetch_add(1, Ordering::Relaxed);
        self.intern_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.intern_calls.fetch_add(1, Ordering::Relaxed);
        self.intern_misses.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct ShortTable {
    ids: FxHashMap<Arc<str>, ShortNameId>,
    names: Vec<Arc<str>>,
}

#[derive(Clone, Copy, Debug)]
struct QualifiedEntry {
    parent: QualifiedNameId,
    name: ShortNameId,
    depth: u32,
}

#[derive(Debug)]
struct QualifiedTable {
    ids: FxHashMap<(QualifiedNameId, ShortNameId), QualifiedNameId>,
    // slot 0 is the empty name
    entries: Vec<QualifiedEntry>,
}

impl Default for QualifiedTable {
    fn default() -> Self {
        Self {
            ids: FxHashMap::default(),
            entries: vec![QualifiedEntry {
                parent: QualifiedNameId::EMPTY,
                name: ShortNameId(0),
                depth: 0,
            }],
        }
    }
}

impl QualifiedTable {
    fn get(&self, id: QualifiedNameId) -> Option<QualifiedEntry> {
        self.entries.get(id.0 as usize).copied()
    }
}

/// Append-only interner for short and qualified names.
///
/// Safe to share across threads. Lookups take a read lock; a miss takes the write lock
/// and re-checks before allocating, so concurrent callers interning the same content
/// always observe one id.
#[derive(Debug, Default)]
pub struct NameTable {
    shorts: RwLock<ShortTable>,
    qualified: RwLock<QualifiedTable>,
    metrics: NameMetrics,
}

impl NameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a table whose short ids match the exported `shorts`, as returned by
    /// [`NameTable::short_names`].
    ///
    /// Payloads carry raw short handles, so a table restored this way is what lets
    /// cached payloads decode to the same names in a later process. Duplicate
    /// entries would shift every later id and are rejected.
    pub fn from_short_names<I, S>(shorts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = Self::new();
        for (expected, segment) in shorts.into_iter().enumerate() {
            let segment = segment.as_ref();
            let id = table.intern_short(segment)?;
            if id.0 as usize != expected {
                return Err(StubError::InvalidArgument(format!(
                    "short name {segment:?} listed twice (ids {} and {expected})",
                    id.0
                )));
            }
        }
        Ok(table)
    }

    /// Every short name in id order; index `i` holds the text of `ShortNameId(i)`.
    pub fn short_names(&self) -> Vec<Arc<str>> {
        self.shorts.read().names.clone()
    }

    /// Reads the interner counters.
    pub fn metrics_snapshot(&self) -> NameMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Interns a single identifier segment.
    pub fn intern_short(&self, segment: &str) -> Result<ShortNameId> {
        if let Some(&id) = self.shorts.read().ids.get(segment) {
            self.metrics.hit();
            return Ok(id);
        }
        let mut table = self.shorts.write();
        if let Some(&id) = table.ids.get(segment) {
            self.metrics.hit();
            return Ok(id);
        }
        let raw = u32::try_from(table.names.len())
            .map_err(|_| StubError::NameTableFull("short name ids"))?;
        let id = ShortNameId(raw);
        let owned: Arc<str> = Arc::from(segment);
        table.names.push(Arc::clone(&owned));
        table.ids.insert(owned, id);
        self.metrics.miss();
        trace!(len = segment.len(), id = raw, "names.intern_short.insert");
        Ok(id)
    }

    /// Appends `short` to `owner` (or starts a new top-level name when `owner` is
    /// `None`) and returns the interned id.
    pub fn intern_qualified(
        &self,
        owner: Option<QualifiedNameId>,
        short: ShortNameId,
    ) -> Result<QualifiedNameId> {
        let owner = owner.unwrap_or(QualifiedNameId::EMPTY);
        let key = (owner, short);
        {
            let table = self.qualified.read();
            if let Some(&id) = table.ids.get(&key) {
                self.metrics.hit();
                return Ok(id);
            }
        }
        if !self.contains_short(short) {
            return Err(StubError::InvalidArgument(format!(
                "short name id {} was never interned",
                short.0
            )));
        }
        let mut table = self.qualified.write();
        if let Some(&id) = table.ids.get(&key) {
            self.metrics.hit();
            return Ok(id);
        }
        let parent = table.get(owner).ok_or(StubError::UnknownName(owner.0))?;
        let raw = u32::try_from(table.entries.len())
            .map_err(|_| StubError::NameTableFull("qualified name ids"))?;
        let id = QualifiedNameId(raw);
        table.entries.push(QualifiedEntry {
            parent: owner,
            name: short,
            depth: parent.depth + 1,
        });
        table.ids.insert(key, id);
        self.metrics.miss();
        trace!(owner = owner.0, name = short.0, id = raw, "names.intern_qualified.insert");
        Ok(id)
    }

    /// Interns a qualified name from its full segment list.
    pub fn intern_segments(&self, segments: &[ShortNameId]) -> Result<QualifiedNameId> {
        segments
            .iter()
            .try_fold(QualifiedNameId::EMPTY, |owner, &segment| {
                self.intern_qualified(Some(owner), segment)
            })
    }

    /// Interns a dotted name such as `java.lang.Object`. The empty string maps to
    /// [`QualifiedNameId::EMPTY`].
    pub fn intern_dotted(&self, dotted: &str) -> Result<QualifiedNameId> {
        if dotted.is_empty() {
            return Ok(QualifiedNameId::EMPTY);
        }
        let mut owner = QualifiedNameId::EMPTY;
        for part in dotted.split('.') {
            let short = self.intern_short(part)?;
            owner = self.intern_qualified(Some(owner), short)?;
        }
        Ok(owner)
    }

    /// Returns the segments of `id` in order, or `None` for an id never issued.
    pub fn segments_of(&self, id: QualifiedNameId) -> Option<Segments> {
        let table = self.qualified.read();
        let mut entry = table.get(id)?;
        let mut segments = Segments::with_capacity(entry.depth as usize);
        while entry.depth > 0 {
            segments.push(entry.name);
            entry = table.get(entry.parent)?;
        }
        segments.reverse();
        Some(segments)
    }

    /// Returns the name `id` was built from, minus its last segment.
    pub fn parent_of(&self, id: QualifiedNameId) -> Option<QualifiedNameId> {
        let entry = self.qualified.read().get(id)?;
        (entry.depth > 0).then_some(entry.parent)
    }

    /// Returns the last segment of `id`.
    pub fn last_segment(&self, id: QualifiedNameId) -> Option<ShortNameId> {
        let entry = self.qualified.read().get(id)?;
        (entry.depth > 0).then_some(entry.name)
    }

    /// Returns true if `id` has been issued.
    pub fn contains_short(&self, id: ShortNameId) -> bool {
        (id.0 as usize) < self.shorts.read().names.len()
    }

    /// Returns true if `id` has been issued.
    pub fn contains_qualified(&self, id: QualifiedNameId) -> bool {
        (id.0 as usize) < self.qualified.read().entries.len()
    }

    /// Resolves a short name id to its text.
    pub fn short_name(&self, id: ShortNameId) -> Option<Arc<str>> {
        self.shorts.read().names.get(id.0 as usize).cloned()
    }

    /// Renders a qualified name with `.` separators.
    pub fn display(&self, id: QualifiedNameId) -> Option<String> {
        let segments = self.segments_of(id)?;
        let shorts = self.shorts.read();
        let mut out = String::new();
        for (idx, segment) in segments.iter().enumerate() {
            if idx > 0 {
                out.push('.');
            }
            out.push_str(shorts.names.get(segment.0 as usize)?);
        }
        Some(out)
    }

    /// Number of distinct short names.
    pub fn short_count(&self) -> usize {
        self.shorts.read().names.len()
    }

    /// Number of distinct qualified names, not counting the empty name.
    pub fn qualified_count(&self) -> usize {
        self.qualified.read().entries.len() - 1
    }
}
