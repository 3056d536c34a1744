//! Stub hierarchy index: a compact binary codec for per-file class declaration
//! summaries and the cross-file symbol graph built from them.

pub mod error;
pub mod graph;
pub mod index;
pub mod names;
pub mod primitives;
pub mod types;
pub mod unit;

pub use error::{Result, StubError};
pub use graph::{ClassSymbol, Owner, PackageSymbol, RetractStats, StagedEnter, StubEnter, SymbolGraph};
pub use index::{HierarchyIndex, IndexOptions, MemoryPayloadCache, PayloadCache, ReindexOutcome};
pub use names::NameTable;
pub use types::{FileId, Modifiers, QualifiedNameId, ShortNameId, StubId};
pub use unit::payload::UnitPayload;
pub use unit::{ClassDecl, Decl, Import, ImportList, Unit, UnitInfo, UnitKind};
