//! Package and class nodes stored in the [`super::SymbolGraph`] arena.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::types::{FileId, Modifiers, QualifiedNameId, ShortNameId, StubId};
use crate::unit::UnitInfo;

use super::enter::{ClassEntry, Owner};

/// Arena slot of a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

/// A package node.
#[derive(Clone, Debug)]
pub struct PackageSymbol {
    pub(crate) qualified_name: QualifiedNameId,
    pub(crate) parent: Option<QualifiedNameId>,
    pub(crate) classes: BTreeMap<ShortNameId, ClassId>,
    pub(crate) subpackages: BTreeSet<QualifiedNameId>,
    pub(crate) files: BTreeSet<FileId>,
}

impl PackageSymbol {
    pub(crate) fn new(qualified_name: QualifiedNameId, parent: Option<QualifiedNameId>) -> Self {
        Self {
            qualified_name,
            parent,
            classes: BTreeMap::new(),
            subpackages: BTreeSet::new(),
            files: BTreeSet::new(),
        }
    }

    /// Dotted name of the package; empty for the root.
    pub fn qualified_name(&self) -> QualifiedNameId {
        self.qualified_name
    }

    /// Enclosing package; `None` for the root package.
    pub fn parent(&self) -> Option<QualifiedNameId> {
        self.parent
    }

    /// Top-level class with simple name `name`.
    pub fn class(&self, name: ShortNameId) -> Option<ClassId> {
        self.classes.get(&name).copied()
    }

    /// Top-level classes ordered by short name id.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes.values().copied()
    }

    /// Direct subpackages.
    pub fn subpackage_names(&self) -> impl Iterator<Item = QualifiedNameId> + '_ {
        self.subpackages.iter().copied()
    }

    /// Files whose unit declares exactly this package.
    pub fn declaring_files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().copied()
    }

    /// True when the package holds neither classes nor subpackages.
    pub fn is_childless(&self) -> bool {
        self.classes.is_empty() && self.subpackages.is_empty()
    }

    pub(crate) fn is_prunable(&self) -> bool {
        self.is_childless() && self.files.is_empty()
    }
}

/// One file's view of a class.
#[derive(Clone, Debug)]
pub(crate) struct Contribution {
    pub(crate) file: FileId,
    pub(crate) seq: u64,
    pub(crate) owner: Owner,
    pub(crate) stub_id: StubId,
    pub(crate) mods: Modifiers,
    pub(crate) supers: Vec<QualifiedNameId>,
    pub(crate) info: Arc<UnitInfo>,
    pub(crate) members: Vec<ClassId>,
}

impl Contribution {
    pub(crate) fn from_entry(entry: ClassEntry, seq: u64) -> Self {
        Self {
            file: entry.file,
            seq,
            owner: entry.owner,
            stub_id: entry.stub_id,
            mods: entry.mods,
            supers: entry.supers,
            info: entry.info,
            members: Vec::new(),
        }
    }
}

/// A class node.
///
/// A class may be declared by several files. Each file keeps its own contribution;
/// attributes are read from the most recently entered one and the member list is the
/// union over all of them.
#[derive(Clone, Debug)]
pub struct ClassSymbol {
    pub(crate) id: ClassId,
    pub(crate) qualified_name: QualifiedNameId,
    pub(crate) name: ShortNameId,
    pub(crate) contributions: SmallVec<[Contribution; 1]>,
    pub(crate) members: Vec<ClassId>,
}

impl ClassSymbol {
    pub(crate) fn new(id: ClassId, qualified_name: QualifiedNameId, name: ShortNameId, first: Contribution) -> Self {
        let mut contributions = SmallVec::new();
        contributions.push(first);
        Self {
            id,
            qualified_name,
            name,
            contributions,
            members: Vec::new(),
        }
    }

    fn latest(&self) -> &Contribution {
        self.contributions
            .iter()
            .max_by_key(|c| c.seq)
            .unwrap_or_else(|| unreachable!("class {} has no contributions", self.id.0))
    }

    /// Arena slot.
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Owner's qualified name plus the simple name.
    pub fn qualified_name(&self) -> QualifiedNameId {
        self.qualified_name
    }

    /// Simple name.
    pub fn name(&self) -> ShortNameId {
        self.name
    }

    /// Stub id of the latest contribution.
    pub fn stub_id(&self) -> StubId {
        self.latest().stub_id
    }

    /// Modifiers of the latest contribution.
    pub fn mods(&self) -> Modifiers {
        self.latest().mods
    }

    /// Supertype names as written in the latest contribution.
    pub fn supers(&self) -> &[QualifiedNameId] {
        &self.latest().supers
    }

    /// Declaring package or class of the latest contribution.
    pub fn owner(&self) -> Owner {
        self.latest().owner
    }

    /// File of the latest contribution.
    pub fn file(&self) -> FileId {
        self.latest().file
    }

    /// Unit context of the latest contribution, for downstream name resolution.
    pub fn unit_info(&self) -> &Arc<UnitInfo> {
        &self.latest().info
    }

    /// Every file contributing to this class.
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.contributions.iter().map(|c| c.file)
    }

    /// Member classes across all contributions.
    pub fn members(&self) -> &[ClassId] {
        &self.members
    }

    pub(crate) fn contribution_mut(&mut self, file: FileId) -> Option<&mut Contribution> {
        self.contributions.iter_mut().find(|c| c.file == file)
    }

    /// Inserts or replaces `file`'s contribution. Returns the replaced one.
    pub(crate) fn put_contribution(&mut self, contribution: Contribution) -> Option<Contribution> {
        match self.contributions.iter_mut().find(|c| c.file == contribution.file) {
            Some(slot) => Some(std::mem::replace(slot, contribution)),
            None => {
                self.contributions.push(contribution);
                None
            }
        }
    }

    /// Removes `file`'s contribution.
    pub(crate) fn take_contribution(&mut self, file: FileId) -> Option<Contribution> {
        let idx = self.contributions.iter().position(|c| c.file == file)?;
        Some(self.contributions.remove(idx))
    }

    pub(crate) fn has_package_owner(&self, package: QualifiedNameId) -> bool {
        self.contributions
            .iter()
            .any(|c| c.owner == Owner::Package(package))
    }

    /// Rebuilds the member union in contribution order.
    pub(crate) fn rebuild_members(&mut self) {
        let mut ordered: Vec<&Contribution> = self.contributions.iter().collect();
        ordered.sort_by_key(|c| c.seq);
        let mut seen = BTreeSet::new();
        self.members = ordered
            .into_iter()
            .flat_map(|c| c.members.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect();
    }
}
