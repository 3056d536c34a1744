//! Cross-file symbol graph of packages and classes.
//!
//! Nodes live in an arena addressed by [`ClassId`] and are indexed by qualified name,
//! by contributing file and by written supertype name. Owners are referenced by
//! qualified name, never by pointer, so retraction only touches index entries and
//! arena slots.

pub mod enter;
mod retract;
mod symbol;

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{Result, StubError};
use crate::names::NameTable;
use crate::types::{FileId, QualifiedNameId};

pub use enter::{ClassEntry, EnterOp, Owner, StagedEnter, StubEnter};
pub use retract::RetractStats;
pub use symbol::{ClassId, ClassSymbol, PackageSymbol};

use symbol::Contribution;

/// Shared symbol graph.
///
/// Mutated only through [`StubEnter`], [`SymbolGraph::apply`] and
/// [`SymbolGraph::retract_file`]; callers serialize writers.
pub struct SymbolGraph {
    names: Arc<NameTable>,
    packages: FxHashMap<QualifiedNameId, PackageSymbol>,
    slots: Vec<Option<ClassSymbol>>,
    free: Vec<ClassId>,
    by_name: FxHashMap<QualifiedNameId, ClassId>,
    by_file: FxHashMap<FileId, BTreeSet<ClassId>>,
    by_super: FxHashMap<QualifiedNameId, BTreeSet<ClassId>>,
    claims: FxHashMap<FileId, BTreeSet<QualifiedNameId>>,
    seq: u64,
}

impl SymbolGraph {
    /// Creates a graph holding only the root package.
    pub fn new(names: Arc<NameTable>) -> Self {
        let mut packages = FxHashMap::default();
        packages.insert(
            QualifiedNameId::EMPTY,
            PackageSymbol::new(QualifiedNameId::EMPTY, None),
        );
        Self {
            names,
            packages,
            slots: Vec::new(),
            free: Vec::new(),
            by_name: FxHashMap::default(),
            by_file: FxHashMap::default(),
            by_super: FxHashMap::default(),
            claims: FxHashMap::default(),
            seq: 0,
        }
    }

    /// Interner the graph's names come from.
    pub fn names(&self) -> &Arc<NameTable> {
        &self.names
    }

    /// Replays a staged decode. Returns the number of classes entered.
    pub fn apply(&mut self, staged: StagedEnter) -> Result<usize> {
        let classes = staged.class_count();
        for op in staged.into_ops() {
            match op {
                EnterOp::Package(name) => {
                    self.enter_package(name)?;
                }
                EnterOp::Claim { package, file } => self.claim_package(package, file)?,
                EnterOp::Class(entry) => {
                    self.enter_class(entry)?;
                }
                EnterOp::Members {
                    owner,
                    file,
                    members,
                } => self.set_members(owner, file, members)?,
            }
        }
        Ok(classes)
    }

    /// The default package.
    pub fn root(&self) -> &PackageSymbol {
        &self.packages[&QualifiedNameId::EMPTY]
    }

    /// Package named `name`, if present.
    pub fn package(&self, name: QualifiedNameId) -> Option<&PackageSymbol> {
        self.packages.get(&name)
    }

    /// Class with qualified name `name`, if present.
    pub fn class(&self, name: QualifiedNameId) -> Option<&ClassSymbol> {
        self.by_name.get(&name).and_then(|&id| self.class_by_id(id))
    }

    /// Class in arena slot `id`; `None` for a freed slot.
    pub fn class_by_id(&self, id: ClassId) -> Option<&ClassSymbol> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Arena slot of the class named `name`.
    pub fn class_id(&self, name: QualifiedNameId) -> Option<ClassId> {
        self.by_name.get(&name).copied()
    }

    /// Top-level classes of a package, ordered by short name id.
    pub fn classes_in(&self, package: QualifiedNameId) -> Vec<&ClassSymbol> {
        self.packages
            .get(&package)
            .map(|pkg| pkg.class_ids().filter_map(|id| self.class_by_id(id)).collect())
            .unwrap_or_default()
    }

    /// Direct subpackages of `package`.
    pub fn subpackages(&self, package: QualifiedNameId) -> Vec<&PackageSymbol> {
        self.packages
            .get(&package)
            .map(|pkg| {
                pkg.subpackage_names()
                    .filter_map(|name| self.packages.get(&name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Member classes of a class.
    pub fn members_of(&self, class: QualifiedNameId) -> Vec<&ClassSymbol> {
        self.class(class)
            .map(|symbol| {
                symbol
                    .members()
                    .iter()
                    .filter_map(|&id| self.class_by_id(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Classes that `file` contributes to.
    pub fn classes_from_file(&self, file: FileId) -> Vec<&ClassSymbol> {
        self.by_file
            .get(&file)
            .map(|ids| ids.iter().filter_map(|&id| self.class_by_id(id)).collect())
            .unwrap_or_default()
    }

    /// Classes whose latest contribution lists `name` verbatim as a supertype.
    ///
    /// No resolution happens here: a class writing `List` is not found under
    /// `java.util.List`.
    pub fn classes_naming_super(&self, name: QualifiedNameId) -> Vec<&ClassSymbol> {
        self.by_super
            .get(&name)
            .map(|ids| ids.iter().filter_map(|&id| self.class_by_id(id)).collect())
            .unwrap_or_default()
    }

    /// Every live class in slot order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Number of live classes.
    pub fn class_count(&self) -> usize {
        self.by_name.len()
    }

    /// Number of packages, including the root.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Number of files with at least one class in the graph.
    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    fn slot_mut(&mut self, id: ClassId) -> Option<&mut ClassSymbol> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn allocate(&mut self, symbol: impl FnOnce(ClassId) -> ClassSymbol) -> ClassId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                ClassId((self.slots.len() - 1) as u32)
            }
        };
        self.slots[id.0 as usize] = Some(symbol(id));
        id
    }

    fn ensure_owner(&self, owner: Owner) -> Result<()> {
        let exists = match owner {
            Owner::Package(name) => self.packages.contains_key(&name),
            Owner::Class(name) => self.by_name.contains_key(&name),
        };
        if exists {
            Ok(())
        } else {
            Err(StubError::InvalidArgument(format!("owner {owner:?} is not in the graph")))
        }
    }

    fn index_supers(&mut self, id: ClassId, old: &[QualifiedNameId], new: &[QualifiedNameId]) {
        for name in old {
            if let Some(set) = self.by_super.get_mut(name) {
                set.remove(&id);
                if set.is_empty() {
                    self.by_super.remove(name);
                }
            }
        }
        for &name in new {
            self.by_super.entry(name).or_default().insert(id);
        }
    }

    /// Drops the package link of `id` if no remaining contribution declares it there.
    fn unlink_stale_owner(&mut self, id: ClassId, old_owner: Owner) {
        let Owner::Package(package) = old_owner else {
            return;
        };
        let still_owned = self
            .class_by_id(id)
            .is_some_and(|symbol| symbol.has_package_owner(package));
        if still_owned {
            return;
        }
        if let Some(pkg) = self.packages.get_mut(&package) {
            pkg.classes.retain(|_, linked| *linked != id);
        }
    }
}

impl StubEnter for SymbolGraph {
    fn enter_package(&mut self, name: QualifiedNameId) -> Result<Owner> {
        if self.packages.contains_key(&name) {
            return Ok(Owner::Package(name));
        }
        let parent = self
            .names
            .parent_of(name)
            .ok_or(StubError::UnknownName(name.0))?;
        self.enter_package(parent)?;
        self.packages
            .insert(name, PackageSymbol::new(name, Some(parent)));
        if let Some(pkg) = self.packages.get_mut(&parent) {
            pkg.subpackages.insert(name);
        }
        trace!(package = name.0, parent = parent.0, "graph.enter_package.insert");
        Ok(Owner::Package(name))
    }

    fn claim_package(&mut self, package: QualifiedNameId, file: FileId) -> Result<()> {
        let pkg = self.packages.get_mut(&package).ok_or_else(|| {
            StubError::InvalidArgument(format!("package {} is not in the graph", package.0))
        })?;
        pkg.files.insert(file);
        self.claims.entry(file).or_default().insert(package);
        Ok(())
    }

    fn enter_class(&mut self, entry: ClassEntry) -> Result<QualifiedNameId> {
        self.ensure_owner(entry.owner)?;
        self.seq += 1;
        let qualified_name = entry.qualified_name;
        let short = entry.name;
        let owner = entry.owner;
        let file = entry.file;
        let contribution = Contribution::from_entry(entry, self.seq);

        let id = match self.by_name.get(&qualified_name).copied() {
            Some(id) => {
                let Some(symbol) = self.slot_mut(id) else {
                    return Err(StubError::InvalidArgument(format!(
                        "class slot {} is empty",
                        id.0
                    )));
                };
                let old_supers = symbol.supers().to_vec();
                let replaced = symbol.put_contribution(contribution);
                symbol.rebuild_members();
                let new_supers = symbol.supers().to_vec();
                self.index_supers(id, &old_supers, &new_supers);
                if let Some(replaced) = replaced {
                    self.unlink_stale_owner(id, replaced.owner);
                }
                trace!(class = qualified_name.0, file = file.0, "graph.enter_class.merge");
                id
            }
            None => {
                let supers = contribution.supers.clone();
                let id = self.allocate(|id| ClassSymbol::new(id, qualified_name, short, contribution));
                self.by_name.insert(qualified_name, id);
                self.index_supers(id, &[], &supers);
                trace!(class = qualified_name.0, file = file.0, "graph.enter_class.insert");
                id
            }
        };

        self.by_file.entry(file).or_default().insert(id);
        if let Owner::Package(package) = owner {
            if let Some(pkg) = self.packages.get_mut(&package) {
                pkg.classes.insert(short, id);
            }
        }
        Ok(qualified_name)
    }

    fn set_members(&mut self, owner: Owner, file: FileId, members: Vec<QualifiedNameId>) -> Result<()> {
        self.ensure_owner(owner)?;
        let mut ids = Vec::with_capacity(members.len());
        let mut seen = BTreeSet::new();
        for name in members {
            let id = self.class_id(name).ok_or_else(|| {
                StubError::InvalidArgument(format!("member {} is not in the graph", name.0))
            })?;
            if seen.insert(id) {
                ids.push(id);
            }
        }

        match owner {
            Owner::Package(package) => {
                let linked: Vec<_> = ids
                    .iter()
                    .filter_map(|&id| self.class_by_id(id).map(|symbol| (symbol.name(), id)))
                    .collect();
                if let Some(pkg) = self.packages.get_mut(&package) {
                    pkg.classes.extend(linked);
                }
            }
            Owner::Class(class) => {
                let id = self.by_name[&class];
                let symbol = self
                    .slot_mut(id)
                    .ok_or_else(|| StubError::InvalidArgument(format!("class slot {} is empty", id.0)))?;
                let contribution = symbol.contribution_mut(file).ok_or_else(|| {
                    StubError::InvalidArgument(format!(
                        "class {} has no contribution from {file}",
                        class.0
                    ))
                })?;
                contribution.members = ids;
                symbol.rebuild_members();
            }
        }
        Ok(())
    }
}
