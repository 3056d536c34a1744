//! Entry points the unit decoder drives while walking a payload.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{FileId, Modifiers, QualifiedNameId, ShortNameId, StubId};
use crate::unit::UnitInfo;

/// Something a class can be declared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Top-level class in a package.
    Package(QualifiedNameId),
    /// Nested class.
    Class(QualifiedNameId),
}

impl Owner {
    /// Qualified name of the owner.
    pub fn qualified_name(self) -> QualifiedNameId {
        match self {
            Owner::Package(name) | Owner::Class(name) => name,
        }
    }
}

/// Stand-in owner for classes declared inside a non-class member.
///
/// Never stored: classes found under it are qualified by and attached to the owner it
/// forwards to.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MemberScope {
    forward_to: Owner,
}

impl MemberScope {
    pub(crate) fn new(forward_to: Owner) -> Self {
        Self { forward_to }
    }

    pub(crate) fn owner(self) -> Owner {
        self.forward_to
    }
}

/// Everything known about one class declaration at entry time.
#[derive(Clone, Debug)]
pub struct ClassEntry {
    /// Context of the unit the class came from.
    pub info: Arc<UnitInfo>,
    /// Declaring package or class.
    pub owner: Owner,
    /// Back-reference into the extractor's declaration tree.
    pub stub_id: StubId,
    /// Modifier bits as written.
    pub mods: Modifiers,
    /// Simple name.
    pub name: ShortNameId,
    /// Supertype names as written.
    pub supers: Vec<QualifiedNameId>,
    /// `owner.qualified_name() + "." + name`
    pub qualified_name: QualifiedNameId,
    /// File the declaration came from.
    pub file: FileId,
}

/// Receiver of decode callbacks.
///
/// Classes are always entered before their nested declarations are walked, and
/// `set_members` for a class follows every `enter_class` beneath it.
pub trait StubEnter {
    /// Returns the package named `name`, creating it and its ancestors if needed.
    fn enter_package(&mut self, name: QualifiedNameId) -> Result<Owner>;

    /// Records that `file` declares `package`, so the package outlives its classes
    /// until `file` is retracted.
    fn claim_package(&mut self, package: QualifiedNameId, file: FileId) -> Result<()>;

    /// Creates or merges a class and returns its qualified name.
    fn enter_class(&mut self, entry: ClassEntry) -> Result<QualifiedNameId>;

    /// Replaces `file`'s member contribution for `owner`.
    fn set_members(&mut self, owner: Owner, file: FileId, members: Vec<QualifiedNameId>) -> Result<()>;
}

/// One recorded callback.
#[derive(Clone, Debug)]
pub enum EnterOp {
    /// [`StubEnter::enter_package`]
    Package(QualifiedNameId),
    /// [`StubEnter::claim_package`]
    Claim {
        /// Declared package.
        package: QualifiedNameId,
        /// Declaring file.
        file: FileId,
    },
    /// [`StubEnter::enter_class`]
    Class(ClassEntry),
    /// [`StubEnter::set_members`]
    Members {
        /// Class or package receiving the members.
        owner: Owner,
        /// File the member list comes from.
        file: FileId,
        /// Member classes in declaration order.
        members: Vec<QualifiedNameId>,
    },
}

/// Records callbacks without touching a graph.
///
/// A unit is decoded into a `StagedEnter` first and published with
/// [`super::SymbolGraph::apply`] only once the whole payload decoded cleanly.
#[derive(Debug, Default)]
pub struct StagedEnter {
    ops: Vec<EnterOp>,
    classes: usize,
}

impl StagedEnter {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes recorded.
    pub fn class_count(&self) -> usize {
        self.classes
    }

    /// Recorded callbacks in call order.
    pub fn ops(&self) -> &[EnterOp] {
        &self.ops
    }

    /// Returns true when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<EnterOp> {
        self.ops
    }
}

impl StubEnter for StagedEnter {
    fn enter_package(&mut self, name: QualifiedNameId) -> Result<Owner> {
        self.ops.push(EnterOp::Package(name));
        Ok(Owner::Package(name))
    }

    fn claim_package(&mut self, package: QualifiedNameId, file: FileId) -> Result<()> {
        self.ops.push(EnterOp::Claim { package, file });
        Ok(())
    }

    fn enter_class(&mut self, entry: ClassEntry) -> Result<QualifiedNameId> {
        let name = entry.qualified_name;
        self.classes += 1;
        self.ops.push(EnterOp::Class(entry));
        Ok(name)
    }

    fn set_members(&mut self, owner: Owner, file: FileId, members: Vec<QualifiedNameId>) -> Result<()> {
        self.ops.push(EnterOp::Members {
            owner,
            file,
            members,
        });
        Ok(())
    }
}
