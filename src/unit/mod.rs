//! Declaration tree of one compilation unit, as produced by an extractor.

pub mod codec;
pub mod imports;
pub mod payload;

use crate::types::{Modifiers, QualifiedNameId, ShortNameId, StubId};

pub use imports::{Import, ImportList};

/// Where a unit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Parsed source file; carries an import list.
    Source,
    /// Compiled class file; has no import list.
    Compiled,
}

impl UnitKind {
    pub(crate) const SOURCE_TAG: u8 = 0;
    pub(crate) const COMPILED_TAG: u8 = 1;

    /// Wire tag for this kind.
    pub fn tag(self) -> u8 {
        match self {
            UnitKind::Source => Self::SOURCE_TAG,
            UnitKind::Compiled => Self::COMPILED_TAG,
        }
    }

    /// Parses a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            Self::SOURCE_TAG => Some(UnitKind::Source),
            Self::COMPILED_TAG => Some(UnitKind::Compiled),
            _ => None,
        }
    }

    /// Whether units of this kind serialize an import list.
    pub fn has_imports(self) -> bool {
        self != UnitKind::Compiled
    }
}

/// One compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    /// Package the unit declares; [`QualifiedNameId::EMPTY`] for the default package.
    pub package: QualifiedNameId,
    /// Source or compiled.
    pub kind: UnitKind,
    /// Import list; ignored for [`UnitKind::Compiled`].
    pub imports: ImportList,
    /// Top-level class declarations in source order.
    pub classes: Vec<ClassDecl>,
}

impl Unit {
    /// Creates an empty unit in `package`.
    pub fn new(package: QualifiedNameId, kind: UnitKind) -> Self {
        Self {
            package,
            kind,
            imports: ImportList::default(),
            classes: Vec::new(),
        }
    }

    /// Replaces the import list.
    pub fn with_imports(mut self, imports: ImportList) -> Self {
        self.imports = imports;
        self
    }

    /// Appends a top-level class.
    pub fn with_class(mut self, class: ClassDecl) -> Self {
        self.classes.push(class);
        self
    }
}

/// A class-like declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDecl {
    /// Back-reference into the extractor's tree.
    pub stub_id: StubId,
    /// Modifier bitmask.
    pub mods: Modifiers,
    /// Simple name.
    pub name: ShortNameId,
    /// Supertype names exactly as written, unresolved.
    pub supers: Vec<QualifiedNameId>,
    /// Nested declarations in source order.
    pub decls: Vec<Decl>,
}

impl ClassDecl {
    /// Creates a class with no supertypes or nested declarations.
    pub fn new(stub_id: StubId, mods: Modifiers, name: ShortNameId) -> Self {
        Self {
            stub_id,
            mods,
            name,
            supers: Vec::new(),
            decls: Vec::new(),
        }
    }

    /// Appends a supertype name.
    pub fn with_super(mut self, name: QualifiedNameId) -> Self {
        self.supers.push(name);
        self
    }

    /// Appends a nested declaration.
    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.decls.push(decl);
        self
    }
}

/// A nested declaration: either a class, or a non-class member (method, field
/// initializer) wrapping whatever classes were declared inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    /// Nested class.
    Class(ClassDecl),
    /// Non-class member and the declarations found in its body.
    Member(Vec<Decl>),
}

/// Per-unit context shared by every class entered from that unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitInfo {
    /// Kind of the originating unit.
    pub kind: UnitKind,
    /// Imports of the unit; empty for compiled units.
    pub imports: ImportList,
}

impl UnitInfo {
    /// Creates unit info.
    pub fn new(kind: UnitKind, imports: ImportList) -> Self {
        Self { kind, imports }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_roundtrip() {
        for kind in [UnitKind::Source, UnitKind::Compiled] {
            assert_eq!(UnitKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(UnitKind::from_tag(7), None);
        assert!(UnitKind::Source.has_imports());
        assert!(!UnitKind::Compiled.has_imports());
    }
}
