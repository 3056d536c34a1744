#![forbid(unsafe_code)]
//! Identifier newtypes shared by the interner, codec and symbol graph.

use std::fmt;

/// Interned handle for a single identifier segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortNameId(pub u32);

/// Interned handle for an ordered sequence of identifier segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedNameId(pub u32);

impl QualifiedNameId {
    /// The empty name, used for the default package.
    pub const EMPTY: QualifiedNameId = QualifiedNameId(0);

    /// Returns true for the empty name.
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// Caller-supplied identifier of the file a unit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Opaque back-reference into the extractor's declaration tree.
pub type StubId = i32;

/// Modifier bitmask carried through the codec untouched.
///
/// The named bits use the JVM access-flag layout; any other bit is preserved as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(pub u32);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers(0);
    /// `public`
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    /// `private`
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    /// `protected`
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    /// `static`
    pub const STATIC: Modifiers = Modifiers(0x0008);
    /// `final`
    pub const FINAL: Modifiers = Modifiers(0x0010);
    /// Interface declaration.
    pub const INTERFACE: Modifiers = Modifiers(0x0200);
    /// `abstract`
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    /// Annotation type declaration.
    pub const ANNOTATION: Modifiers = Modifiers(0x2000);
    /// Enum declaration.
    pub const ENUM: Modifiers = Modifiers(0x4000);

    /// Raw bit pattern.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true when every bit of `other` is set.
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}
