//! Byte layout of one compilation unit.
//!
//! ```text
//! unit     := qname kind:u8 [imports:varint-len blob] count:varint class*
//! class    := stub:zigzag mods:varint name:u32be count:varint qname* decls
//! decls    := count:varint (0x01 class | 0x00 decls)*
//! qname    := count:varint segment:u32be*
//! ```
//!
//! There is no version tag: bytes are only ever read by the build that wrote them.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, StubError};
use crate::graph::enter::{ClassEntry, MemberScope, Owner, StubEnter};
use crate::index::options::IndexOptions;
use crate::names::NameTable;
use crate::primitives::bytes::{buf::Cursor, ord, var};
use crate::types::{FileId, Modifiers, QualifiedNameId, ShortNameId};

use super::{ClassDecl, Decl, ImportList, Unit, UnitInfo, UnitKind};

const DECL_MEMBER: u8 = 0;
const DECL_CLASS: u8 = 1;

// stub, mods, supers count and decls count take a byte each, plus the 4-byte name
const MIN_CLASS_LEN: usize = 8;
// discriminator plus an empty member list
const MIN_DECL_LEN: usize = 2;

/// Per-file settings for a decode.
#[derive(Clone, Debug)]
pub struct DecodeContext {
    /// File the payload belongs to.
    pub file: FileId,
    /// Deepest class/member nesting accepted before the payload is deemed corrupt.
    pub max_nesting_depth: usize,
    /// Whether leftover bytes after the last class are corrupt.
    pub reject_trailing_bytes: bool,
}

impl DecodeContext {
    /// Context with default limits.
    pub fn new(file: FileId) -> Self {
        Self::with_options(file, &IndexOptions::default())
    }

    /// Context using the limits in `opts`.
    pub fn with_options(file: FileId, opts: &IndexOptions) -> Self {
        Self {
            file,
            max_nesting_depth: opts.max_nesting_depth,
            reject_trailing_bytes: opts.reject_trailing_bytes,
        }
    }
}

/// Encodes `unit`, expanding every qualified name into its segment handles.
pub fn encode(unit: &Unit, names: &NameTable) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    write_qualified_name(&mut out, names, unit.package)?;
    out.push(unit.kind.tag());
    if unit.kind.has_imports() {
        let mut blob = Vec::new();
        unit.imports.write_blob(names, &mut blob)?;
        var::encode_u64(blob.len() as u64, &mut out);
        out.extend_from_slice(&blob);
    }
    var::encode_u64(unit.classes.len() as u64, &mut out);
    for class in &unit.classes {
        write_class(&mut out, names, class)?;
    }
    Ok(out)
}

/// Decodes `bytes`, driving `enter` depth-first.
///
/// On error `enter` may have received a prefix of the callbacks; callers that need
/// all-or-nothing entry decode into a [`crate::graph::StagedEnter`].
pub fn decode<E: StubEnter>(
    bytes: &[u8],
    ctx: &DecodeContext,
    names: &NameTable,
    enter: &mut E,
) -> Result<()> {
    let mut cursor = Cursor::new(bytes);
    let package = read_qualified_name(&mut cursor, names)?;
    let owner = enter.enter_package(package)?;
    enter.claim_package(package, ctx.file)?;

    let tag = cursor.read_u8()?;
    let kind = UnitKind::from_tag(tag)
        .ok_or_else(|| StubError::corrupt(format!("unknown unit kind tag {tag}")))?;
    let imports = if kind.has_imports() {
        let len = cursor.read_len(1)?;
        ImportList::read_blob(cursor.take(len)?, names)?
    } else {
        ImportList::default()
    };

    let mut reader = UnitReader {
        cursor,
        ctx,
        names,
        enter,
        info: Arc::new(UnitInfo::new(kind, imports)),
    };
    let class_count = reader.cursor.read_len(MIN_CLASS_LEN)?;
    for _ in 0..class_count {
        reader.read_class(owner, package, 0)?;
    }
    if ctx.reject_trailing_bytes && !reader.cursor.is_exhausted() {
        return Err(StubError::corrupt(format!(
            "{} trailing bytes after last class",
            reader.cursor.remaining()
        )));
    }
    trace!(file = ctx.file.0, classes = class_count, "codec.decode.done");
    Ok(())
}

/// Writes a qualified name as its full segment-handle array.
pub(crate) fn write_qualified_name(
    out: &mut Vec<u8>,
    names: &NameTable,
    id: QualifiedNameId,
) -> Result<()> {
    let segments = names.segments_of(id).ok_or(StubError::UnknownName(id.0))?;
    var::encode_u64(segments.len() as u64, out);
    for segment in segments {
        ord::put_u32_be(out, segment.0);
    }
    Ok(())
}

/// Reads a segment-handle array and interns it.
pub(crate) fn read_qualified_name(cursor: &mut Cursor<'_>, names: &NameTable) -> Result<QualifiedNameId> {
    let count = cursor.read_len(4)?;
    let mut owner = QualifiedNameId::EMPTY;
    for _ in 0..count {
        let segment = read_short_name(cursor, names)?;
        owner = names.intern_qualified(Some(owner), segment)?;
    }
    Ok(owner)
}

fn read_short_name(cursor: &mut Cursor<'_>, names: &NameTable) -> Result<ShortNameId> {
    let id = ShortNameId(cursor.read_u32_be()?);
    if !names.contains_short(id) {
        return Err(StubError::corrupt(format!("unknown short name handle {}", id.0)));
    }
    Ok(id)
}

fn write_class(out: &mut Vec<u8>, names: &NameTable, class: &ClassDecl) -> Result<()> {
    if !names.contains_short(class.name) {
        return Err(StubError::InvalidArgument(format!(
            "class name handle {} was never interned",
            class.name.0
        )));
    }
    var::encode_i64(i64::from(class.stub_id), out);
    var::encode_u64(u64::from(class.mods.bits()), out);
    ord::put_u32_be(out, class.name.0);
    var::encode_u64(class.supers.len() as u64, out);
    for &name in &class.supers {
        write_qualified_name(out, names, name)?;
    }
    write_decls(out, names, &class.decls)
}

fn write_decls(out: &mut Vec<u8>, names: &NameTable, decls: &[Decl]) -> Result<()> {
    var::encode_u64(decls.len() as u64, out);
    for decl in decls {
        match decl {
            Decl::Class(class) => {
                out.push(DECL_CLASS);
                write_class(out, names, class)?;
            }
            Decl::Member(nested) => {
                out.push(DECL_MEMBER);
                write_decls(out, names, nested)?;
            }
        }
    }
    Ok(())
}

struct UnitReader<'a, 'b, E> {
    cursor: Cursor<'a>,
    ctx: &'b DecodeContext,
    names: &'b NameTable,
    enter: &'b mut E,
    info: Arc<UnitInfo>,
}

impl<E: StubEnter> UnitReader<'_, '_, E> {
    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.ctx.max_nesting_depth {
            return Err(StubError::corrupt(format!(
                "nesting depth {depth} exceeds limit {}",
                self.ctx.max_nesting_depth
            )));
        }
        Ok(())
    }

    fn read_class(&mut self, owner: Owner, owner_name: QualifiedNameId, depth: usize) -> Result<QualifiedNameId> {
        self.check_depth(depth)?;
        let stub_id = self.cursor.read_var_i32()?;
        let mods = Modifiers(self.cursor.read_var_u32()?);
        let name = read_short_name(&mut self.cursor, self.names)?;
        let super_count = self.cursor.read_len(1)?;
        let mut supers = Vec::with_capacity(super_count);
        for _ in 0..super_count {
            supers.push(read_qualified_name(&mut self.cursor, self.names)?);
        }

        let qualified_name = self.names.intern_qualified(Some(owner_name), name)?;
        let symbol = self.enter.enter_class(ClassEntry {
            info: Arc::clone(&self.info),
            owner,
            stub_id,
            mods,
            name,
            supers,
            qualified_name,
            file: self.ctx.file,
        })?;

        let mut members = Vec::new();
        self.read_decls(Owner::Class(symbol), symbol, depth + 1, &mut members)?;
        if !members.is_empty() {
            self.enter.set_members(Owner::Class(symbol), self.ctx.file, members)?;
        }
        Ok(symbol)
    }

    fn read_decls(
        &mut self,
        owner: Owner,
        owner_name: QualifiedNameId,
        depth: usize,
        members: &mut Vec<QualifiedNameId>,
    ) -> Result<()> {
        self.check_depth(depth)?;
        let count = self.cursor.read_len(MIN_DECL_LEN)?;
        for _ in 0..count {
            match self.cursor.read_u8()? {
                DECL_CLASS => members.push(self.read_class(owner, owner_name, depth)?),
                DECL_MEMBER => {
                    let scope = MemberScope::new(owner);
                    self.read_decls(scope.owner(), owner_name, depth + 1, members)?;
                }
                other => {
                    return Err(StubError::corrupt(format!("unknown declaration discriminator {other}")));
                }
            }
        }
        Ok(())
    }
}
