//! Import lists and their opaque blob encoding.
//!
//! The unit codec only length-prefixes the blob; everything inside is owned here.

use crate::error::{Result, StubError};
use crate::names::NameTable;
use crate::primitives::bytes::{buf::Cursor, ord, var};
use crate::types::{QualifiedNameId, ShortNameId};

use super::codec::{read_qualified_name, write_qualified_name};

const FLAG_STATIC: u8 = 0x1;
const FLAG_ON_DEMAND: u8 = 0x2;
const FLAG_ALIAS: u8 = 0x4;
const KNOWN_FLAGS: u8 = FLAG_STATIC | FLAG_ON_DEMAND | FLAG_ALIAS;

/// One import statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Import {
    /// Imported name; for on-demand imports, the container being opened.
    pub name: QualifiedNameId,
    /// `import static`
    pub is_static: bool,
    /// `import a.b.*`
    pub on_demand: bool,
    /// Local alias (`import a.B as C`), if any.
    pub alias: Option<ShortNameId>,
}

impl Import {
    /// Single-type import.
    pub fn single(name: QualifiedNameId) -> Self {
        Self {
            name,
            is_static: false,
            on_demand: false,
            alias: None,
        }
    }

    /// On-demand import of every member of `container`.
    pub fn on_demand(container: QualifiedNameId) -> Self {
        Self {
            on_demand: true,
            ..Self::single(container)
        }
    }

    /// Marks the import static.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Attaches an alias.
    pub fn with_alias(mut self, alias: ShortNameId) -> Self {
        self.alias = Some(alias);
        self
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_static {
            flags |= FLAG_STATIC;
        }
        if self.on_demand {
            flags |= FLAG_ON_DEMAND;
        }
        if self.alias.is_some() {
            flags |= FLAG_ALIAS;
        }
        flags
    }
}

/// Ordered import list of a source unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportList(pub Vec<Import>);

impl ImportList {
    /// Creates an import list.
    pub fn new(imports: Vec<Import>) -> Self {
        Self(imports)
    }

    /// Number of imports.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the unit imports nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Imports in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Import> {
        self.0.iter()
    }

    /// Containers opened by non-static on-demand imports, in declaration order.
    pub fn on_demand_containers(&self) -> impl Iterator<Item = QualifiedNameId> + '_ {
        self.0
            .iter()
            .filter(|import| import.on_demand && !import.is_static)
            .map(|import| import.name)
    }

    /// Appends the blob body (without the outer length prefix).
    pub fn write_blob(&self, names: &NameTable, out: &mut Vec<u8>) -> Result<()> {
        var::encode_u64(self.0.len() as u64, out);
        for import in &self.0 {
            out.push(import.flags());
            write_qualified_name(out, names, import.name)?;
            if let Some(alias) = import.alias {
                if !names.contains_short(alias) {
                    return Err(StubError::InvalidArgument(format!(
                        "import alias handle {} was never interned",
                        alias.0
                    )));
                }
                ord::put_u32_be(out, alias.0);
            }
        }
        Ok(())
    }

    /// Parses a blob body produced by [`ImportList::write_blob`].
    pub fn read_blob(blob: &[u8], names: &NameTable) -> Result<Self> {
        let mut cursor = Cursor::new(blob);
        // flags byte plus at least a one-byte name length
        let count = cursor.read_len(2)?;
        let mut imports = Vec::with_capacity(count);
        for _ in 0..count {
            let flags = cursor.read_u8()?;
            if flags & !KNOWN_FLAGS != 0 {
                return Err(StubError::corrupt(format!("unknown import flags 0x{flags:02X}")));
            }
            let name = read_qualified_name(&mut cursor, names)?;
            let alias = if flags & FLAG_ALIAS != 0 {
                let raw = ShortNameId(cursor.read_u32_be()?);
                if !names.contains_short(raw) {
                    return Err(StubError::corrupt(format!("unknown alias handle {}", raw.0)));
                }
                Some(raw)
            } else {
                None
            };
            imports.push(Import {
                name,
                is_static: flags & FLAG_STATIC != 0,
                on_demand: flags & FLAG_ON_DEMAND != 0,
                alias,
            });
        }
        if !cursor.is_exhausted() {
            return Err(StubError::corrupt("trailing bytes in import blob"));
        }
        Ok(Self(imports))
    }
}
