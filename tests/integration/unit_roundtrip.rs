#![allow(clippy::all)]

use std::sync::Arc;

use stubgraph::{
    graph::EnterOp,
    unit::codec::{self, DecodeContext},
    ClassDecl, Decl, FileId, HierarchyIndex, Import, ImportList, Modifiers, NameTable, Owner,
    Result, ShortNameId, StagedEnter, StubError, SymbolGraph, Unit, UnitKind, UnitPayload,
};

fn local_class_unit(names: &NameTable) -> Result<Unit> {
    let local = ClassDecl::new(2, Modifiers::NONE, names.intern_short("Local")?);
    let class = ClassDecl::new(1, Modifiers::PUBLIC, names.intern_short("C")?)
        .with_super(names.intern_dotted("java.lang.Object")?)
        .with_decl(Decl::Member(vec![Decl::Class(local)]));
    let imports = ImportList::new(vec![
        Import::single(names.intern_dotted("java.util.List")?),
        Import::on_demand(names.intern_dotted("java.io")?),
    ]);
    Ok(Unit::new(names.intern_dotted("a.b")?, UnitKind::Source)
        .with_imports(imports)
        .with_class(class))
}

#[test]
fn class_inside_member_becomes_member_of_enclosing_class() -> Result<()> {
    let names = Arc::new(NameTable::new());
    let unit = local_class_unit(&names)?;
    let bytes = codec::encode(&unit, &names)?;

    let mut graph = SymbolGraph::new(Arc::clone(&names));
    codec::decode(&bytes, &DecodeContext::new(FileId(1)), &names, &mut graph)?;

    let c = names.intern_dotted("a.b.C")?;
    let local = names.intern_dotted("a.b.C.Local")?;
    let class = graph.class(c).expect("a.b.C entered");
    assert_eq!(class.stub_id(), 1);
    assert_eq!(class.mods(), Modifiers::PUBLIC);
    assert_eq!(class.supers(), &[names.intern_dotted("java.lang.Object")?]);
    assert_eq!(class.unit_info().imports.len(), 2);

    let members: Vec<_> = graph
        .members_of(c)
        .into_iter()
        .map(|m| m.qualified_name())
        .collect();
    assert_eq!(members, vec![local]);
    assert_eq!(graph.class(local).map(|l| l.owner()), Some(Owner::Class(c)));
    assert_eq!(names.display(local).as_deref(), Some("a.b.C.Local"));
    Ok(())
}

#[test]
fn callbacks_arrive_depth_first() -> Result<()> {
    let names = NameTable::new();
    let unit = local_class_unit(&names)?;
    let bytes = codec::encode(&unit, &names)?;

    let mut staged = StagedEnter::new();
    codec::decode(&bytes, &DecodeContext::new(FileId(1)), &names, &mut staged)?;
    let shape: Vec<&str> = staged
        .ops()
        .iter()
        .map(|op| match op {
            EnterOp::Package(_) => "package",
            EnterOp::Claim { .. } => "claim",
            EnterOp::Class(_) => "class",
            EnterOp::Members { .. } => "members",
        })
        .collect();
    assert_eq!(shape, vec!["package", "claim", "class", "class", "members"]);
    assert_eq!(staged.class_count(), 2);
    Ok(())
}

#[test]
fn truncated_class_count_leaves_graph_untouched() -> Result<()> {
    let index = HierarchyIndex::default();
    let names = index.names();
    let unit = Unit::new(names.intern_dotted("p")?, UnitKind::Compiled)
        .with_class(ClassDecl::new(0, Modifiers::NONE, names.intern_short("A")?))
        .with_class(ClassDecl::new(1, Modifiers::NONE, names.intern_short("B")?));
    let mut bytes = codec::encode(&unit, names)?;
    // promise three classes, deliver two
    let count_at = bytes.len() - 2 * 8 - 1;
    assert_eq!(bytes[count_at], 2);
    bytes[count_at] = 3;

    let err = index
        .reindex_payload(FileId(5), UnitPayload::from_bytes(bytes))
        .unwrap_err();
    assert!(matches!(err, StubError::CorruptPayload(_)), "{err}");
    let graph = index.graph();
    assert_eq!(graph.class_count(), 0);
    assert_eq!(graph.package_count(), 1);
    assert_eq!(index.metrics_snapshot().corrupt_units, 1);
    Ok(())
}

#[test]
fn compiled_units_carry_no_imports() -> Result<()> {
    let names = NameTable::new();
    let class = ClassDecl::new(-1, Modifiers::INTERFACE | Modifiers::ABSTRACT, names.intern_short("Api")?);
    let unit = Unit::new(names.intern_dotted("lib")?, UnitKind::Compiled).with_class(class);
    let bytes = codec::encode(&unit, &names)?;

    let mut staged = StagedEnter::new();
    codec::decode(&bytes, &DecodeContext::new(FileId(2)), &names, &mut staged)?;
    let entry = staged
        .ops()
        .iter()
        .find_map(|op| match op {
            EnterOp::Class(entry) => Some(entry),
            _ => None,
        })
        .expect("one class");
    assert_eq!(entry.stub_id, -1);
    assert!(entry.mods.contains(Modifiers::INTERFACE));
    assert_eq!(entry.info.kind, UnitKind::Compiled);
    assert!(entry.info.imports.is_empty());
    Ok(())
}

#[test]
fn payload_equality_follows_bytes() -> Result<()> {
    let names = NameTable::new();
    let unit = local_class_unit(&names)?;
    let a = UnitPayload::from_unit(&unit, &names)?;
    let b = UnitPayload::from_unit(&unit, &names)?;
    assert_eq!(a, b);
    assert_eq!(a.hash_approx(), b.hash_approx());

    let other = unit.with_class(ClassDecl::new(9, Modifiers::NONE, names.intern_short("D")?));
    let c = UnitPayload::from_unit(&other, &names)?;
    assert_ne!(a, c);
    Ok(())
}

#[test]
fn encode_refuses_aliases_its_decoder_would_reject() -> Result<()> {
    let names = NameTable::new();
    let list = names.intern_dotted("java.util.List")?;
    let imports = ImportList::new(vec![Import::single(list).with_alias(ShortNameId(999))]);
    let unit = Unit::new(names.intern_dotted("p")?, UnitKind::Source).with_imports(imports);
    assert!(matches!(codec::encode(&unit, &names), Err(StubError::InvalidArgument(_))));

    let alias = names.intern_short("JList")?;
    let imports = ImportList::new(vec![Import::single(list).with_alias(alias)]);
    let unit = Unit::new(names.intern_dotted("p")?, UnitKind::Source).with_imports(imports);
    let bytes = codec::encode(&unit, &names)?;
    let mut staged = StagedEnter::new();
    codec::decode(&bytes, &DecodeContext::new(FileId(1)), &names, &mut staged)?;
    Ok(())
}
