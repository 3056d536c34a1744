#![allow(clippy::all)]

use std::sync::{Arc, Once};

use stubgraph::{
    ClassDecl, Decl, FileId, HierarchyIndex, IndexOptions, MemoryPayloadCache, Modifiers,
    NameTable, QualifiedNameId, ReindexOutcome, Result, Unit, UnitKind,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stubgraph=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

/// `package pkg; class outer { class nested; }` with the given stub id and mods.
fn partial_class(
    names: &NameTable,
    pkg: &str,
    outer: &str,
    nested: &[&str],
    stub_id: i32,
    mods: Modifiers,
) -> Result<Unit> {
    let mut class = ClassDecl::new(stub_id, mods, names.intern_short(outer)?);
    for (offset, name) in nested.iter().enumerate() {
        let inner = ClassDecl::new(stub_id + 1 + offset as i32, Modifiers::NONE, names.intern_short(name)?);
        class = class.with_decl(Decl::Class(inner));
    }
    Ok(Unit::new(names.intern_dotted(pkg)?, UnitKind::Source).with_class(class))
}

fn member_names(index: &HierarchyIndex, class: QualifiedNameId) -> Vec<String> {
    let graph = index.graph();
    graph
        .members_of(class)
        .into_iter()
        .filter_map(|m| index.names().display(m.qualified_name()))
        .collect()
}

#[test]
fn unchanged_reindex_skips_entry() -> Result<()> {
    init_tracing();
    let index = HierarchyIndex::default();
    let unit = partial_class(index.names(), "p", "A", &["B"], 0, Modifiers::PUBLIC)?;

    index.reindex_unit(FileId(1), &unit)?;
    let before = index.metrics_snapshot();
    assert_eq!(index.reindex_unit(FileId(1), &unit)?, ReindexOutcome::Unchanged);
    let after = index.metrics_snapshot();
    assert_eq!(after.units_entered, before.units_entered);
    assert_eq!(after.classes_entered, 2);
    assert_eq!(after.units_skipped, 1);
    Ok(())
}

#[test]
fn shared_class_merges_latest_attributes_and_member_union() -> Result<()> {
    init_tracing();
    let index = HierarchyIndex::default();
    let names = index.names();
    index.reindex_unit(
        FileId(1),
        &partial_class(names, "p", "C", &["X"], 10, Modifiers::PUBLIC)?,
    )?;
    index.reindex_unit(
        FileId(2),
        &partial_class(names, "p", "C", &["Y"], 20, Modifiers::FINAL)?,
    )?;

    let c = names.intern_dotted("p.C")?;
    {
        let graph = index.graph();
        let class = graph.class(c).expect("p.C");
        assert_eq!(class.stub_id(), 20);
        assert_eq!(class.mods(), Modifiers::FINAL);
        assert_eq!(class.files().count(), 2);
    }
    assert_eq!(member_names(&index, c), vec!["p.C.X", "p.C.Y"]);

    // re-entering file 1 makes it the latest contributor
    index.reindex_unit(
        FileId(1),
        &partial_class(names, "p", "C", &["X", "Z"], 30, Modifiers::ABSTRACT)?,
    )?;
    let graph = index.graph();
    assert_eq!(graph.class(c).map(|class| class.stub_id()), Some(30));
    drop(graph);
    assert_eq!(member_names(&index, c), vec!["p.C.Y", "p.C.X", "p.C.Z"]);
    Ok(())
}

#[test]
fn retraction_removes_everything_a_file_added() -> Result<()> {
    init_tracing();
    let index = HierarchyIndex::default();
    let names = index.names();
    let object = names.intern_dotted("java.lang.Object")?;
    let class = ClassDecl::new(0, Modifiers::PUBLIC, names.intern_short("Deep")?)
        .with_super(object)
        .with_decl(Decl::Member(vec![Decl::Class(ClassDecl::new(
            1,
            Modifiers::NONE,
            names.intern_short("Anon")?,
        ))]));
    let unit = Unit::new(names.intern_dotted("x.y.z")?, UnitKind::Source).with_class(class);
    let keep = partial_class(names, "x", "Keep", &[], 5, Modifiers::NONE)?;

    index.reindex_unit(FileId(1), &unit)?;
    index.reindex_unit(FileId(2), &keep)?;
    assert_eq!(index.graph().class_count(), 3);

    let stats = index.remove_file(FileId(1));
    assert_eq!(stats.classes_removed, 2);
    assert_eq!(stats.packages_removed, 2, "x.y.z and x.y are pruned, x survives");

    let graph = index.graph();
    assert_eq!(graph.class_count(), 1);
    assert!(graph.classes_naming_super(object).is_empty());
    assert!(graph.classes_from_file(FileId(1)).is_empty());
    assert!(graph.package(names.intern_dotted("x.y")?).is_none());
    assert!(graph.package(names.intern_dotted("x")?).is_some());
    assert_eq!(graph.file_count(), 1);
    Ok(())
}

#[test]
fn supertype_query_matches_written_names() -> Result<()> {
    let index = HierarchyIndex::new(IndexOptions::default().max_nesting_depth(4));
    let names = index.names();
    let list = names.intern_dotted("List")?;
    let qualified_list = names.intern_dotted("java.util.List")?;
    let class = ClassDecl::new(0, Modifiers::NONE, names.intern_short("MyList")?).with_super(list);
    index.reindex_unit(
        FileId(1),
        &Unit::new(names.intern_dotted("app")?, UnitKind::Source).with_class(class),
    )?;

    let graph = index.graph();
    assert_eq!(graph.classes_naming_super(list).len(), 1);
    assert!(graph.classes_naming_super(qualified_list).is_empty());
    Ok(())
}

#[test]
fn nesting_beyond_limit_is_corrupt() -> Result<()> {
    let index = HierarchyIndex::new(IndexOptions::default().max_nesting_depth(2));
    let names = index.names();
    let mut class = ClassDecl::new(3, Modifiers::NONE, names.intern_short("L3")?);
    for (stub, name) in [(2, "L2"), (1, "L1"), (0, "L0")] {
        class = ClassDecl::new(stub, Modifiers::NONE, names.intern_short(name)?)
            .with_decl(Decl::Class(class));
    }
    let unit = Unit::new(QualifiedNameId::EMPTY, UnitKind::Compiled).with_class(class);
    let err = index.reindex_unit(FileId(1), &unit).unwrap_err();
    assert!(err.is_corrupt_payload());
    assert_eq!(index.graph().class_count(), 0);
    Ok(())
}

#[test]
fn classless_unit_packages_are_pruned_on_removal() -> Result<()> {
    init_tracing();
    let index = HierarchyIndex::default();
    let ab = index.names().intern_dotted("a.b")?;
    index.reindex_unit(FileId(1), &Unit::new(ab, UnitKind::Source))?;
    assert!(index.graph().package(ab).is_some());
    assert_eq!(index.graph().package_count(), 3);

    let stats = index.remove_file(FileId(1));
    assert_eq!(stats.packages_removed, 2);
    assert_eq!(stats.classes_removed, 0);
    let graph = index.graph();
    assert_eq!(graph.package_count(), 1);
    assert!(graph.subpackages(QualifiedNameId::EMPTY).is_empty());
    Ok(())
}

#[test]
fn moving_a_unit_to_another_package_drops_the_old_one() -> Result<()> {
    let index = HierarchyIndex::default();
    let names = index.names();
    index.reindex_unit(FileId(1), &Unit::new(names.intern_dotted("old.pkg")?, UnitKind::Source))?;
    index.reindex_unit(FileId(1), &partial_class(names, "new", "A", &[], 0, Modifiers::NONE)?)?;

    let graph = index.graph();
    assert!(graph.package(names.intern_dotted("old")?).is_none());
    assert!(graph.package(names.intern_dotted("new")?).is_some());
    assert_eq!(graph.package_count(), 2);
    Ok(())
}

#[test]
fn cached_payloads_replay_under_restored_short_names() -> Result<()> {
    init_tracing();
    let cache = Arc::new(MemoryPayloadCache::new());
    let first = HierarchyIndex::with_cache(IndexOptions::default(), cache.clone());
    let unit = partial_class(first.names(), "a", "A", &[], 0, Modifiers::PUBLIC)?;
    first.reindex_unit(FileId(1), &unit)?;
    let exported: Vec<String> = first.names().short_names().iter().map(|s| s.to_string()).collect();
    drop(first);

    let names = Arc::new(NameTable::from_short_names(&exported)?);
    // interning in the opposite order must not shift the restored handles
    names.intern_short("A")?;
    names.intern_short("a")?;
    let second = HierarchyIndex::with_names(IndexOptions::default(), names, cache);
    assert!(second.enter_cached(FileId(1))?.is_some());

    let graph = second.graph();
    let entered: Vec<String> = graph
        .classes()
        .filter_map(|class| second.names().display(class.qualified_name()))
        .collect();
    assert_eq!(entered, vec!["a.A".to_string()]);
    drop(graph);

    // a fresh scan of the same unit is recognised as unchanged
    let rescanned = partial_class(second.names(), "a", "A", &[], 0, Modifiers::PUBLIC)?;
    assert_eq!(second.reindex_unit(FileId(1), &rescanned)?, ReindexOutcome::Unchanged);
    Ok(())
}
