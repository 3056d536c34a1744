#![allow(clippy::all)]

use std::sync::Arc;
use std::thread;

use stubgraph::{
    ClassDecl, FileId, HierarchyIndex, IndexOptions, Modifiers, ReindexOutcome, Result, Unit,
    UnitKind,
};

const THREADS: u32 = 8;
const FILES_PER_THREAD: u32 = 25;

fn unit_for(index: &HierarchyIndex, file: u32) -> Result<Unit> {
    let names = index.names();
    let package = names.intern_dotted(&format!("pkg{}.sub", file % 4))?;
    let class = ClassDecl::new(file as i32, Modifiers::PUBLIC, names.intern_short(&format!("C{file}"))?)
        .with_super(names.intern_dotted("java.lang.Object")?);
    Ok(Unit::new(package, UnitKind::Source).with_class(class))
}

#[test]
fn threads_reindex_disjoint_files() -> Result<()> {
    let index = Arc::new(HierarchyIndex::default());
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || -> Result<()> {
            for i in 0..FILES_PER_THREAD {
                let file = t * FILES_PER_THREAD + i;
                let unit = unit_for(&index, file)?;
                index.reindex_unit(FileId(file), &unit)?;
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    let total = (THREADS * FILES_PER_THREAD) as usize;
    let object = index.names().intern_dotted("java.lang.Object")?;
    let graph = index.graph();
    assert_eq!(graph.class_count(), total);
    assert_eq!(graph.file_count(), total);
    assert_eq!(graph.classes_naming_super(object).len(), total);
    // root + four pkgN + four pkgN.sub
    assert_eq!(graph.package_count(), 9);
    assert_eq!(index.metrics_snapshot().units_entered, total as u64);
    Ok(())
}

#[test]
fn parallel_batch_matches_serial_reindex() -> Result<()> {
    let parallel = HierarchyIndex::new(IndexOptions::default().parallel_encode_threshold(1));
    let serial = HierarchyIndex::new(IndexOptions::default().parallel_encode_threshold(usize::MAX));

    for index in [&parallel, &serial] {
        let batch = (0..40)
            .map(|file| -> Result<(FileId, Unit)> { Ok((FileId(file), unit_for(index, file)?)) })
            .collect::<Result<Vec<_>>>()?;
        let results = index.reindex_batch(batch);
        for (file, outcome) in results {
            assert!(
                matches!(outcome, Ok(ReindexOutcome::Entered { classes: 1, .. })),
                "{file}: {outcome:?}"
            );
        }
    }

    let p = parallel.graph();
    let s = serial.graph();
    assert_eq!(p.class_count(), s.class_count());
    assert_eq!(p.package_count(), s.package_count());
    Ok(())
}
