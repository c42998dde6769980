//! Performance benchmarks for tree derivations and drop resolution
//!
//! Run with: `cargo bench -p notetree-core`
//!
//! These benchmarks measure the work done on every render or drop:
//! - Nested view construction (`build_tree`)
//! - Recursive note counts on a deep chain
//! - Drop resolution plus optimistic dispatch of a reorder

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use notetree_core::dispatcher::{MutationDispatcher, RecordingPersistence};
use notetree_core::drag::{Collision, DragFrame, DragMachine, Point};
use notetree_core::models::{Folder, ItemRef, Note};
use notetree_core::resolver::DropResolver;
use notetree_core::tree::TreeModel;
use notetree_core::ExplorerConfig;
use std::sync::Arc;

/// Generate a wide tree: `folders` root folders with `notes_per_folder` notes each
fn generate_wide_tree(folders: usize, notes_per_folder: usize) -> TreeModel {
    let mut folder_list = Vec::with_capacity(folders);
    let mut note_list = Vec::with_capacity(folders * notes_per_folder);
    for f in 0..folders {
        let folder_id = format!("f{}", f);
        for n in 0..notes_per_folder {
            note_list.push(Note::new(
                format!("{}-n{}", folder_id, n),
                format!("Note {}", n),
                Some(folder_id.clone()),
                n as i64,
            ));
        }
        folder_list.push(Folder::new(folder_id, format!("Folder {}", f), None, f as i64));
    }
    TreeModel::new(folder_list, note_list)
}

/// Generate a single chain of nested folders, one note per level
fn generate_deep_tree(depth: usize) -> TreeModel {
    let folders = (0..depth)
        .map(|d| {
            let parent = (d > 0).then(|| format!("d{}", d - 1));
            Folder::new(format!("d{}", d), format!("Level {}", d), parent, 0)
        })
        .collect();
    let notes = (0..depth)
        .map(|d| Note::new(format!("dn{}", d), "Note", Some(format!("d{}", d)), 0))
        .collect();
    TreeModel::new(folders, notes)
}

fn bench_build_tree(c: &mut Criterion) {
    let tree = generate_wide_tree(50, 20);
    c.bench_function("build_tree_50x20", |b| {
        b.iter(|| black_box(tree.build_tree()))
    });
}

fn bench_recursive_count(c: &mut Criterion) {
    let tree = generate_deep_tree(100);
    c.bench_function("recursive_note_count_depth_100", |b| {
        b.iter(|| black_box(tree.recursive_note_count(black_box("d0"))))
    });
}

fn bench_resolve_and_dispatch(c: &mut Criterion) {
    let tree = generate_wide_tree(10, 100);
    let resolver = DropResolver::default();
    let frame = DragFrame::new(Point::new(0.0, 40.0))
        .with_collision(Collision::new("f0-n50"))
        .with_collision(Collision::new("f0-n51"));

    c.bench_function("resolve_and_dispatch_reorder", |b| {
        b.iter(|| {
            let dispatcher = MutationDispatcher::new(
                tree.clone(),
                Arc::new(RecordingPersistence::new()),
                &ExplorerConfig::default(),
            );
            let mut machine = DragMachine::new();
            machine.start(ItemRef::note("f0-n0"), Point::default(), None);
            let session = machine.finish(&frame).expect("session");
            let resolution = resolver.resolve(&session, &frame.collisions, &dispatcher.snapshot());
            black_box(resolution.outcome.mutation().and_then(|m| dispatcher.dispatch(m)))
        })
    });
}

criterion_group!(
    benches,
    bench_build_tree,
    bench_recursive_count,
    bench_resolve_and_dispatch
);
criterion_main!(benches);
