//! Drag and Drop Scenario Tests
//!
//! End-to-end drags through the FileExplorer: pointer events in, optimistic
//! tree and persistence calls out.

#[cfg(test)]
mod drag_drop_scenario_tests {
    use anyhow::Result;
    use notetree_core::{
        Collision, DragEvent, DragFrame, DropBranch, FileExplorer, Folder, ItemKind, NoOpReason,
        Note, PersistRequest, Point, PositionUpdate, Rect, RecordingPersistence, TreeModel,
        TreeSnapshot,
    };
    use std::collections::HashSet;
    use std::sync::Arc;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    fn explorer_with(snapshot: TreeSnapshot) -> (FileExplorer, RecordingPersistence) {
        init_tracing();
        let persistence = RecordingPersistence::new();
        let explorer = FileExplorer::with_defaults(snapshot, Arc::new(persistence.clone()));
        (explorer, persistence)
    }

    fn root_zone() -> Rect {
        Rect::new(0.0, 500.0, 240.0, 60.0)
    }

    fn assert_acyclic(tree: &TreeModel) {
        for folder in tree.folders() {
            assert!(
                !tree.is_descendant_of(&folder.id, &folder.id),
                "folder {} is its own ancestor",
                folder.id
            );
            let mut seen = HashSet::new();
            let mut current = Some(folder.id.as_str());
            while let Some(id) = current {
                assert!(seen.insert(id.to_string()), "cycle through {}", id);
                current = tree.folder(id).and_then(|f| f.parent_id.as_deref());
            }
        }
    }

    #[tokio::test]
    async fn test_folder_onto_own_child_is_rejected() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![
                Folder::new("root", "Root", None, 0),
                Folder::new("child", "Child", Some("root".into()), 0),
            ],
            vec![],
        );
        let (mut explorer, persistence) = explorer_with(snapshot);
        let before = explorer.tree();

        explorer.drag_start("root", Point::new(10.0, 10.0), None)?;
        let frame = DragFrame::new(Point::new(0.0, 30.0))
            .with_collision(Collision::new("folder-drop:child"));
        let end = explorer.drag_end(&frame).expect("drag was active");

        assert_eq!(
            end.resolution.outcome.mutation(),
            None,
            "reparent onto a descendant must not mutate"
        );
        assert!(matches!(
            end.resolution.outcome,
            notetree_core::DropOutcome::NoOp {
                reason: NoOpReason::WouldCreateCycle
            }
        ));
        assert!(end.is_no_op());
        assert_eq!(explorer.tree(), before);
        assert_eq!(persistence.call_count(), 0);
        assert_eq!(explorer.last_outcome(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_sibling_reorder_assigns_dense_positions() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![Folder::new("f1", "Folder", None, 0)],
            vec![
                Note::new("n1", "One", Some("f1".into()), 0),
                Note::new("n2", "Two", Some("f1".into()), 1),
            ],
        );
        let (mut explorer, persistence) = explorer_with(snapshot);

        explorer.drag_start("n2", Point::new(10.0, 40.0), None)?;
        let end = explorer
            .drag_end(&DragFrame::new(Point::new(0.0, -30.0)).with_collision(Collision::new("n1")))
            .expect("drag was active");
        assert_eq!(explorer.last_outcome(), Some(DropBranch::Reordering));

        let tree = explorer.tree();
        assert_eq!(tree.note("n2").map(|n| n.position), Some(0));
        assert_eq!(tree.note("n1").map(|n| n.position), Some(1));

        explorer
            .dispatcher()
            .persist(end.job.expect("reorder produces a job"))
            .await?;
        assert_eq!(
            persistence.calls(),
            vec![PersistRequest::Reorder {
                kind: ItemKind::Note,
                items: vec![PositionUpdate::new("n2", 0), PositionUpdate::new("n1", 1)],
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_note_dropped_on_root_zone_leaves_folder() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![Folder::new("f1", "Folder", None, 0)],
            vec![Note::new("n1", "One", Some("f1".into()), 0)],
        );
        let (mut explorer, persistence) = explorer_with(snapshot);

        explorer.handle(DragEvent::Start {
            active_id: "n1".into(),
            pointer: Point::new(20.0, 100.0),
            rect: None,
        })?;
        // Collisions with list items must lose to the root zone
        let frame = DragFrame::new(Point::new(0.0, 420.0))
            .with_root_zone(root_zone())
            .with_collision(Collision::new("folder-drop:f1"));
        explorer.handle(DragEvent::Move(frame.clone()))?;
        assert_eq!(
            explorer.session().and_then(|s| s.hint.clone()),
            Some("root-drop-zone".to_string())
        );

        let end = explorer
            .handle(DragEvent::End(frame))?
            .expect("drag was active");
        assert_eq!(end.resolution.branch(), Some(DropBranch::RootDrop));
        assert_eq!(explorer.tree().note("n1").and_then(|n| n.folder_id.clone()), None);

        explorer.dispatcher().persist(end.job.expect("job")).await?;
        assert_eq!(
            persistence.calls(),
            vec![PersistRequest::Move {
                id: "n1".into(),
                kind: ItemKind::Note,
                new_parent_id: None,
                position: 0,
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_root_promotion_is_idempotent() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![Folder::new("f1", "Folder", None, 0)],
            vec![Note::new("n1", "One", Some("f1".into()), 0)],
        );
        let (mut explorer, persistence) = explorer_with(snapshot);
        let frame = DragFrame::new(Point::new(0.0, 420.0)).with_root_zone(root_zone());

        explorer.drag_start("n1", Point::new(20.0, 100.0), None)?;
        assert!(explorer.drag_end(&frame).and_then(|end| end.job).is_some());
        let promoted = explorer.tree();

        explorer.drag_start("n1", Point::new(20.0, 100.0), None)?;
        let second = explorer.drag_end(&frame).expect("drag was active");
        assert!(matches!(
            second.resolution.outcome,
            notetree_core::DropOutcome::NoOp {
                reason: NoOpReason::AlreadyAtRoot
            }
        ));
        assert_eq!(explorer.tree(), promoted);
        assert_eq!(persistence.call_count(), 0, "jobs were never run");
        Ok(())
    }

    #[tokio::test]
    async fn test_nested_note_onto_root_note_moves_to_root() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![Folder::new("f1", "Folder", None, 0)],
            vec![
                Note::new("n1", "Nested", Some("f1".into()), 0),
                Note::new("r1", "Loose", None, 0),
                Note::new("r2", "Loose too", None, 1),
            ],
        );
        let (mut explorer, _) = explorer_with(snapshot);

        explorer.drag_start("n1", Point::default(), None)?;
        let end = explorer
            .drag_end(&DragFrame::default().with_collision(Collision::new("r1")))
            .expect("drag was active");

        assert_eq!(end.resolution.branch(), Some(DropBranch::RootDrop));
        let n1 = explorer.tree().note("n1").cloned().expect("n1");
        assert_eq!(n1.folder_id, None);
        assert_eq!(n1.position, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_makes_no_persistence_calls() -> Result<()> {
        let snapshot = TreeSnapshot::new(
            vec![
                Folder::new("f1", "A", None, 0),
                Folder::new("f2", "B", None, 1),
            ],
            vec![Note::new("n1", "One", Some("f1".into()), 0)],
        );
        let (mut explorer, persistence) = explorer_with(snapshot);
        let before = explorer.tree();

        explorer.handle(DragEvent::Start {
            active_id: "n1".into(),
            pointer: Point::default(),
            rect: None,
        })?;
        explorer.handle(DragEvent::Move(
            DragFrame::default().with_collision(Collision::new("folder-drop:f2")),
        ))?;
        explorer.handle(DragEvent::Cancel)?;
        assert!(explorer
            .handle(DragEvent::End(DragFrame::default()))?
            .is_none());

        assert_eq!(explorer.tree(), before);
        assert_eq!(persistence.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_random_drag_sequence_keeps_tree_valid() -> Result<()> {
        let folders = vec![
            Folder::new("a", "A", None, 0),
            Folder::new("b", "B", Some("a".into()), 0),
            Folder::new("c", "C", Some("b".into()), 0),
            Folder::new("d", "D", None, 1),
        ];
        let notes = vec![
            Note::new("n1", "1", Some("a".into()), 0),
            Note::new("n2", "2", Some("b".into()), 0),
            Note::new("n3", "3", Some("c".into()), 0),
            Note::new("n4", "4", None, 0),
        ];
        let (mut explorer, _) = explorer_with(TreeSnapshot::new(folders, notes));
        let note_ids: HashSet<String> = explorer.tree().notes().iter().map(|n| n.id.clone()).collect();

        let drags = [
            ("a", "folder-drop:c"),
            ("c", "folder-drop:d"),
            ("d", "folder-drop:c"),
            ("b", "folder-drop:b"),
            ("n3", "n4"),
            ("a", "d"),
            ("n2", "folder-drop:a"),
            ("n1", "n2"),
            ("b", "folder-drop:d"),
            ("d", "folder-drop:b"),
        ];
        for (active, target) in drags {
            explorer.drag_start(active, Point::default(), None)?;
            explorer.drag_end(&DragFrame::default().with_collision(Collision::new(target)));

            let tree = explorer.tree();
            assert_acyclic(&tree);
            let ids: HashSet<String> = tree.notes().iter().map(|n| n.id.clone()).collect();
            assert_eq!(ids, note_ids, "drags never add or lose notes");
            for folder in std::iter::once(None).chain(tree.folders().iter().map(|f| Some(f.id.as_str()))) {
                let positions: Vec<i64> =
                    tree.child_notes_of(folder).into_iter().map(|n| n.position).collect();
                let mut sorted = positions.clone();
                sorted.sort_unstable();
                sorted.dedup();
                assert_eq!(sorted.len(), positions.len(), "positions unique within a group");
            }
        }
        Ok(())
    }
}
