//! Dispatcher tests: optimistic application, persistence deltas, rollback

#[cfg(test)]
mod dispatcher_tests {
    use crate::config::ExplorerConfig;
    use crate::dispatcher::{
        MutationDispatcher, PersistRequest, PersistenceError, RecordingPersistence, TreeEvent,
    };
    use crate::models::{
        Folder, ItemKind, ItemRef, Note, ParentTarget, PositionUpdate, SiblingGroup, TreeSnapshot,
    };
    use crate::resolver::TreeMutation;
    use crate::tree::TreeModel;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;

    fn model() -> TreeModel {
        TreeModel::new(
            vec![
                Folder::new("f1", "Projects", None, 0),
                Folder::new("f2", "Archive", None, 1),
            ],
            vec![
                Note::new("n1", "First", Some("f1".into()), 0),
                Note::new("n2", "Second", Some("f1".into()), 1),
                Note::new("n3", "Third", Some("f2".into()), 0),
                Note::new("r1", "Loose", None, 0),
            ],
        )
    }

    fn setup(config: ExplorerConfig) -> (MutationDispatcher, RecordingPersistence) {
        let persistence = RecordingPersistence::new();
        let dispatcher = MutationDispatcher::new(model(), Arc::new(persistence.clone()), &config);
        (dispatcher, persistence)
    }

    fn reorder_n2_first() -> TreeMutation {
        TreeMutation::Reorder {
            item: ItemRef::note("n2"),
            group: SiblingGroup::new(ItemKind::Note, Some("f1".into())),
            ordered_ids: vec!["n2".into(), "n1".into()],
        }
    }

    #[tokio::test]
    async fn test_reorder_persists_whole_group_in_one_call() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        let tree = dispatcher.snapshot();
        assert_eq!(tree.note("n2").unwrap().position, 0);
        assert_eq!(tree.note("n1").unwrap().position, 1);

        dispatcher.persist(job).await.unwrap();
        assert_eq!(
            persistence.calls(),
            vec![PersistRequest::Reorder {
                kind: ItemKind::Note,
                items: vec![PositionUpdate::new("n2", 0), PositionUpdate::new("n1", 1)],
            }]
        );
    }

    #[tokio::test]
    async fn test_root_drop_persists_parent_move_with_local_position() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        let mutation = TreeMutation::MoveToRoot {
            item: ItemRef::note("n1"),
        };

        let job = dispatcher.dispatch(&mutation).unwrap();
        let tree = dispatcher.snapshot();
        let n1 = tree.note("n1").unwrap();
        assert_eq!(n1.folder_id, None);
        assert_eq!(n1.position, 1, "appended after the existing root note");

        dispatcher.persist(job).await.unwrap();
        let calls = persistence.calls();
        assert_eq!(
            calls,
            vec![PersistRequest::Move {
                id: "n1".into(),
                kind: ItemKind::Note,
                new_parent_id: None,
                position: 1,
            }]
        );

        // The stored position must not collide with the root note already at 0
        match &calls[0] {
            PersistRequest::Move { position, .. } => {
                assert_eq!(*position, n1.position);
                assert_ne!(*position, tree.note("r1").unwrap().position);
            }
            other => panic!("Expected a move, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reparent_persists_both_groups_with_moved_item_flagged() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        let mutation = TreeMutation::MoveToFolder {
            item: ItemRef::note("n1"),
            folder_id: "f2".into(),
        };

        let job = dispatcher.dispatch(&mutation).unwrap();
        dispatcher.persist(job).await.unwrap();

        let tree = dispatcher.snapshot();
        assert_eq!(tree.note("n1").unwrap().folder_id.as_deref(), Some("f2"));
        assert_eq!(tree.note("n1").unwrap().position, 1);
        assert_eq!(tree.note("n2").unwrap().position, 0);

        assert_eq!(
            persistence.calls(),
            vec![PersistRequest::Reorder {
                kind: ItemKind::Note,
                items: vec![
                    PositionUpdate::new("n2", 0),
                    PositionUpdate::new("n3", 0),
                    PositionUpdate::new("n1", 1)
                        .with_parent(ParentTarget::Folder("f2".into())),
                ],
            }]
        );
    }

    #[tokio::test]
    async fn test_events_follow_mutation_lifecycle() {
        let (dispatcher, _persistence) = setup(ExplorerConfig::default());
        let mut rx = dispatcher.subscribe();

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        dispatcher.persist(job).await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            TreeEvent::MutationApplied {
                mutation: reorder_n2_first(),
                generation: 1,
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            TreeEvent::PersistSucceeded { generation: 1 }
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_failure_rolls_back_latest_mutation() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        persistence.fail_next(PersistenceError::unavailable("offline"));
        let before = dispatcher.snapshot();
        let mut rx = dispatcher.subscribe();

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        assert_ne!(dispatcher.snapshot(), before);

        let err = dispatcher.persist(job).await.unwrap_err();
        assert_eq!(err, PersistenceError::unavailable("offline"));
        assert_eq!(dispatcher.snapshot(), before);

        let events: Vec<TreeEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            TreeEvent::PersistFailed {
                generation: 1,
                error: "Persistence backend unavailable: offline".into(),
                superseded: false,
            }
        );
        assert_eq!(events[2], TreeEvent::RolledBack { generation: 2 });
    }

    #[tokio::test]
    async fn test_superseded_failure_keeps_newer_state() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        persistence.fail_next(PersistenceError::conflict("stale"));

        let first = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        let second = dispatcher
            .dispatch(&TreeMutation::MoveToRoot {
                item: ItemRef::note("n3"),
            })
            .unwrap();
        let latest = dispatcher.snapshot();
        let mut rx = dispatcher.subscribe();

        assert!(dispatcher.persist(first).await.is_err());
        assert_eq!(dispatcher.snapshot(), latest);
        assert_eq!(
            rx.try_recv().unwrap(),
            TreeEvent::PersistFailed {
                generation: 1,
                error: "Persistence conflict: stale".into(),
                superseded: true,
            }
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        dispatcher.persist(second).await.unwrap();
        assert_eq!(persistence.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_rollback_keeps_optimistic_state() {
        let config = ExplorerConfig {
            rollback_on_failure: false,
            ..ExplorerConfig::default()
        };
        let (dispatcher, persistence) = setup(config);
        persistence.fail_next(PersistenceError::rejected("reorder", "read-only"));

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        let optimistic = dispatcher.snapshot();
        assert!(dispatcher.persist(job).await.is_err());
        assert_eq!(dispatcher.snapshot(), optimistic);
    }

    #[tokio::test]
    async fn test_resync_replaces_state_and_supersedes_jobs() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        persistence.fail_next(PersistenceError::unavailable("offline"));

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        let authoritative = TreeSnapshot::new(
            vec![Folder::new("f9", "Fresh", None, 0)],
            vec![Note::new("n9", "Fresh note", Some("f9".into()), 0)],
        );
        dispatcher.resync(authoritative.clone());
        assert_eq!(dispatcher.generation(), 2);

        assert!(dispatcher.persist(job).await.is_err());
        assert_eq!(dispatcher.snapshot().to_snapshot(), authoritative);
    }

    #[tokio::test]
    async fn test_stale_mutation_is_dropped() {
        let (dispatcher, persistence) = setup(ExplorerConfig::default());
        dispatcher.resync(TreeSnapshot::default());

        assert!(dispatcher.dispatch(&reorder_n2_first()).is_none());
        assert!(dispatcher
            .dispatch(&TreeMutation::MoveToRoot {
                item: ItemRef::note("n1")
            })
            .is_none());
        assert_eq!(persistence.call_count(), 0);
        assert_eq!(dispatcher.generation(), 1);
    }

    #[tokio::test]
    async fn test_spawned_persistence_completes_in_background() {
        let persistence = RecordingPersistence::new().with_latency(Duration::from_millis(20));
        let dispatcher = MutationDispatcher::new(
            model(),
            Arc::new(persistence.clone()),
            &ExplorerConfig::default(),
        );

        let job = dispatcher.dispatch(&reorder_n2_first()).unwrap();
        let handle = dispatcher.spawn(job);

        // Optimistic state is visible before persistence finishes
        assert_eq!(dispatcher.snapshot().note("n2").unwrap().position, 0);

        handle.await.unwrap().unwrap();
        assert_eq!(persistence.call_count(), 1);
    }
}
