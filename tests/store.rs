#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use std::sync::Arc;
    use taskpin::api::memory::{MemoryBackend, Operation};
    use taskpin::api::{DeleteOutcome, RemoteError};
    use taskpin::libs::sync::{SyncPhase, TaskError, TaskStore};
    use taskpin::libs::task::{Groups, Task, TaskChanges, TaskDraft, TaskId, UserId};
    use test_context::{test_context, AsyncTestContext};

    struct StoreContext {
        backend: Arc<MemoryBackend>,
        store: Arc<TaskStore<MemoryBackend>>,
        owner: UserId,
    }

    impl AsyncTestContext for StoreContext {
        async fn setup() -> Self {
            let backend = Arc::new(MemoryBackend::with_user("ada@example.com", "secret", "Ada"));
            let owner = backend.session_user().unwrap().id;
            let store = Arc::new(TaskStore::new(Arc::clone(&backend), Groups::default()));
            StoreContext { backend, store, owner }
        }
    }

    impl StoreContext {
        fn seed(&self, id: &str, featured: bool, order: Option<i64>, minutes: i64) -> TaskId {
            let task = Task {
                id: TaskId::new(id),
                title: format!("Task {}", id),
                description: String::new(),
                group: "Work".to_string(),
                date: date(),
                completed: false,
                completed_at: None,
                featured,
                created_at: created(minutes),
                user_id: self.owner.clone(),
                order,
            };
            self.backend.seed(task);
            TaskId::new(id)
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn created(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn ids(tasks: &[Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    fn draft(title: &str, featured: bool) -> TaskDraft {
        TaskDraft::new(title, "Work", date()).featured(featured)
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_initialize_loads_sorted_partitions(ctx: &mut StoreContext) {
        ctx.seed("h2", true, Some(1), 0);
        ctx.seed("h1", true, Some(0), 5);
        ctx.seed("b-old", false, None, 0);
        ctx.seed("b-new", false, None, 10);

        assert_eq!(ctx.store.phase(), SyncPhase::Uninitialized);
        ctx.store.initialize().await.unwrap();

        assert_eq!(ids(&ctx.store.home_tasks()), vec!["h1", "h2"]);
        assert_eq!(ids(&ctx.store.all_tasks()), vec!["b-new", "b-old"]);
        assert_eq!(ctx.store.phase(), SyncPhase::Ready);

        let snapshot = ctx.store.snapshot();
        assert!(snapshot.initialized);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_initialize_runs_once(ctx: &mut StoreContext) {
        ctx.store.initialize().await.unwrap();
        let calls = ctx.backend.select_calls();
        ctx.store.initialize().await.unwrap();
        assert_eq!(ctx.backend.select_calls(), calls);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_concurrent_initialize_shares_one_fetch(ctx: &mut StoreContext) {
        ctx.backend.set_latency(Some(std::time::Duration::from_millis(50)));
        let (first, second) = tokio::join!(ctx.store.initialize(), ctx.store.initialize());
        first.unwrap();
        second.unwrap();
        // One fetch is two selects: home and bucket.
        assert_eq!(ctx.backend.select_calls(), 2);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_failed_initialize_can_be_retried(ctx: &mut StoreContext) {
        ctx.backend.set_offline(true);
        assert!(matches!(ctx.store.initialize().await, Err(TaskError::Remote(RemoteError::Transport(_)))));
        assert_eq!(ctx.store.phase(), SyncPhase::Error);
        assert!(!ctx.store.is_initialized());

        ctx.backend.set_offline(false);
        ctx.store.initialize().await.unwrap();
        assert_eq!(ctx.store.phase(), SyncPhase::Ready);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_add_task_goes_to_matching_partition(ctx: &mut StoreContext) {
        ctx.store.initialize().await.unwrap();

        let pinned = ctx.store.add_task(&draft("Pinned", true)).await.unwrap();
        let loose = ctx.store.add_task(&draft("Loose", false)).await.unwrap();

        assert!(!pinned.completed);
        assert_eq!(pinned.user_id, ctx.owner);
        assert_eq!(ids(&ctx.store.home_tasks()), vec![pinned.id.to_string()]);
        assert_eq!(ids(&ctx.store.all_tasks()), vec![loose.id.to_string()]);
        assert_eq!(ctx.backend.rows().len(), 2);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_featured_capacity_is_enforced_before_any_write(ctx: &mut StoreContext) {
        ctx.store.initialize().await.unwrap();
        for title in ["One", "Two", "Three"] {
            ctx.store.add_task(&draft(title, true)).await.unwrap();
        }

        let result = ctx.store.add_task(&draft("Four", true)).await;
        assert_eq!(result.unwrap_err(), TaskError::CapacityExceeded { capacity: 3 });
        assert_eq!(ctx.backend.rows().len(), 3);
        assert_eq!(ctx.store.home_tasks().len(), 3);
        assert_eq!(ctx.store.error().as_deref(), Some("Maximum of 3 featured tasks allowed"));

        let loose = ctx.store.add_task(&draft("Loose", false)).await.unwrap();
        assert_eq!(
            ctx.store.move_to_featured(&loose.id).await,
            Err(TaskError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(
            ctx.store.update_task(&loose.id, &TaskChanges::featured(true)).await.unwrap_err(),
            TaskError::CapacityExceeded { capacity: 3 }
        );
        assert!(!ctx.backend.row(&loose.id).unwrap().featured);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_capacity_counts_remote_home_before_first_load(ctx: &mut StoreContext) {
        ctx.seed("h1", true, Some(0), 0);
        ctx.seed("h2", true, Some(1), 1);
        ctx.seed("h3", true, Some(2), 2);
        let loose = ctx.seed("b", false, None, 3);
        assert!(!ctx.store.is_initialized());

        assert_eq!(
            ctx.store.add_task(&draft("Fourth", true)).await.unwrap_err(),
            TaskError::CapacityExceeded { capacity: 3 }
        );
        assert!(ctx.store.is_initialized());
        assert_eq!(
            ctx.store.move_to_featured(&loose).await,
            Err(TaskError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(
            ctx.store.update_task(&loose, &TaskChanges::featured(true)).await.unwrap_err(),
            TaskError::CapacityExceeded { capacity: 3 }
        );

        let featured = ctx.backend.rows().iter().filter(|t| t.featured).count();
        assert_eq!(featured, 3);
        assert_eq!(ctx.store.home_tasks().len(), 3);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_unpinning_then_pinning_into_a_full_home(ctx: &mut StoreContext) {
        let first = ctx.seed("h1", true, Some(0), 0);
        ctx.seed("h2", true, Some(1), 1);
        ctx.seed("h3", true, Some(2), 2);
        let loose = ctx.seed("b", false, None, 3);
        ctx.store.initialize().await.unwrap();

        ctx.store.move_to_bucket(&first).await.unwrap();
        let refill = ctx.store.add_task(&draft("Refill", true)).await.unwrap();
        assert_eq!(ctx.store.home_tasks().len(), 3);

        assert_eq!(
            ctx.store.move_to_featured(&loose).await,
            Err(TaskError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(
            ctx.store.move_to_featured(&first).await,
            Err(TaskError::CapacityExceeded { capacity: 3 })
        );

        let state = ctx.store.state();
        for id in [first, loose, refill.id, TaskId::new("h2"), TaskId::new("h3")] {
            let in_home = state.home.iter().filter(|t| t.id == id).count();
            let in_bucket = state.bucket.iter().filter(|t| t.id == id).count();
            assert_eq!(in_home + in_bucket, 1, "{} must be in exactly one partition", id);
            let featured = ctx.backend.row(&id).unwrap().featured;
            assert_eq!(in_home == 1, featured);
        }
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_invalid_draft_is_rejected_locally(ctx: &mut StoreContext) {
        ctx.store.initialize().await.unwrap();

        let blank = ctx.store.add_task(&draft("   ", false)).await;
        assert!(matches!(blank, Err(TaskError::Validation(_))));

        let unknown_group = ctx.store.add_task(&TaskDraft::new("Title", "Errands", date())).await;
        assert!(matches!(unknown_group, Err(TaskError::Validation(_))));
        assert!(ctx.backend.rows().is_empty());

        let mut groups = ctx.store.groups();
        groups.add("Errands").unwrap();
        ctx.store.set_groups(groups);
        assert!(ctx.store.add_task(&TaskDraft::new("Title", "Errands", date())).await.is_ok());
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_completion_stamps_and_clears_completed_at(ctx: &mut StoreContext) {
        let id = ctx.seed("t", false, None, 0);
        ctx.store.initialize().await.unwrap();

        let before = Utc::now();
        let done = ctx.store.update_task(&id, &TaskChanges::completed(true)).await.unwrap();
        assert!(done.completed);
        assert!(done.completed_at.unwrap() >= before);
        assert_eq!(ctx.store.find(&id).unwrap().completed_at, done.completed_at);

        let renamed = ctx
            .store
            .update_task(
                &id,
                &TaskChanges {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.completed_at, done.completed_at);

        let reopened = ctx.store.update_task(&id, &TaskChanges::completed(false)).await.unwrap();
        assert!(!reopened.completed);
        assert!(reopened.completed_at.is_none());
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_featured_update_moves_row_between_partitions(ctx: &mut StoreContext) {
        let id = ctx.seed("t", false, None, 0);
        ctx.store.initialize().await.unwrap();

        ctx.store.update_task(&id, &TaskChanges::featured(true)).await.unwrap();
        assert_eq!(ids(&ctx.store.home_tasks()), vec!["t"]);
        assert!(ctx.store.all_tasks().is_empty());

        ctx.store.update_task(&id, &TaskChanges::featured(false)).await.unwrap();
        assert!(ctx.store.home_tasks().is_empty());
        assert_eq!(ids(&ctx.store.all_tasks()), vec!["t"]);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_move_to_featured_and_back(ctx: &mut StoreContext) {
        let id = ctx.seed("t", false, None, 0);
        ctx.seed("other", false, None, 1);
        ctx.store.initialize().await.unwrap();

        ctx.store.move_to_featured(&id).await.unwrap();
        assert_eq!(ids(&ctx.store.home_tasks()), vec!["t"]);
        assert_eq!(ids(&ctx.store.all_tasks()), vec!["other"]);
        assert!(ctx.backend.row(&id).unwrap().featured);

        // Already pinned: nothing to do.
        let updates = ctx.backend.update_calls();
        ctx.store.move_to_featured(&id).await.unwrap();
        assert_eq!(ctx.backend.update_calls(), updates);

        ctx.store.move_to_bucket(&id).await.unwrap();
        assert!(ctx.store.home_tasks().is_empty());
        assert_eq!(ctx.store.all_tasks().len(), 2);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_partitions_always_match_featured_flag(ctx: &mut StoreContext) {
        let a = ctx.seed("a", false, None, 0);
        let b = ctx.seed("b", true, Some(0), 1);
        ctx.store.initialize().await.unwrap();

        ctx.store.move_to_featured(&a).await.unwrap();
        ctx.store.move_to_bucket(&b).await.unwrap();
        ctx.store.add_task(&draft("c", true)).await.unwrap();

        let state = ctx.store.state();
        assert!(state.home.iter().all(|t| t.featured));
        assert!(state.bucket.iter().all(|t| !t.featured));
        assert!(state.home.len() <= 3);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_reorder_persists_positions(ctx: &mut StoreContext) {
        ctx.seed("a", true, Some(0), 0);
        ctx.seed("b", true, Some(1), 1);
        ctx.seed("c", true, Some(2), 2);
        ctx.store.initialize().await.unwrap();

        let reversed: Vec<Task> = ctx.store.home_tasks().into_iter().rev().collect();
        ctx.store.reorder(&reversed).await.unwrap();

        assert_eq!(ids(&ctx.store.home_tasks()), vec!["c", "b", "a"]);
        let orders: Vec<Option<i64>> = ctx.store.home_tasks().iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(ctx.backend.row(&TaskId::new("c")).unwrap().order, Some(0));
        assert_eq!(ctx.backend.row(&TaskId::new("a")).unwrap().order, Some(2));

        // Only c and a changed position.
        assert_eq!(ctx.backend.update_calls(), 2);

        // Reordering to the current order writes nothing.
        let current = ctx.store.home_tasks();
        ctx.store.reorder(&current).await.unwrap();
        assert_eq!(ctx.backend.update_calls(), 2);

        ctx.store.resync().await.unwrap();
        assert_eq!(ids(&ctx.store.home_tasks()), vec!["c", "b", "a"]);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_reorder_rejects_bad_sequences(ctx: &mut StoreContext) {
        ctx.seed("h", true, Some(0), 0);
        ctx.seed("h2", true, Some(1), 1);
        ctx.seed("b", false, None, 2);
        ctx.store.initialize().await.unwrap();
        let state = ctx.store.state();

        let mixed = vec![state.home[0].clone(), state.bucket[0].clone()];
        assert!(matches!(ctx.store.reorder(&mixed).await, Err(TaskError::Validation(_))));

        let partial = vec![state.home[1].clone()];
        assert!(matches!(ctx.store.reorder(&partial).await, Err(TaskError::Validation(_))));

        assert!(ctx.store.reorder(&[]).await.is_ok());
        assert_eq!(ctx.backend.update_calls(), 0);
        assert_eq!(ids(&ctx.store.home_tasks()), vec!["h", "h2"]);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_partial_reorder_failure_keeps_local_order(ctx: &mut StoreContext) {
        let a = ctx.seed("a", true, Some(0), 0);
        ctx.seed("b", true, Some(1), 1);
        ctx.seed("c", true, Some(2), 2);
        ctx.store.initialize().await.unwrap();
        ctx.backend.fail_updates_of(&a);

        let reversed: Vec<Task> = ctx.store.home_tasks().into_iter().rev().collect();
        match ctx.store.reorder(&reversed).await {
            Err(TaskError::PartialFailure { succeeded, failures }) => {
                assert_eq!(succeeded, 1);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].id, a);
                assert_eq!(failures[0].position, 2);
            }
            other => panic!("expected a partial failure, got {:?}", other),
        }

        assert_eq!(ids(&ctx.store.home_tasks()), vec!["a", "b", "c"]);
        assert_eq!(ctx.store.phase(), SyncPhase::Error);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_delete_task(ctx: &mut StoreContext) {
        let id = ctx.seed("gone", false, None, 0);
        ctx.store.initialize().await.unwrap();

        assert_eq!(ctx.store.delete_task(&id).await.unwrap(), DeleteOutcome::Deleted);
        assert!(ctx.store.find(&id).is_none());
        assert!(ctx.backend.rows().is_empty());

        assert_eq!(ctx.store.delete_task(&id).await.unwrap(), DeleteOutcome::AlreadyGone);
        assert_eq!(
            ctx.store.delete_task(&TaskId::new("never-existed")).await.unwrap(),
            DeleteOutcome::AlreadyGone
        );
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_remote_failure_keeps_last_known_good(ctx: &mut StoreContext) {
        ctx.seed("a", true, Some(0), 0);
        ctx.seed("b", false, None, 1);
        ctx.store.initialize().await.unwrap();
        let before = ctx.store.state();

        ctx.backend.fail_next(
            Operation::Update,
            RemoteError::Rejected {
                status: 500,
                message: "boom".to_string(),
            },
        );
        let result = ctx.store.update_task(&TaskId::new("b"), &TaskChanges::completed(true)).await;
        assert!(matches!(result, Err(TaskError::Remote(RemoteError::Rejected { status: 500, .. }))));

        let after = ctx.store.state();
        assert_eq!(after.home, before.home);
        assert_eq!(after.bucket, before.bucket);
        assert_eq!(after.phase, SyncPhase::Error);
        assert!(after.error.is_some());

        // The next successful call clears the error.
        ctx.store.resync().await.unwrap();
        assert_eq!(ctx.store.phase(), SyncPhase::Ready);
        assert!(ctx.store.error().is_none());
    }

    #[tokio::test]
    async fn test_operations_require_a_session() {
        let backend = Arc::new(MemoryBackend::new());
        let store = TaskStore::new(backend, Groups::default());

        assert_eq!(store.initialize().await, Err(TaskError::NotAuthenticated));
        assert_eq!(
            store.add_task(&draft("Title", false)).await.unwrap_err(),
            TaskError::NotAuthenticated
        );
        assert!(!store.is_initialized());
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_reset_discards_in_flight_results(ctx: &mut StoreContext) {
        ctx.seed("a", false, None, 0);
        ctx.store.initialize().await.unwrap();
        assert_eq!(ctx.store.all_tasks().len(), 1);

        ctx.backend.set_latency(Some(std::time::Duration::from_millis(100)));
        let store = Arc::clone(&ctx.store);
        let pending = tokio::spawn(async move { store.resync().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let epoch = ctx.store.epoch();
        ctx.store.reset();
        assert_ne!(ctx.store.epoch(), epoch);

        pending.await.unwrap().unwrap();
        let state = ctx.store.state();
        assert!(state.home.is_empty());
        assert!(state.bucket.is_empty());
        assert!(!state.initialized);
        assert_eq!(state.phase, SyncPhase::Uninitialized);
    }

    #[test_context(StoreContext)]
    #[tokio::test]
    async fn test_subscribers_see_state_changes(ctx: &mut StoreContext) {
        let mut states = ctx.store.subscribe();
        ctx.store.initialize().await.unwrap();
        assert!(states.has_changed().unwrap());
        assert!(states.borrow_and_update().initialized);

        ctx.store.add_task(&draft("New", false)).await.unwrap();
        assert!(states.has_changed().unwrap());
        assert_eq!(states.borrow_and_update().bucket.len(), 1);
    }
}
