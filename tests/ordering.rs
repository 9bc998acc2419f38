#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use taskpin::libs::sync::ordering::{
        ensure_capacity, ensure_same_members, move_item, order_assignments, place_row, remove_everywhere, sequence_partition,
        sort_bucket, sort_home, with_positions,
    };
    use taskpin::libs::sync::TaskError;
    use taskpin::libs::task::{Partition, Task, TaskId, UserId};

    fn created(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn task(id: &str, featured: bool, order: Option<i64>, minutes: i64) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("Task {}", id),
            description: String::new(),
            group: "Work".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            completed: false,
            completed_at: None,
            featured,
            created_at: created(minutes),
            user_id: UserId::new("user-1"),
            order,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_home_sorted_by_order_then_unordered_oldest_first() {
        let mut home = vec![
            task("late", true, None, 30),
            task("second", true, Some(1), 0),
            task("early", true, None, 10),
            task("first", true, Some(0), 20),
        ];
        sort_home(&mut home);
        assert_eq!(ids(&home), vec!["first", "second", "early", "late"]);
    }

    #[test]
    fn test_bucket_sorted_newest_first() {
        let mut bucket = vec![task("a", false, None, 0), task("c", false, Some(0), 20), task("b", false, None, 10)];
        sort_bucket(&mut bucket);
        assert_eq!(ids(&bucket), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_capacity_is_three() {
        assert!(ensure_capacity(0).is_ok());
        assert!(ensure_capacity(2).is_ok());
        assert_eq!(ensure_capacity(3), Err(TaskError::CapacityExceeded { capacity: 3 }));
        assert_eq!(ensure_capacity(4), Err(TaskError::CapacityExceeded { capacity: 3 }));
    }

    #[test]
    fn test_sequence_partition() {
        assert_eq!(sequence_partition(&[]), Ok(None));
        assert_eq!(sequence_partition(&[task("a", true, None, 0)]), Ok(Some(Partition::Home)));
        assert_eq!(sequence_partition(&[task("a", false, None, 0)]), Ok(Some(Partition::Bucket)));

        let mixed = [task("a", true, None, 0), task("b", false, None, 1)];
        assert!(matches!(sequence_partition(&mixed), Err(TaskError::Validation(_))));
    }

    #[test]
    fn test_same_members_requires_permutation() {
        let current = vec![task("a", true, Some(0), 0), task("b", true, Some(1), 1)];
        let reversed: Vec<Task> = current.iter().rev().cloned().collect();
        assert!(ensure_same_members(&reversed, &current).is_ok());

        let missing = vec![current[0].clone()];
        assert!(matches!(ensure_same_members(&missing, &current), Err(TaskError::Validation(_))));

        let duplicated = vec![current[0].clone(), current[0].clone()];
        assert!(matches!(ensure_same_members(&duplicated, &current), Err(TaskError::Validation(_))));

        let foreign = vec![current[0].clone(), task("z", true, None, 5)];
        assert!(matches!(ensure_same_members(&foreign, &current), Err(TaskError::Validation(_))));
    }

    #[test]
    fn test_order_assignments_skip_tasks_already_in_place() {
        let sequence = vec![task("c", true, Some(2), 0), task("b", true, Some(1), 1), task("a", true, Some(0), 2)];
        let assignments = order_assignments(&sequence);
        assert_eq!(assignments, vec![(TaskId::new("c"), 0), (TaskId::new("a"), 2)]);

        let in_place = with_positions(sequence);
        assert!(order_assignments(&in_place).is_empty());
    }

    #[test]
    fn test_move_item() {
        let sequence = vec![task("a", true, None, 0), task("b", true, None, 1), task("c", true, None, 2)];

        let moved = move_item(&sequence, &TaskId::new("c"), 0).unwrap();
        assert_eq!(ids(&moved), vec!["c", "a", "b"]);

        let moved = move_item(&sequence, &TaskId::new("a"), 10).unwrap();
        assert_eq!(ids(&moved), vec!["b", "c", "a"]);

        assert!(move_item(&sequence, &TaskId::new("x"), 0).is_err());
    }

    #[test]
    fn test_place_row_moves_between_partitions() {
        let mut home = vec![task("a", true, Some(0), 0)];
        let mut bucket = vec![task("b", false, None, 1)];

        let mut pinned = bucket[0].clone();
        pinned.featured = true;
        place_row(&mut home, &mut bucket, pinned);
        assert_eq!(ids(&home), vec!["a", "b"]);
        assert!(bucket.is_empty());

        let mut renamed = home[0].clone();
        renamed.title = "Renamed".to_string();
        place_row(&mut home, &mut bucket, renamed);
        assert_eq!(home[0].title, "Renamed");
        assert_eq!(home.len(), 2);
    }

    #[test]
    fn test_remove_everywhere() {
        let mut home = vec![task("a", true, Some(0), 0)];
        let mut bucket = vec![task("b", false, None, 1)];
        assert!(remove_everywhere(&mut home, &mut bucket, &TaskId::new("b")));
        assert!(!remove_everywhere(&mut home, &mut bucket, &TaskId::new("b")));
        assert_eq!(home.len(), 1);
        assert!(bucket.is_empty());
    }
}
