#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone, Utc};
    use taskpin::commands::{home_sequence, parse_date, resolve_task};
    use taskpin::libs::task::{Task, TaskId, UserId};

    fn task(id: &str) -> Task {
        Task {
            id: TaskId::new(id),
            title: id.to_string(),
            description: String::new(),
            group: "Work".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            completed: false,
            completed_at: None,
            featured: false,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            user_id: UserId::new("user-1"),
            order: None,
        }
    }

    #[test]
    fn test_resolve_task_by_prefix() {
        let tasks = vec![task("3f2a91c0"), task("3f7be214"), task("a01d55e9")];

        assert_eq!(resolve_task(&tasks, "a0").unwrap().id.as_str(), "a01d55e9");
        assert_eq!(resolve_task(&tasks, "3f2").unwrap().id.as_str(), "3f2a91c0");
        assert_eq!(resolve_task(&tasks, " 3f7be214 ").unwrap().id.as_str(), "3f7be214");

        let ambiguous = resolve_task(&tasks, "3f").unwrap_err().to_string();
        assert!(ambiguous.contains("matches 2 tasks"));

        let missing = resolve_task(&tasks, "ff").unwrap_err().to_string();
        assert!(missing.contains("No task matches 'ff'"));
        assert!(resolve_task(&tasks, "").is_err());
    }

    #[test]
    fn test_exact_id_wins_over_prefix() {
        let tasks = vec![task("abc"), task("abcd")];
        assert_eq!(resolve_task(&tasks, "abc").unwrap().id.as_str(), "abc");
    }

    fn pinned(id: &str) -> Task {
        Task {
            featured: true,
            ..task(id)
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_move_reorders_home() {
        let home = vec![pinned("a"), pinned("b"), pinned("c")];

        assert_eq!(ids(&home_sequence(&home, &home[2], 1).unwrap()), vec!["c", "a", "b"]);
        assert_eq!(ids(&home_sequence(&home, &home[0], 9).unwrap()), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_refuses_bucket_tasks() {
        let home = vec![pinned("a")];
        let loose = task("b");

        let error = home_sequence(&home, &loose, 1).unwrap_err().to_string();
        assert!(error.contains("is not pinned"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-02-28").unwrap(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(parse_date("Today").unwrap(), Local::now().date_naive());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("28.02.2025").is_err());
    }
}
