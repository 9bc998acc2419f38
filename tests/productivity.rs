#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use taskpin::libs::productivity::{
        by_category, category_color, completion_rate, filter_in_range, productivity_score, trend, DateRange, ProgressBand,
        RangeReport, TaskStats, UNCATEGORIZED,
    };
    use taskpin::libs::task::{Task, TaskId, UserId};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn task(id: &str, group: &str, date: NaiveDate, completed: bool) -> Task {
        Task {
            id: TaskId::new(id),
            title: id.to_string(),
            description: String::new(),
            group: group.to_string(),
            date,
            completed,
            completed_at: None,
            featured: false,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            user_id: UserId::new("user-1"),
            order: None,
        }
    }

    #[test]
    fn test_completion_rate_and_score() {
        assert_eq!(completion_rate(&[]), 0.0);
        assert_eq!(productivity_score(&[]), 0);

        let tasks = vec![
            task("a", "Work", day(1), true),
            task("b", "Work", day(1), false),
            task("c", "Work", day(1), false),
        ];
        assert!((completion_rate(&tasks) - 33.333).abs() < 0.01);
        assert_eq!(productivity_score(&tasks), 33);

        let tasks = vec![task("a", "Work", day(1), true), task("b", "Work", day(1), true), task("c", "Work", day(1), false)];
        assert_eq!(productivity_score(&tasks), 67);
    }

    #[test]
    fn test_by_category_counts_blank_groups_as_uncategorized() {
        let tasks = vec![
            task("a", "Work", day(1), false),
            task("b", "Personal", day(1), false),
            task("c", "Work", day(2), true),
            task("d", " ", day(2), true),
        ];
        let counts = by_category(&tasks);
        assert_eq!(counts.get("Work"), Some(&2));
        assert_eq!(counts.get("Personal"), Some(&1));
        assert_eq!(counts.get(UNCATEGORIZED), Some(&1));
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(category_color("Work"), "#FFD84E");
        assert_eq!(category_color("Personal"), "#C9C9C9");
        assert_eq!(category_color("Errands"), "#808080");
    }

    #[test]
    fn test_date_range() {
        assert!(DateRange::new(day(5), day(4)).is_err());

        let range = DateRange::new(day(2), day(3)).unwrap();
        assert!(range.contains(day(2)));
        assert!(range.contains(day(3)));
        assert!(!range.contains(day(4)));

        let month = DateRange::month_to_date(day(20));
        assert_eq!(month.start(), day(1));
        assert_eq!(month.end(), day(20));

        let tasks = vec![task("a", "Work", day(1), false), task("b", "Work", day(3), false)];
        let in_range = filter_in_range(&tasks, &range);
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].id.as_str(), "b");
    }

    #[test]
    fn test_trend_window() {
        let tasks = vec![
            task("a", "Work", day(10), true),
            task("b", "Work", day(10), false),
            task("c", "Work", day(12), true),
        ];
        let days = trend(&tasks, day(10), 7, 4);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, day(6));
        assert_eq!(days[6].date, day(12));

        let today = &days[4];
        assert_eq!(today.date, day(10));
        assert_eq!(today.total, 2);
        assert_eq!(today.completion_rate, 50.0);

        assert_eq!(days[5].total, 0);
        assert_eq!(days[5].completion_rate, 0.0);
        assert_eq!(days[6].completion_rate, 100.0);
    }

    #[test]
    fn test_progress_bands() {
        assert_eq!(ProgressBand::for_score(0), ProgressBand::Low);
        assert_eq!(ProgressBand::for_score(40), ProgressBand::Low);
        assert_eq!(ProgressBand::for_score(41), ProgressBand::Moderate);
        assert_eq!(ProgressBand::for_score(80), ProgressBand::Moderate);
        assert_eq!(ProgressBand::for_score(81), ProgressBand::High);
        assert_eq!(ProgressBand::High.color(), "#C0F433");
        assert_eq!(ProgressBand::Low.to_string(), "low");
    }

    #[test]
    fn test_stats_and_range_report() {
        let tasks = vec![
            task("a", "Work", day(1), true),
            task("b", "Personal", day(2), true),
            task("c", "Work", day(15), false),
            task("d", "Work", day(16), true),
        ];

        let stats = TaskStats::compute(&tasks, day(16), 7, 4);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.completion_rate, 75.0);
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.trend.len(), 7);

        let report = RangeReport::compute(&tasks, DateRange::new(day(1), day(2)).unwrap());
        assert_eq!(report.total, 2);
        assert_eq!(report.completed, 2);
        assert_eq!(report.score, 100);
        assert_eq!(report.band, ProgressBand::High);

        let report = RangeReport::compute(&tasks, DateRange::new(day(20), day(31)).unwrap());
        assert_eq!(report.total, 0);
        assert_eq!(report.score, 0);
        assert_eq!(report.band, ProgressBand::Low);
    }
}
