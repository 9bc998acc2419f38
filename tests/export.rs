#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use taskpin::libs::export::{ExportData, ExportFormat, ExportTask, Exporter};
    use taskpin::libs::productivity::TaskStats;
    use taskpin::libs::task::{Task, TaskId, UserId};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ExportTestContext {
        temp_dir: TempDir,
        tasks: Vec<Task>,
    }

    impl TestContext for ExportTestContext {
        fn setup() -> Self {
            let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
            let created = Utc.with_ymd_and_hms(2025, 2, 9, 8, 30, 0).unwrap();
            let task = |id: &str, group: &str, completed: bool, featured: bool| Task {
                id: TaskId::new(id),
                title: format!("Title, with comma {}", id),
                description: "Line one".to_string(),
                group: group.to_string(),
                date,
                completed,
                completed_at: completed.then_some(created),
                featured,
                created_at: created,
                user_id: UserId::new("user-1"),
                order: featured.then_some(0),
            };
            ExportTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
                tasks: vec![task("a", "Work", true, true), task("b", "Personal", false, false)],
            }
        }
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_export_task_row(ctx: &mut ExportTestContext) {
        let row = ExportTask::from(&ctx.tasks[0]);
        assert_eq!(row.date, "2025-02-10");
        assert!(row.pinned);
        assert_eq!(row.order, "0");
        assert_eq!(row.completed_at, "2025-02-09T08:30:00+00:00");

        let row = ExportTask::from(&ctx.tasks[1]);
        assert_eq!(row.completed_at, "");
        assert_eq!(row.order, "");
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_tasks_csv(ctx: &mut ExportTestContext) {
        let path = ctx.temp_dir.path().join("tasks.csv");
        let exporter = Exporter::new(ExportFormat::Csv, ExportData::Tasks, Some(path.clone()));
        exporter.export_tasks(&ctx.tasks).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "ID");
        assert_eq!(&headers[1], "Title");

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Title, with comma a");
        assert_eq!(&records[0][5], "yes");
        assert_eq!(&records[1][7], "no");
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_tasks_json(ctx: &mut ExportTestContext) {
        let path = ctx.temp_dir.path().join("tasks.json");
        Exporter::new(ExportFormat::Json, ExportData::Tasks, Some(path.clone()))
            .export_tasks(&ctx.tasks)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["group"], "Personal");
        assert_eq!(rows[0]["pinned"], true);
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_analytics_json(ctx: &mut ExportTestContext) {
        let stats = TaskStats::compute(&ctx.tasks, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(), 7, 4);
        let path = ctx.temp_dir.path().join("analytics.json");
        Exporter::new(ExportFormat::Json, ExportData::Analytics, Some(path.clone()))
            .export_analytics(&stats)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["completed"], 1);
        assert_eq!(value["by_category"]["Work"], 1);
        assert_eq!(value["trend"].as_array().unwrap().len(), 7);
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_analytics_csv_sections(ctx: &mut ExportTestContext) {
        let stats = TaskStats::compute(&ctx.tasks, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(), 3, 1);
        let path = ctx.temp_dir.path().join("analytics.csv");
        Exporter::new(ExportFormat::Csv, ExportData::Analytics, Some(path.clone()))
            .export_analytics(&stats)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Completion Rate,50.0%"));
        assert!(content.contains("Category,Tasks"));
        assert!(content.contains("2025-02-10,2,50.0%"));
    }

    #[test_context(ExportTestContext)]
    #[test]
    fn test_excel_files_are_written(ctx: &mut ExportTestContext) {
        let tasks_path = ctx.temp_dir.path().join("tasks.xlsx");
        Exporter::new(ExportFormat::Excel, ExportData::Tasks, Some(tasks_path.clone()))
            .export_tasks(&ctx.tasks)
            .unwrap();
        assert!(std::fs::metadata(&tasks_path).unwrap().len() > 0);

        let stats = TaskStats::compute(&ctx.tasks, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(), 7, 4);
        let analytics_path = ctx.temp_dir.path().join("analytics.xlsx");
        Exporter::new(ExportFormat::Excel, ExportData::Analytics, Some(analytics_path.clone()))
            .export_analytics(&stats)
            .unwrap();
        assert!(std::fs::metadata(&analytics_path).unwrap().len() > 0);
    }

    #[test]
    fn test_default_output_name() {
        let exporter = Exporter::new(ExportFormat::Excel, ExportData::Analytics, None);
        let name = exporter.output_path().to_string_lossy().to_string();
        assert!(name.starts_with("taskpin_analytics_"));
        assert!(name.ends_with(".xlsx"));
    }
}
