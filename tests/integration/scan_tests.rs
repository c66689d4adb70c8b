//! Running the fclones stand-in and turning its report into groups.

use dupecleaner::config::FclonesConfig;
use dupecleaner::scan::{FclonesRunner, ScanError, ScanSettings};
use tempfile::TempDir;

use super::common::{tool_lock, write_file};

#[test]
fn test_missing_tool_is_reported() {
    let root = TempDir::new().unwrap();
    let runner = FclonesRunner::new(FclonesConfig {
        path: root.path().join("no-such-fclones"),
        ..FclonesConfig::default()
    });

    let err = runner.run(&ScanSettings::for_root(root.path())).unwrap_err();
    assert!(matches!(err, ScanError::ToolNotFound(_)));
    assert!(err.to_string().contains("fclones.path"));
}

#[test]
fn test_invalid_root_checked_before_running() {
    let root = TempDir::new().unwrap();
    let file = write_file(root.path(), "plain.txt", b"x", 0);
    let runner = FclonesRunner::default();

    let err = runner.run(&ScanSettings::for_root(&file)).unwrap_err();
    assert!(matches!(err, ScanError::NotADirectory(_)));

    let err = runner
        .run(&ScanSettings::for_root(root.path().join("missing")))
        .unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound(_)));
}

#[cfg(unix)]
mod with_fake_tool {
    use super::*;
    use crate::integration::common::{json_report, FakeTool};

    #[test]
    fn test_scan_builds_groups_from_json_report() {
        let root = TempDir::new().unwrap();
        let a = write_file(root.path(), "a.txt", b"same content", 300);
        let b = write_file(root.path(), "sub/b.txt", b"same content", 100);
        let lonely = write_file(root.path(), "lonely.txt", b"unique", 0);
        let tool = FakeTool::reporting(&json_report(&[
            (12, vec![a.as_path(), b.as_path()]),
            (6, vec![lonely.as_path()]),
        ]));

        let mut settings = ScanSettings::for_root(root.path());
        settings.min_size_kb = 2;
        settings.extensions = ".txt, .md".to_string();
        settings.exclude_dirs = "node_modules".to_string();
        settings.scan_hidden = true;

        let outcome = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config()).run(&settings).unwrap()
        };

        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.size, 12);
        assert_eq!(group.paths(), vec![a.clone(), b.clone()]);
        assert!(group.files.iter().all(|f| f.modified.is_some()));
        assert!(group.files[0].modified < group.files[1].modified);

        assert_eq!(outcome.summary.tool_version.as_deref(), Some("0.35.0"));
        assert_eq!(outcome.summary.duplicate_files, 1);
        assert_eq!(outcome.summary.reclaimable_space, 12);

        let args = tool.recorded_args();
        assert_eq!(args[0], "group");
        assert_eq!(args[1], root.path().to_string_lossy());
        let joined = args.join(" ");
        assert!(joined.contains("--format json"));
        assert!(joined.contains("--min 2048"));
        assert!(joined.contains("--name *.txt --name *.md"));
        assert!(joined.contains("--exclude **/node_modules/**"));
        assert!(joined.contains("--hidden"));
        assert!(joined.contains("--no-ignore"));
        assert!(!joined.contains("--follow-links"));
    }

    #[test]
    fn test_empty_output_means_no_duplicates() {
        let root = TempDir::new().unwrap();
        let tool = FakeTool::reporting("");

        let outcome = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config())
                .run(&ScanSettings::for_root(root.path()))
                .unwrap()
        };
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.summary.duplicate_groups, 0);
    }

    #[test]
    fn test_text_report_is_accepted() {
        let root = TempDir::new().unwrap();
        let a = write_file(root.path(), "a.bin", b"0123", 0);
        let b = write_file(root.path(), "b.bin", b"0123", 0);
        let report = format!(
            "# Report by fclones 0.34.0\n\
             # Timestamp: 2024-05-01 10:00:00.000 +0000\n\
             f00dfeed, 4 B (4 B) * 2:\n    {}\n    {}\n",
            a.display(),
            b.display()
        );
        let tool = FakeTool::reporting(&report);

        let outcome = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config())
                .run(&ScanSettings::for_root(root.path()))
                .unwrap()
        };
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].hash, "f00dfeed");
        assert_eq!(outcome.summary.tool_version.as_deref(), Some("0.34.0"));
    }

    #[test]
    fn test_garbage_output_is_a_parse_error() {
        let root = TempDir::new().unwrap();
        let tool = FakeTool::reporting("{ this is not a report");

        let err = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config())
                .run(&ScanSettings::for_root(root.path()))
                .unwrap_err()
        };
        assert!(matches!(err, ScanError::Parse(_)));
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let root = TempDir::new().unwrap();
        let tool = FakeTool::failing("error: permission denied", 2);

        let err = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config())
                .run(&ScanSettings::for_root(root.path()))
                .unwrap_err()
        };
        match &err {
            ScanError::ToolFailed { code, stderr, .. } => {
                assert_eq!(*code, Some(2));
                assert!(stderr.contains("permission denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_version_query() {
        let tool = FakeTool::reporting("");
        let version = {
            let _guard = tool_lock();
            FclonesRunner::new(tool.config()).version().unwrap()
        };
        assert_eq!(version, "0.35.0");
    }
}
