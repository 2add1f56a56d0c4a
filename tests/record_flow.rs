mod support;

use std::path::Path;

use buildstamp::build_config;
use buildstamp::env_probe::{EnvSnapshot, Platform, ProbeError, RegistryLookup};
use buildstamp::history_log::{self, EXAMPLE_ROW_MARKER};
use buildstamp::journal;
use buildstamp::manifest::{self, CommentStripper};
use buildstamp::record::{self, RecordContext, RecordError, RecordOutcome, RecordSummary};
use buildstamp::settings::ToolSettings;
use support::scripted::{Answer, ScriptedPrompts, text};
use tempfile::TempDir;
use time::macros::datetime;

const MANIFEST: &str = r#"{
    "name" : "shop",
    "appid" : "__UNI__1234567",
    "description" : "",
    /* keep in sync with the store listing */
    "versionName" : "1.0.0",
    "versionCode" : "100",
    "mp-weixin" : {
        "appid" : "wx0123456789", // production app id
        "setting" : { "urlCheck" : false }
    }
}
"#;

struct InstallDirRegistry(String);

impl RegistryLookup for InstallDirRegistry {
    fn read_string(&self, _key_path: &str, value: &str) -> Result<Option<String>, ProbeError> {
        assert_eq!(value, "InstallDir");
        Ok(Some(self.0.clone()))
    }
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(manifest::manifest_path(dir.path()), MANIFEST).unwrap();
    dir
}

fn context(project: &Path, minute: u8) -> RecordContext {
    RecordContext::new(
        Some(project.to_path_buf()),
        EnvSnapshot::empty(Platform::Linux)
            .with_var("USER", "dana")
            .with_ide_version("4.29"),
        ToolSettings::default(),
        datetime!(2024-06-01 10:00 UTC).replace_minute(minute).unwrap(),
    )
}

fn recorded(outcome: RecordOutcome) -> RecordSummary {
    match outcome {
        RecordOutcome::Recorded(summary) => summary,
        RecordOutcome::Aborted => panic!("flow was aborted"),
    }
}

fn quick_record(project: &Path, minute: u8) -> RecordSummary {
    let mut prompts = ScriptedPrompts::new([Answer::Pick(0)]);
    recorded(record::record_build(&context(project, minute), &mut prompts).unwrap())
}

#[test]
fn quick_path_updates_all_three_artifacts() {
    let dir = project();
    let summary = quick_record(dir.path(), 0);

    let manifest_text = std::fs::read_to_string(manifest::manifest_path(dir.path())).unwrap();
    assert_eq!(
        manifest_text,
        MANIFEST
            .replace(r#""versionName" : "1.0.0""#, r#""versionName": "1.0.1""#)
            .replace(r#""versionCode" : "100""#, r#""versionCode": "101""#)
    );
    let reread = manifest::read_manifest(&manifest::manifest_path(dir.path()), &CommentStripper)
        .unwrap();
    assert_eq!(reread.version_name, "1.0.1");
    assert_eq!(reread.version_code, 101);

    let last = journal::load(&journal::journal_path(dir.path())).unwrap();
    assert_eq!(last.version_name, "1.0.1");
    assert_eq!(last.version_code, "101");
    assert_eq!(last.ide_version, "4.29");

    let history = std::fs::read_to_string(history_log::history_path(dir.path())).unwrap();
    assert!(history.contains(&history_log::format_row(&summary.info)));
    assert!(history.contains("| 2024-06-01 10:00 | 1.0.1 | 101 | 4.29 |"));
}

#[test]
fn repeated_builds_stack_newest_first() {
    let dir = project();
    for minute in 0..3 {
        quick_record(dir.path(), minute);
    }

    let history = std::fs::read_to_string(history_log::history_path(dir.path())).unwrap();
    let lines: Vec<&str> = history.split('\n').collect();
    let example = lines
        .iter()
        .position(|line| line.contains(EXAMPLE_ROW_MARKER))
        .unwrap();
    assert!(lines[example + 1].contains("| 1.0.3 | 103 |"));
    assert!(lines[example + 2].contains("| 1.0.2 | 102 |"));
    assert!(lines[example + 3].contains("| 1.0.1 | 101 |"));

    let journal = journal::read(&journal::journal_path(dir.path()));
    assert_eq!(journal.last_build_info().unwrap().version_name, "1.0.3");
    let previous: Vec<String> = journal
        .history_infos()
        .into_iter()
        .map(|info| info.version_name)
        .collect();
    assert_eq!(previous, ["1.0.2", "1.0.1"]);
}

#[test]
fn saved_builder_is_reused_on_the_next_quick_record() {
    let dir = project();
    let mut prompts = ScriptedPrompts::new([
        Answer::Pick(1),
        Answer::Pick(2),
        Answer::Pick(1),
        text("lee"),
        text("store release"),
    ]);
    let first = recorded(record::record_build(&context(dir.path(), 0), &mut prompts).unwrap());
    assert_eq!(first.info.version_name, "2.0.0");
    assert_eq!(first.info.notes, "store release");
    assert_eq!(prompts.remaining(), 0);

    let second = quick_record(dir.path(), 1);
    assert_eq!(second.info.builder, "lee");
    assert_eq!(second.info.version_name, "2.0.1");
    assert_eq!(second.info.version_code, "102");
}

#[test]
fn builder_save_merges_with_existing_config() {
    let dir = project();
    std::fs::write(
        build_config::config_path(dir.path()),
        r#"{"channel": "beta"}"#,
    )
    .unwrap();
    let mut prompts = ScriptedPrompts::new([
        Answer::Pick(1),
        Answer::Pick(0),
        Answer::Pick(1),
        text("lee"),
        text(""),
    ]);
    record::record_build(&context(dir.path(), 0), &mut prompts).unwrap();

    let config = build_config::load(dir.path());
    assert_eq!(config.builder_name(), Some("lee"));
    assert_eq!(config.get("channel"), Some(&serde_json::json!("beta")));
}

#[test]
fn cancelling_the_version_prompt_leaves_project_untouched() {
    let dir = project();
    let mut prompts = ScriptedPrompts::new([Answer::Pick(1), Answer::Cancel]);
    let outcome = record::record_build(&context(dir.path(), 0), &mut prompts).unwrap();
    assert!(matches!(outcome, RecordOutcome::Aborted));
    assert_eq!(
        std::fs::read_to_string(manifest::manifest_path(dir.path())).unwrap(),
        MANIFEST
    );
    assert!(!history_log::history_path(dir.path()).exists());
    assert!(!journal::journal_path(dir.path()).exists());
}

#[test]
fn malformed_manifest_aborts_before_prompting() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(manifest::manifest_path(dir.path()), "{ \"versionName\": ").unwrap();
    let mut prompts = ScriptedPrompts::new(Vec::new());
    let err = record::record_build(&context(dir.path(), 0), &mut prompts).unwrap_err();
    assert!(matches!(
        err,
        RecordError::Manifest(manifest::ManifestError::Parse { .. })
    ));
    assert!(prompts.asked.is_empty());
}

#[test]
fn devtool_version_comes_from_registry_install_dir_on_windows() {
    let dir = project();
    let install = tempfile::tempdir().unwrap();
    let package_dir = install.path().join("package.nw");
    std::fs::create_dir_all(&package_dir).unwrap();
    std::fs::write(
        package_dir.join("package.json"),
        r#"{"name": "wechatwebdevtools", "version": "1.06.2405020"}"#,
    )
    .unwrap();

    let ctx = RecordContext::new(
        Some(dir.path().to_path_buf()),
        EnvSnapshot::empty(Platform::Windows).with_var("USERNAME", "win-builder"),
        ToolSettings::default(),
        datetime!(2024-06-01 10:00 UTC),
    )
    .with_registry(Box::new(InstallDirRegistry(
        install.path().display().to_string(),
    )));
    let mut prompts = ScriptedPrompts::new([Answer::Pick(0)]);
    let summary = recorded(record::record_build(&ctx, &mut prompts).unwrap());

    assert_eq!(summary.info.dev_tool_version, "1.06.2405020");
    assert_eq!(summary.info.ide_version, "unknown");
    assert_eq!(summary.info.builder, "win-builder");
    assert!(summary.to_string().contains("DevTools: 1.06.2405020"));
}

#[test]
fn view_history_finds_the_log_after_recording() {
    let dir = project();
    assert!(matches!(
        record::view_history(Some(dir.path())),
        Err(RecordError::HistoryMissing { .. })
    ));
    quick_record(dir.path(), 0);
    assert_eq!(
        record::view_history(Some(dir.path())).unwrap(),
        history_log::history_path(dir.path())
    );
}
