use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dircreate::{DirectoryCreateTool, ProvisionStatus, ToolSettings, run_stream};
use serde_json::{Map, Value, json};

fn unique_temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    dir.push(format!("dircreate-it-{label}-{ts}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn tool() -> DirectoryCreateTool {
    DirectoryCreateTool::new(ToolSettings {
        root_folder_field: "RootFolder".to_owned(),
        target_folder_field: "FinalFolder".to_owned(),
        description_size: 200,
        tool_id: 1,
    })
}

fn lines(rows: &[Value]) -> String {
    rows.iter().map(|row| format!("{row}\n")).collect()
}

fn parse_output(bytes: &[u8]) -> Vec<Map<String, Value>> {
    std::str::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| match serde_json::from_str(line).unwrap() {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        })
        .collect()
}

fn p(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

#[test]
fn mixed_rows_keep_order_and_pass_through_columns() {
    let base = unique_temp_dir("mixed");
    let existing = base.join("already_there");
    fs::create_dir_all(&existing).unwrap();
    let nested = base.join("brand").join("new").join("nested");
    let missing_root = base.join("no").join("such").join("root");
    let blocker = base.join("blocker");
    fs::write(&blocker, "file").unwrap();

    let rows = vec![
        json!({"Id": 1, "RootFolder": p(&base), "FinalFolder": p(&existing), "Extra": "a"}),
        json!({"Id": 2, "RootFolder": p(&base), "FinalFolder": p(&nested), "Extra": null}),
        json!({"Id": 3, "RootFolder": p(&missing_root), "FinalFolder": p(&base.join("x")), "Extra": 4.5}),
        json!({"Id": 4, "RootFolder": p(&base), "FinalFolder": p(&blocker.join("child")), "Extra": true}),
        json!({"Id": 5, "RootFolder": p(&base), "FinalFolder": p(&nested), "Extra": "z"}),
    ];

    let mut out = Vec::new();
    let summary = run_stream(lines(&rows).as_bytes(), &mut out, tool(), None).unwrap();
    let output = parse_output(&out);
    assert_eq!(output.len(), rows.len());

    let expected = [
        ("True", "Folder already existed".to_owned()),
        ("True", "Created Successfully".to_owned()),
        ("False", format!("Root folder {} does not exist", p(&missing_root))),
        ("False", "Error while creating folder".to_owned()),
        ("True", "Folder already existed".to_owned()),
    ];

    for ((input, row), (result, message)) in rows.iter().zip(&output).zip(&expected) {
        let input = input.as_object().unwrap();
        let names: Vec<_> = row.keys().map(String::as_str).collect();
        let mut expected_names: Vec<_> = input.keys().map(String::as_str).collect();
        expected_names.extend(["FolderCreationResult", "FolderCreationDescription"]);
        assert_eq!(names, expected_names);

        for (key, value) in input {
            assert_eq!(row.get(key), Some(value));
        }
        assert_eq!(row["FolderCreationResult"], json!(result));
        assert_eq!(row["FolderCreationDescription"], json!(message));
    }

    assert!(nested.is_dir());
    assert!(!base.join("x").exists());
    assert_eq!(summary.records, 5);
    assert_eq!(summary.count(ProvisionStatus::AlreadyExists), 2);
    assert_eq!(summary.count(ProvisionStatus::Created), 1);
    assert_eq!(summary.count(ProvisionStatus::MissingRoot), 1);
    assert_eq!(summary.count(ProvisionStatus::CreateFailed), 1);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn null_root_reports_missing_root() {
    let base = unique_temp_dir("null");
    let target = base.join("never");
    let rows = vec![json!({"RootFolder": null, "FinalFolder": p(&target)})];

    let mut out = Vec::new();
    run_stream(lines(&rows).as_bytes(), &mut out, tool(), None).unwrap();
    let output = parse_output(&out);
    assert_eq!(output[0]["FolderCreationResult"], json!("False"));
    assert_eq!(
        output[0]["FolderCreationDescription"],
        json!("Root folder  does not exist")
    );
    assert!(!target.exists());

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn malformed_line_stops_the_run_after_earlier_rows() {
    let base = unique_temp_dir("malformed");
    let input = format!(
        "{}\nnot json\n",
        json!({"RootFolder": p(&base), "FinalFolder": p(&base)})
    );

    let mut out = Vec::new();
    let err = run_stream(input.as_bytes(), &mut out, tool(), None).unwrap_err();
    assert!(err.to_string().contains("line 2"));
    assert_eq!(parse_output(&out).len(), 1);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn later_row_carrying_a_result_column_stops_the_run() {
    let base = unique_temp_dir("clash");
    let rows = vec![
        json!({"RootFolder": p(&base), "FinalFolder": p(&base)}),
        json!({"FolderCreationResult": "keep-me", "RootFolder": p(&base), "FinalFolder": p(&base)}),
    ];

    let mut out = Vec::new();
    let err = run_stream(lines(&rows).as_bytes(), &mut out, tool(), None).unwrap_err();
    assert_eq!(err.to_string(), "processing input line 2");
    assert!(format!("{err:#}").contains("input already has a `FolderCreationResult` column"));

    let output = parse_output(&out);
    assert_eq!(output.len(), 1);
    assert!(!out.windows(7).any(|w| w == b"keep-me"));

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn later_row_missing_a_configured_column_stops_the_run() {
    let base = unique_temp_dir("missing-col");
    let rows = vec![
        json!({"RootFolder": p(&base), "FinalFolder": p(&base)}),
        json!({"RootFolder": p(&base), "Other": "x"}),
    ];

    let mut out = Vec::new();
    let err = run_stream(lines(&rows).as_bytes(), &mut out, tool(), None).unwrap_err();
    assert!(format!("{err:#}").contains("target folder field `FinalFolder` does not exist"));
    assert_eq!(parse_output(&out).len(), 1);

    let _ = fs::remove_dir_all(&base);
}
