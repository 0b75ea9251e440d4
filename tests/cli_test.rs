use std::fs;
use std::process::Command;

fn pipesort() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pipesort"))
}

#[test]
fn test_sort_prints_input_then_sorted_values() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("numbers");
    fs::write(&input, [4u8, 7, 2, 6, 1, 8, 3, 5]).unwrap();

    let output = pipesort()
        .args(["sort", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute pipesort");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "pipesort failed. stderr: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "4 7 2 6 1 8 3 5");
    assert_eq!(&lines[1..], &["1", "2", "3", "4", "5", "6", "7", "8"]);
}

#[test]
fn test_generate_then_sort_wide_values_with_timing_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("numbers");
    let report = dir.path().join("report.json");

    let generated = pipesort()
        .args(["generate", "--count", "64", "--width", "4", "--seed", "3", "--output"])
        .arg(&input)
        .status()
        .expect("Failed to execute pipesort generate");
    assert!(generated.success());
    assert_eq!(fs::metadata(&input).unwrap().len(), 64 * 4);

    let output = pipesort()
        .args(["sort", "--width", "4", "--no-print-input", "--timing", "--input"])
        .arg(&input)
        .arg("--report")
        .arg(&report)
        .output()
        .expect("Failed to execute pipesort sort");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let values: Vec<u32> = stdout
        .lines()
        .take_while(|line| !line.starts_with("walltime:"))
        .map(|line| line.parse().unwrap())
        .collect();
    assert_eq!(values.len(), 64);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert!(stdout.contains("walltime: "));
    assert!(stdout.contains("reduced: "));
    assert!(stdout.contains("mem: "));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["input_len"], 64);
    assert_eq!(json["stage_count"], 7);
    assert_eq!(json["stages"].as_array().unwrap().len(), 6);
}

#[test]
fn test_descending_without_input_echo() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("numbers");
    fs::write(&input, [1u8, 9, 5, 3]).unwrap();

    let output = pipesort()
        .args(["sort", "--order", "desc", "--channel", "buffered", "--no-print-input", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute pipesort");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["9", "5", "3", "1"]);
}

#[test]
fn test_non_power_of_two_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("numbers");
    fs::write(&input, [1u8, 2, 3, 4, 5, 6]).unwrap();

    let output = pipesort()
        .args(["sort", "--no-print-input", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute pipesort");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Setup"));
}

#[test]
fn test_stage_count_must_match_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("numbers");
    fs::write(&input, [1u8, 2, 3, 4]).unwrap();

    let output = pipesort()
        .args(["sort", "--stages", "4", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute pipesort");
    assert!(!output.status.success());
}
