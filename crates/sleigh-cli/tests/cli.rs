use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use sleigh_testing::DataWorld;
use sleigh_testing::fixtures::{day, hourly};

const CONFIG: &str = r#"
[range]
compare_suffix = "_cmp"

[sources.asfs]
dir = "{data}/asfs"
template = "asfs_%Y%m%d.json"

[[tabs]]
name = "met"
title = "Meteorology"

[[tabs.panels]]
title = "Air temperature"
source = "asfs"
variables = ["temp"]
"#;

fn world() -> DataWorld {
    let world = DataWorld::new();
    for date in ["2024-05-09", "2024-05-10"] {
        let file = format!("asfs_{}.json", date.replace('-', ""));
        world.write_json("asfs", &file, &hourly(day(date), &[0, 12], "temp"));
    }
    world.write_config(CONFIG);
    world
}

#[test]
fn test_sources_lists_configured_sources() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world.configure_command(&mut cmd).arg("sources");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("asfs").and(predicate::str::contains("asfs_%Y%m%d.json")))
        .stdout(predicate::str::contains("json"));
}

#[test]
fn test_files_reports_presence() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world.configure_command(&mut cmd).args([
        "files",
        "--source",
        "asfs",
        "--start",
        "2024-05-09",
        "--end",
        "2024-05-11T06:00",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("present  asfs_20240509.json"))
        .stdout(predicate::str::contains("missing  asfs_20240511.json"))
        .stdout(predicate::str::contains("2/3 file(s) present"));
}

#[test]
fn test_files_unknown_source_fails() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world
        .configure_command(&mut cmd)
        .args(["files", "--source", "gfs", "--start", "2024-05-09"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown source 'gfs' (configured: asfs)"));
}

#[test]
fn test_show_renders_tab() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world.configure_command(&mut cmd).args([
        "show",
        "--start",
        "2024-05-09",
        "--end",
        "2024-05-10",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    insta::assert_snapshot!(stdout.trim_end(), @r"
    == Meteorology == 2024-05-09 00:00 .. 2024-05-10 00:00
    [line] Air temperature
      time: 2024-05-09 00:00:00 .. 2024-05-09 12:00:00
      temp: 2/2 valid, min 900.00, max 912.00
    ");
}

#[test]
fn test_show_compare_uses_suffix() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world.configure_command(&mut cmd).args([
        "show",
        "--start",
        "2024-05-09",
        "--end",
        "2024-05-11",
        "--compare",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--- comparison ---"))
        .stdout(predicate::str::contains("temp_cmp: 4/4 valid"));
}

#[test]
fn test_corrupt_file_is_logged_not_fatal() {
    let world = world();
    world.corrupt("asfs", "asfs_20240510.json");
    let mut cmd = cargo_bin_cmd!("sleigh");
    world.configure_command(&mut cmd).args([
        "show",
        "--start",
        "2024-05-09",
        "--end",
        "2024-05-11",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("temp: 2/2 valid"))
        .stderr(predicate::str::contains("skipping asfs_20240510.json"));
}

#[test]
fn test_end_without_start_is_rejected() {
    let world = world();
    let mut cmd = cargo_bin_cmd!("sleigh");
    world
        .configure_command(&mut cmd)
        .args(["show", "--end", "2024-05-10"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--end requires --start"));
}
