use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn bundled_templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/templates")
}

fn isocity(args: &[&str]) -> Output {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::new(env!("CARGO_BIN_EXE_isocity"))
        .arg("--templates")
        .arg(bundled_templates())
        .arg("--config")
        .arg(dir.path().join("isocity.toml"))
        .args(args)
        .output()
        .expect("failed to run the isocity binary")
}

#[test]
fn road_orders_are_reported() {
    let output = isocity(&["--build", "road@10,10:12,10", "--map"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("funds: 9925"), "{stdout}");
    assert!(stdout.contains("structures: 3"), "{stdout}");
    assert!(stdout.contains("====\n===="), "{stdout}");
}

#[test]
fn rejected_orders_are_reported_as_messages() {
    let output = isocity(&[
        "--funds",
        "120",
        "--build",
        "house1@20,20",
        "--build",
        "business1@30,30",
    ]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("placed: 1, bulldozed: 0, rejected: 1"), "{stdout}");
    assert!(stdout.contains("message: Insufficient funds"), "{stdout}");
}

#[test]
fn malformed_orders_fail_to_parse() {
    let output = isocity(&["--build", "castle@1,1"]);
    assert!(!output.status.success());
}

#[test]
fn bulldozed_road_tiles_leave_the_rest_on_the_map() {
    let output = isocity(&["--build", "road@10,10", "--build", "bulldozer@10,10", "--map"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("structures: 1"), "{stdout}");
    assert!(stdout.contains("map from (9, 9) to (10, 10):\n==\n=.\n"), "{stdout}");
    assert!(stdout.contains("message: Road: $25"), "{stdout}");
}
