//! End-to-end tests of the `pirust` binary.

use assert_cmd::Command;
use pirust_core::float::BACKEND;
use predicates::prelude::*;

const PI_100: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";

fn pirust() -> Command {
    Command::cargo_bin("pirust").unwrap()
}

#[test]
fn hundred_digits_with_worker_processes() {
    pirust()
        .args(["100", "-p", "2", "-t", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Pi = {PI_100}")))
        .stdout(predicate::str::contains("Decimals computed    : 100 / 100"));
}

#[test]
fn hundred_digits_in_process() {
    pirust()
        .args(["100", "-p", "3", "-t", "2", "--in-process"])
        .assert()
        .success()
        .stdout(predicate::str::contains(PI_100));
}

#[test]
fn single_digit_run() {
    pirust()
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pi = 3.1\n"));
}

#[test]
fn csv_prints_a_single_row() {
    let output = pirust()
        .args(["100", "-p", "2", "-t", "2", "--csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "unexpected output: {stdout}");

    let fields: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(&fields[..7], [BACKEND, "chudnovsky", "100", "8", "2", "2", "100"]);
    assert!(fields[7].parse::<f64>().unwrap() >= 0.0);
}

#[test]
fn other_series_by_selector() {
    pirust()
        .args(["60", "-a", "0", "-p", "2", "-t", "2", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{BACKEND},bbp,60,50,2,2,")));

    pirust()
        .args(["60", "-a", "bellard", "-t", "3", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{BACKEND},bellard,60,20,1,3,")));
}

#[test]
fn zero_digits_is_rejected() {
    pirust()
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn too_many_workers_is_rejected_once() {
    let output = pirust().args(["20", "-p", "2", "-t", "2"]).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.matches("too small").count(), 1, "stderr: {stderr}");
}

#[test]
fn unknown_algorithm_is_rejected() {
    pirust()
        .args(["100", "-a", "gauss"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gauss"));
}

#[test]
fn worker_rank_must_be_a_non_root_rank() {
    pirust()
        .args(["100", "-p", "2", "--worker-rank", "5"])
        .assert()
        .failure();
}
