use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn demo_runs_a_small_multiply() {
    Command::cargo_bin("matvec-demo")
        .unwrap()
        .args([
            "--threads",
            "2",
            "--matrix-rows",
            "7",
            "--matrix-cols",
            "3",
            "--verbose",
        ])
        .assert()
        .success();
}

#[test]
fn demo_rejects_zero_threads() {
    Command::cargo_bin("matvec-demo")
        .unwrap()
        .args(["--threads", "0", "--matrix-rows", "2", "--matrix-cols", "2"])
        .assert()
        .failure()
        .stderr(contains("thread count must be at least 1"));
}
