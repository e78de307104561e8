use assert_cmd::Command;
use predicates::prelude::*;

fn board_cmd(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipeline-board").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PIPELINE_BOARD_SERVER__BASE_URL")
        .env_remove("PIPELINE_BOARD_PIPELINE__FILE")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Client for the production pipeline board"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_no_subcommand_explains_usage() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline Board"));
}

#[test]
fn test_check_config_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Linha de Produção"))
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_check_config_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("pipeline-board.toml"),
        "[server]\nbase_url = \"http://board.local:5001\"\n\n[capture]\ndue_date_presets = [10, 20]\n",
    )
    .unwrap();

    board_cmd(&dir)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://board.local:5001"))
        .stdout(predicate::str::contains("[10, 20]"));
}

#[test]
fn test_missing_pipeline_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .env("PIPELINE_BOARD_PIPELINE__FILE", "does-not-exist.toml")
        .arg("check-config")
        .assert()
        .code(78)
        .stderr(predicate::str::contains("❌"));
}

#[test]
fn test_unknown_status_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .args(["status", "7", "Arquivado"])
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_server_exits_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    board_cmd(&dir)
        .args(["board", "--server", "http://127.0.0.1:9"])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("❌"));
}
