use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use claude_sessions::test_support::ClaudeHome;
use insta::assert_snapshot;

#[test]
fn unmatched_query_snapshot() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = ClaudeHome::create(temp.child("claude").path())?;
    home.add_prompt(
        "0f0f0f0f-1111-4222-8333-444444444444",
        "/home/dev/site",
        "tune the cache",
        1_700_000_000_000,
    )?;
    let config_dir = temp.child("config");
    config_dir.create_dir_all()?;

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cs")?;
    let assert = cmd
        .env("CS_CONFIG_DIR", config_dir.path())
        .env_remove("RUST_LOG")
        .arg("--history-path")
        .arg(home.history_path())
        .arg("--projects-dir")
        .arg(home.projects_dir())
        .arg("--temp-dir")
        .arg(home.temp_dir())
        .args(["query", "zzz"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert_snapshot!(stdout, @r#"
No matching sessions
    No sessions matching "zzz"
"#);
    temp.close()?;
    Ok(())
}
