use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use claude_sessions::test_support::{ClaudeHome, assistant_record, user_record};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::{Value, json};

const LIVE: &str = "11111111-aaaa-4bbb-8ccc-000000000001";
const EXPIRED: &str = "22222222-bbbb-4ccc-8ddd-000000000002";

fn seed(temp: &TempDir) -> color_eyre::Result<ClaudeHome> {
    let home = ClaudeHome::create(temp.child("claude").path())?;
    home.add_prompt(LIVE, "/work/alpha", "refactor the parser module", 1_717_000_000_000)?;
    home.add_prompt(LIVE, "/work/alpha", "now add tests", 1_717_000_060_000)?;
    home.add_prompt(EXPIRED, "/work/beta", "beta prompt", 1_716_000_000_000)?;
    home.write_index("/work/alpha", &[(LIVE, "Refactor the parser")])?;
    home.write_transcript(
        "/work/alpha",
        LIVE,
        &[
            user_record("hello"),
            assistant_record(json!([{ "type": "tool_use", "id": "t1", "name": "Read", "input": {} }])),
        ],
    )?;
    Ok(home)
}

#[allow(deprecated)]
fn base_command(temp: &TempDir, home: &ClaudeHome) -> Command {
    let mut cmd = Command::cargo_bin("cs").expect("cs binary available");
    let config_dir = temp.child("config-root");
    config_dir.create_dir_all().unwrap();
    cmd.env("CS_CONFIG_DIR", config_dir.path());

    let user_home = temp.child("home");
    user_home.create_dir_all().unwrap();
    cmd.env("HOME", user_home.path());
    cmd.env("SHELL", "zsh");
    cmd.env_remove("RUST_LOG");

    cmd.arg("--history-path")
        .arg(home.history_path())
        .arg("--projects-dir")
        .arg(home.projects_dir())
        .arg("--temp-dir")
        .arg(home.temp_dir());
    cmd
}

fn json_stdout(cmd: &mut Command) -> color_eyre::Result<Value> {
    let output = cmd.output()?;
    if !output.status.success() {
        eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success());
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn empty_query_returns_overview_item() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    let items = json_stdout(base_command(&temp, &home).args(["--json", "query"]))?;
    let items = items.as_array().expect("array of items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "View all sessions (2, 1 resumable)");
    assert_eq!(items[0]["action"]["kind"], "open_url");

    let page = std::fs::read_to_string(home.temp_dir().join("claude-sessions.html"))?;
    assert_eq!(page.matches(r#"class="expired""#).count(), 1);
    assert!(page.contains("Refactor the parser"));
    temp.close()?;
    Ok(())
}

#[test]
fn bare_invocation_behaves_like_query() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    base_command(&temp, &home)
        .assert()
        .success()
        .stdout(contains("View all sessions (2, 1 resumable)"))
        .stdout(contains("open: file://"));
    temp.close()?;
    Ok(())
}

#[test]
fn query_only_searches_resumable_sessions() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    let none = json_stdout(base_command(&temp, &home).args(["--json", "query", "beta"]))?;
    assert_eq!(none, json!([{
        "name": "No matching sessions",
        "description": "No sessions matching \"beta\"",
        "action": { "kind": "nothing" },
    }]));

    let found = json_stdout(base_command(&temp, &home).args(["--json", "query", "PARSER"]))?;
    let found = found.as_array().expect("array of items");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0]["name"], "Refactor the parser");
    assert_eq!(found[0]["action"]["kind"], "resume");
    assert_eq!(found[0]["action"]["session_id"], LIVE);
    assert_eq!(found[1]["name"], "└ View transcript");
    temp.close()?;
    Ok(())
}

#[test]
fn resume_dry_run_prints_terminal_command() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    base_command(&temp, &home)
        .args(["resume", "11111111", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("gnome-terminal -- zsh -ic"))
        .stdout(contains(format!("claude --resume {LIVE}; exec zsh")));
    temp.close()?;
    Ok(())
}

#[test]
fn resume_rejects_expired_session() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    base_command(&temp, &home)
        .args(["resume", EXPIRED, "--dry-run"])
        .assert()
        .code(4)
        .stderr(contains("cannot be resumed"));
    temp.close()?;
    Ok(())
}

#[test]
fn unknown_session_exits_with_not_found() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    base_command(&temp, &home)
        .args(["open", "ffffffff", "--no-browser"])
        .assert()
        .code(3)
        .stderr(contains("cs: session 'ffffffff' not found"));
    temp.close()?;
    Ok(())
}

#[test]
fn open_renders_transcript_page() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    let payload = json_stdout(base_command(&temp, &home).args([
        "--json",
        "open",
        LIVE,
        "--no-browser",
    ]))?;
    let path = payload["path"].as_str().expect("path string");
    assert!(path.ends_with("claude-transcript-11111111.html"));

    let page = std::fs::read_to_string(path)?;
    assert!(page.contains("<pre>hello</pre>"));
    assert!(page.contains("[Tool: Read]"));
    temp.close()?;
    Ok(())
}

#[test]
fn list_reports_topics_and_status() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    let sessions = json_stdout(base_command(&temp, &home).args(["--json", "list"]))?;
    let sessions = sessions.as_array().expect("array of sessions");
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["session_id"], LIVE);
    assert_eq!(sessions[0]["topic"], "Refactor the parser");
    assert_eq!(sessions[0]["messages"], 2);
    assert_eq!(sessions[0]["resumable"], true);
    assert_eq!(sessions[1]["topic"], "beta prompt");
    assert_eq!(sessions[1]["resumable"], false);

    base_command(&temp, &home)
        .args(["list", "--resumable"])
        .assert()
        .success()
        .stdout(contains("11111111"))
        .stdout(contains("22222222").not());
    temp.close()?;
    Ok(())
}

#[test]
fn missing_history_degrades_to_empty_overview() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = ClaudeHome::create(temp.child("empty").path())?;

    base_command(&temp, &home)
        .arg("query")
        .assert()
        .success()
        .stdout(contains("View all sessions (0, 0 resumable)"));
    temp.close()?;
    Ok(())
}

#[test]
fn config_file_supplies_paths() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;
    let config_dir = temp.child("custom-config");
    config_dir.create_dir_all()?;
    config_dir.child("config.toml").write_str(&format!(
        "historyPath = \"{}\"\nprojectsDir = \"{}\"\ntempDir = \"{}\"\n",
        claude_sessions::test_support::toml_path(&home.history_path()),
        claude_sessions::test_support::toml_path(&home.projects_dir()),
        claude_sessions::test_support::toml_path(&home.temp_dir()),
    ))?;

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cs")?;
    cmd.env_remove("RUST_LOG")
        .arg("--config-dir")
        .arg(config_dir.path())
        .args(["list", "--resumable"])
        .assert()
        .success()
        .stdout(contains("Refactor the parser"));
    temp.close()?;
    Ok(())
}

#[test]
fn invalid_config_is_reported() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;
    temp.child("config-root")
        .child("config.toml")
        .write_str("[search]\nlimit = 0\n")?;

    base_command(&temp, &home)
        .args(["config", "where"])
        .assert()
        .failure()
        .stderr(contains("invalid configuration"))
        .stderr(contains("search.limit must be at least 1"));
    temp.close()?;
    Ok(())
}

#[test]
fn config_where_lists_sources() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;
    let conf_d = temp.child("config-root").child("conf.d");
    conf_d.create_dir_all()?;
    conf_d.child("10-search.toml").write_str("[search]\nlimit = 4\n")?;

    base_command(&temp, &home)
        .args(["config", "where"])
        .assert()
        .success()
        .stdout(contains("Configuration directory:"))
        .stdout(contains("10-search.toml (drop-in)"));
    temp.close()?;
    Ok(())
}

#[test]
fn doctor_reports_paths_and_session_counts() -> color_eyre::Result<()> {
    let temp = TempDir::new()?;
    let home = seed(&temp)?;

    base_command(&temp, &home)
        .arg("doctor")
        .assert()
        .success()
        .stdout(contains("✔ history log"))
        .stdout(contains("✔ projects directory"))
        .stdout(contains("Sessions: 2 (1 resumable)"));
    temp.close()?;
    Ok(())
}
