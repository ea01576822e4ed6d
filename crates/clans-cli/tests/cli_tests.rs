use std::path::Path;

use assert_cmd::Command;
use clans_test_utils::{FakePlans, SUCCESS_MESSAGE};
use predicates::prelude::*;
use tempfile::TempDir;

/// A profile directory whose config points at a fake server.
struct Profile {
    dir: TempDir,
    server: FakePlans,
}

impl Profile {
    fn new(server: FakePlans) -> Self {
        Self::with_config(server, "")
    }

    /// `extra` is appended to the generated clans.toml.
    fn with_config(server: FakePlans, extra: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let config = format!(
            "[login]\nusername = \"baldwint\"\nurl = \"{}\"\n{extra}",
            server.base_url()
        );
        std::fs::write(dir.path().join("clans.toml"), config).expect("Failed to write config");
        Self { dir, server }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cookie(&self) -> std::path::PathBuf {
        self.path().join("baldwint.cookie")
    }

    /// Helper function to run clans against this profile
    fn clans(&self) -> Command {
        let mut cmd = Command::cargo_bin("clans").expect("Failed to find clans binary");
        cmd.env("CLANS_DIR", self.path())
            .env_remove("EDITOR")
            .env_remove("RUST_LOG")
            .current_dir(self.path());
        cmd
    }

    /// Like [`Profile::clans`], with the password supplied.
    fn clans_with_password(&self) -> Command {
        let mut cmd = self.clans();
        cmd.args(["-p", "hunter2"]);
        cmd
    }
}

fn write_plan(profile: &Profile, text: &str) -> std::path::PathBuf {
    let path = profile.path().join("new.plan");
    std::fs::write(&path, text).expect("Failed to write plan file");
    path
}

#[test]
fn test_edit_from_file() {
    let profile = Profile::new(FakePlans::standard().start());
    let file = write_plan(&profile, "a brand new plan");

    profile
        .clans_with_password()
        .args(["edit", "-f"])
        .arg(&file)
        .assert()
        .success()
        .stderr(format!("{SUCCESS_MESSAGE}\n"));

    assert_eq!(
        profile.server.plan("baldwint").as_deref(),
        Some("a brand new plan")
    );
}

#[test]
fn test_failed_login() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans()
        .args(["-p", "wrong", "read", "gorp"])
        .assert()
        .failure()
        .code(1)
        .stderr("Failed to log in as [baldwint].\n");
}

#[test]
fn test_missing_username() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("clans")
        .unwrap()
        .env("CLANS_DIR", dir.path())
        .args(["read", "gorp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No username given"));
}

#[test]
fn test_session_cookie_is_reused() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["read", "gorp"])
        .assert()
        .success();
    assert!(profile.cookie().exists());
    assert_eq!(profile.server.session_count(), 1);

    // No password this time; the saved session is enough.
    profile
        .clans()
        .args(["read", "gorp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("and nobody else"));
    assert_eq!(profile.server.session_count(), 1);
}

#[test]
fn test_logout_removes_cookie() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["read", "gorp"])
        .assert()
        .success();
    assert!(profile.cookie().exists());

    profile
        .clans()
        .args(["--logout", "read", "gorp"])
        .assert()
        .success();
    assert!(!profile.cookie().exists());
}

#[test]
fn test_read_text_format() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["read", "baldwint", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Username: baldwint\n"))
        .stdout(predicate::str::contains("Name: clever catchphrase\n"))
        .stdout(predicate::str::contains("\n\nthis is my plan"));
}

#[test]
fn test_read_missing_plan() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["read", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such user: nobody"));
}

#[test]
fn test_love_text_format() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["love", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[bff]: 1"))
        .stdout(predicate::str::contains("[gorp]: 2"))
        .stdout(predicate::str::contains(" - hi [baldwint]"));
}

#[test]
fn test_search_json_format() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["search", "nobody", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gorp\""))
        .stdout(predicate::str::contains("nobody else"))
        .stdout(predicate::str::contains("\"bff\"").not());
}

#[test]
fn test_watch_json_format() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["watch", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gorp\""))
        .stdout(predicate::str::contains("\"bff\""));
}

#[test]
fn test_list_json_format() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Level 1\""))
        .stdout(predicate::str::contains("\"Level 2\""))
        .stdout(predicate::str::contains("\"baldwint\""));
}

#[test]
fn test_config_dir() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans()
        .args(["config", "--dir"])
        .assert()
        .success()
        .stdout(format!("{}\n", profile.path().display()));
}

#[test]
fn test_backup_to_stdout_skips_update() {
    let profile = Profile::with_config(
        FakePlans::standard().start(),
        "[extensions]\nenabled = [\"backup\"]\n",
    );

    profile
        .clans_with_password()
        .args(["edit", "-b"])
        .assert()
        .success()
        .stdout("this is my plan");
    assert_eq!(
        profile.server.plan("baldwint").as_deref(),
        Some("this is my plan")
    );
}

#[test]
fn test_backup_flags_need_extension() {
    let profile = Profile::new(FakePlans::standard().start());

    profile
        .clans_with_password()
        .args(["edit", "--skip-update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("need the backup extension"));
}

#[test]
fn test_rejected_edit_is_kept() {
    let profile = Profile::new(FakePlans::standard().max_plan_len(20).start());
    let text = "fu".repeat(20);
    let file = write_plan(&profile, &text);

    profile
        .clans_with_password()
        .args(["edit", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sorry, your plan is too long."))
        .stderr(predicate::str::contains(
            "A copy of your unsubmitted edit was stored in baldwint.plan.unsubmitted",
        ));

    let kept = std::fs::read_to_string(profile.path().join("baldwint.plan.unsubmitted")).unwrap();
    assert_eq!(kept, text);
    assert_eq!(
        profile.server.plan("baldwint").as_deref(),
        Some("this is my plan")
    );
}

#[cfg(unix)]
#[test]
fn test_unchanged_plan_is_not_submitted() {
    let profile = Profile::with_config(FakePlans::standard().start(), "[clans]\neditor = \"true\"\n");

    profile
        .clans_with_password()
        .arg("edit")
        .assert()
        .success()
        .stderr("plan unchanged, aborting update\n");
}
