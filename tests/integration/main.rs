//! Integration tests for jsdeps

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn jsdeps() -> Command {
        cargo_bin_cmd!("jsdeps")
    }

    /// jsdeps with an isolated global config, run against `project`
    fn jsdeps_in(project: &Path) -> Command {
        let mut cmd = jsdeps();
        cmd.arg("--config")
            .arg(project.join("global-config.toml"))
            .arg("--project")
            .arg(project)
            .env_remove("JSDEPS_ENGINE");
        cmd
    }

    #[test]
    fn help_displays() {
        jsdeps()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached JavaScript dependency resolution"));
    }

    #[test]
    fn version_displays() {
        jsdeps()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jsdeps"));
    }

    #[test]
    fn config_path_honors_flag() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("global-config.toml"));
    }

    #[test]
    fn config_show() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[install]"))
            .stdout(predicate::str::contains("timeout_secs = 7200"));
    }

    #[test]
    fn config_set_local_is_picked_up() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["config", "set", "--local", "install.timeout_secs", "60"])
            .assert()
            .success();

        assert!(project.path().join("jsdeps.toml").exists());
        jsdeps_in(project.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("timeout_secs = 60"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["config", "set", "install.flavor", "vanilla"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn engine_explicit_kind() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["engine", "--engine", "rhino"])
            .assert()
            .success()
            .stdout(predicate::str::contains("rhino"));
    }

    #[test]
    fn engine_kind_from_environment() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .env("JSDEPS_ENGINE", "phantomjs")
            .arg("engine")
            .assert()
            .success()
            .stdout(predicate::str::contains("phantomjs"));
    }

    #[test]
    fn resolve_without_manifest_removes_modules() {
        let project = TempDir::new().unwrap();
        let stale = project.path().join("node_modules").join("stale");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("index.js"), "old").unwrap();

        jsdeps_in(project.path())
            .arg("resolve")
            .assert()
            .success()
            .stdout(predicate::str::contains("No manifest found"));

        assert!(!project.path().join("node_modules").exists());
    }

    #[test]
    fn embedded_resolve_without_entry_point_fails() {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("package.json"), "{}").unwrap();

        jsdeps_in(project.path())
            .args(["resolve", "--embedded", "--engine", "node"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("install.entry_point"));
    }

    #[test]
    fn cache_status_without_manifest() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["cache", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No manifest"));
    }

    #[test]
    fn cache_clear_without_record() {
        let project = TempDir::new().unwrap();
        jsdeps_in(project.path())
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache record"));
    }

    #[test]
    fn completions_bash() {
        jsdeps()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("jsdeps"));
    }

    #[cfg(unix)]
    mod native_install {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        /// A fake `npm` on PATH that records each call and installs one module
        fn fake_npm(dir: &Path, exit_code: i32) -> PathBuf {
            let bin = dir.join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            let script = bin.join("npm");
            std::fs::write(
                &script,
                format!(
                    "#!/bin/sh\n\
                     echo \"$1\" >> \"$3/calls.log\"\n\
                     mkdir -p \"$3/node_modules/left-pad\"\n\
                     echo module > \"$3/node_modules/left-pad/index.js\"\n\
                     echo \"added 1 package\"\n\
                     echo \"npm warn deprecated\" >&2\n\
                     exit {}\n",
                    exit_code
                ),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

            let path = std::env::var("PATH").unwrap_or_default();
            PathBuf::from(format!("{}:{}", bin.display(), path))
        }

        fn calls(project: &Path) -> usize {
            std::fs::read_to_string(project.join("calls.log"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        #[test]
        fn second_resolve_is_cached() {
            let project = TempDir::new().unwrap();
            let root = project.path().canonicalize().unwrap();
            std::fs::write(root.join("package.json"), r#"{"dependencies": {}}"#).unwrap();
            let path = fake_npm(&root, 0);

            jsdeps_in(&root)
                .env("PATH", &path)
                .arg("resolve")
                .assert()
                .success()
                .stdout(predicate::str::contains("Dependencies installed"));

            jsdeps_in(&root)
                .env("PATH", &path)
                .arg("resolve")
                .assert()
                .success()
                .stdout(predicate::str::contains("Dependencies up to date"));

            assert_eq!(calls(&root), 1);
            assert!(root.join(".jsdeps/cache/resolve.json").exists());
        }

        #[test]
        fn failed_install_is_retried() {
            let project = TempDir::new().unwrap();
            let root = project.path().canonicalize().unwrap();
            std::fs::write(root.join("package.json"), "{}").unwrap();
            let path = fake_npm(&root, 1);

            for _ in 0..2 {
                jsdeps_in(&root)
                    .env("PATH", &path)
                    .arg("resolve")
                    .assert()
                    .failure()
                    .stderr(predicate::str::contains("exit code: 1"));
            }

            assert_eq!(calls(&root), 2);
            assert!(!root.join(".jsdeps/cache/resolve.json").exists());
        }
    }
}
