//! Integration tests for Makes

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn m() -> Command {
        let mut cmd = cargo_bin_cmd!("m");
        cmd.env("NIX_UNSTABLE", "1")
            .env_remove("K8S_COMPAT")
            .env_remove("__MAKES_SRC__");
        cmd
    }

    #[test]
    fn help_displays() {
        m().arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("[SOURCE]"));
    }

    #[test]
    fn no_arguments_prints_usage() {
        m().assert()
            .code(1)
            .stderr(predicate::str::contains("Usage: m [SOURCE] [OUTPUT] [ARGS]..."))
            .stderr(predicate::str::contains("$ m github:owner/repo@rev"));
    }

    #[test]
    fn banner_and_feature_flags() {
        m().env("K8S_COMPAT", "1")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Makes v21.10-"))
            .stderr(predicate::str::contains("Using feature flag: K8S_COMPAT"))
            .stderr(predicate::str::contains("Using feature flag: NIX_UNSTABLE"));
    }

    #[test]
    fn unparseable_source() {
        m().args(["bitbucket:owner/repo@main"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[ERROR]"))
            .stderr(predicate::str::contains(
                "Unable to parse [SOURCE]: bitbucket:owner/repo@main",
            ));
    }

    #[test]
    fn version_displays() {
        m().arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("21.10"));
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        m().arg("-x").assert().code(1);
        m().args([".", "-x"]).assert().code(1);
    }

    #[test]
    fn stable_mode_without_makes_src() {
        m().env_remove("NIX_UNSTABLE")
            .arg(".")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("__MAKES_SRC__"));
    }
}

#[cfg(unix)]
mod pipeline_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::process;
    use tempfile::TempDir;

    /// Stand-in for `nix-build`: answers introspection from fixed JSON,
    /// builds `/hello` into a directory with an action script and fails
    /// every other output with code 7.
    const FAKE_NIX_BUILD: &str = r##"#!/bin/sh
attr=""; out=""; project=""
while [ $# -gt 0 ]; do
  case "$1" in
    --attr) attr="$2"; shift 2 ;;
    --out-link) out="$2"; shift 2 ;;
    --argstr)
      if [ "$2" = projectSrc ]; then project="$3"; fi
      shift 3 ;;
    *) shift ;;
  esac
done
case "$attr" in
  config.attrs)
    if [ -n "$FAKE_ATTRS_FAIL" ]; then
      echo "attrs evaluation failed" >&2
      exit 1
    fi
    printf '%s' '["__all__","/fail","/hello","/secretsForAwsFromEnv/__default__"]' > "$out" ;;
  config.cacheAsJson)
    printf '%s' "${FAKE_CACHE_JSON:-[]}" > "$out" ;;
  'config.outputs."/hello"')
    ls -A "$project" > "$MAKES_TEST_RECORD/files"
    cp "$project/a.txt" "$MAKES_TEST_RECORD/a.txt"
    mkdir -p "$out"
    cat > "$out/makes-action.sh" <<'ACTION'
#!/bin/sh
printf '%s\n' "$@" > "$MAKES_TEST_RECORD/action-args"
exit 3
ACTION
    chmod +x "$out/makes-action.sh" ;;
  *)
    echo "no such output: $attr" >&2
    exit 7 ;;
esac
"##;

    const FAKE_CACHIX: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$MAKES_TEST_RECORD/cachix-args"
"#;

    struct Fixture {
        _root: TempDir,
        repo: PathBuf,
        bin: PathBuf,
        home: PathBuf,
        makes_src: PathBuf,
        record: PathBuf,
    }

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn git(repo: &Path, args: &[&str]) {
        let status = process::Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(["-c", "user.name=Makes", "-c", "user.email=makes@example.com"])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    impl Fixture {
        /// A committed repository with one file of each kind of local change
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let repo = root.path().join("repo");
            let prefix = root.path().join("nix");
            let bin = prefix.join("bin");
            let home = root.path().join("home");
            let makes_src = root.path().join("makes-src");
            let record = root.path().join("record");
            for dir in [&repo, &bin, &home, &makes_src, &record] {
                fs::create_dir_all(dir).unwrap();
            }

            write_script(&bin.join("nix-build"), FAKE_NIX_BUILD);
            write_script(&bin.join("cachix"), FAKE_CACHIX);

            git(&repo, &["init", "-q"]);
            fs::write(repo.join("a.txt"), "committed\n").unwrap();
            fs::write(repo.join("b.txt"), "doomed\n").unwrap();
            git(&repo, &["add", "a.txt", "b.txt"]);
            git(&repo, &["commit", "-q", "-m", "initial"]);

            fs::write(repo.join("a.txt"), "modified\n").unwrap();
            fs::remove_file(repo.join("b.txt")).unwrap();
            fs::write(repo.join("c.txt"), "staged\n").unwrap();
            git(&repo, &["add", "c.txt"]);
            fs::write(repo.join("d.txt"), "untracked\n").unwrap();

            Self {
                _root: root,
                repo,
                bin,
                home,
                makes_src,
                record,
            }
        }

        fn m(&self) -> Command {
            let path = format!(
                "{}:{}",
                self.bin.display(),
                std::env::var("PATH").unwrap_or_default()
            );
            let mut cmd = cargo_bin_cmd!("m");
            cmd.current_dir(&self.repo)
                .env("PATH", path)
                .env("HOME_IMPURE", &self.home)
                .env("__NIX_STABLE__", self.bin.parent().unwrap())
                .env("__MAKES_SRC__", &self.makes_src)
                .env("MAKES_TEST_RECORD", &self.record)
                .env_remove("NIX_UNSTABLE")
                .env_remove("K8S_COMPAT")
                .env_remove("CACHIX_AUTH_TOKEN")
                .env_remove("FAKE_CACHE_JSON")
                .env_remove("FAKE_ATTRS_FAIL");
            cmd
        }

        fn recorded(&self, name: &str) -> Option<String> {
            fs::read_to_string(self.record.join(name)).ok()
        }
    }

    #[test]
    fn source_only_lists_visible_outputs() {
        let fx = Fixture::new();
        fx.m()
            .arg(".")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[SOURCE] is currently: ."))
            .stderr(predicate::str::contains("[OUTPUT] can be:\n  /fail\n  /hello"))
            .stderr(predicate::str::contains("__all__").not())
            .stderr(predicate::str::contains("secretsForAwsFromEnv").not());
    }

    #[test]
    fn failed_listing_reports_captured_output() {
        let fx = Fixture::new();
        fx.m()
            .arg(".")
            .env("FAKE_ATTRS_FAIL", "1")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[SOURCE] is currently: ."))
            .stderr(predicate::str::contains("Unable to list project outputs from: ."))
            .stderr(predicate::str::contains("attrs evaluation failed"))
            .stderr(predicate::str::contains("[ARGS] are passed").not());
    }

    #[test]
    fn unknown_output_lists_outputs() {
        let fx = Fixture::new();
        fx.m()
            .args([".", "/nope"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("  /hello"));
        assert!(fx.recorded("action-args").is_none());
    }

    #[test]
    fn build_failure_code_propagates() {
        let fx = Fixture::new();
        fx.m()
            .args([".", "/fail", "--x"])
            .assert()
            .code(7)
            .stderr(predicate::str::contains("no such output"));
        assert!(fx.recorded("action-args").is_none());
    }

    #[test]
    fn action_receives_output_and_arguments() {
        let fx = Fixture::new();
        fx.m().args([".", "/hello", "--x", "y"]).assert().code(3);

        let recorded = fx.recorded("action-args").unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(args.len(), 3);
        assert!(args[0].ends_with("result-hello"));
        assert_eq!(&args[1..], ["--x", "y"]);

        // Scratch directories are gone once the run finishes
        assert!(!Path::new(args[0]).exists());
    }

    #[test]
    fn checkout_carries_local_changes_only() {
        let fx = Fixture::new();
        fx.m().args([".", "/hello"]).assert().code(3);

        let files = fx.recorded("files").unwrap();
        let files: Vec<&str> = files.lines().collect();
        assert!(files.contains(&"a.txt"));
        assert!(files.contains(&"c.txt"));
        assert!(!files.contains(&"b.txt"));
        assert!(!files.contains(&"d.txt"));
        assert!(!files.contains(&".git"));
        assert_eq!(fx.recorded("a.txt").unwrap(), "modified\n");
    }

    #[test]
    fn pushes_to_cachix_when_token_present() {
        let fx = Fixture::new();
        fx.m()
            .args([".", "/hello"])
            .env("CACHIX_AUTH_TOKEN", "secret")
            .env(
                "FAKE_CACHE_JSON",
                r#"[{"type":"cachix","name":"demo","url":"https://demo.cachix.org","pubKey":"demo.cachix.org-1:key"}]"#,
            )
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Pushing to cache"));

        let recorded = fx.recorded("cachix-args").unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(&args[..4], ["push", "-c", "0", "demo"]);
        assert!(args[4].ends_with("result-hello"));
    }

    #[test]
    fn no_push_without_token() {
        let fx = Fixture::new();
        fx.m()
            .args([".", "/hello"])
            .env(
                "FAKE_CACHE_JSON",
                r#"[{"type":"cachix","name":"demo","url":"https://demo.cachix.org","pubKey":"demo.cachix.org-1:key"}]"#,
            )
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Pushing to cache").not());
        assert!(fx.recorded("cachix-args").is_none());
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let fx = Fixture::new();
        fx.m()
            .args([".", "/hello"])
            .env("FAKE_CACHE_JSON", "{not json")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[ERROR]"));
        assert!(fx.recorded("action-args").is_none());
    }
}
