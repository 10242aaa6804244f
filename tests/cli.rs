//! End-to-end tests running the built binary against a scripted `drbdsetup`.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const BIN: &str = env!("CARGO_BIN_EXE_drbd-shutdown-guard");

struct FakeDrbd {
    _dir: TempDir,
    script: PathBuf,
    calls: PathBuf,
}

impl FakeDrbd {
    /// `status` prints `status` and exits with `status_exit`; `secondary` fails for `failing`
    fn new(status: &str, status_exit: i32, failing: &str) -> Self {
        let dir = tempdir().unwrap();
        let calls = dir.path().join("calls");
        let script = dir.path().join("drbdsetup");
        let body = format!(
            "#!/bin/sh
echo \"$@\" >> '{calls}'
case \"$1\" in
  status) printf '%s' '{status}'; exit {status_exit} ;;
  secondary) [ \"$3\" = '{failing}' ] && {{ echo \"$3: State change failed\" >&2; exit 11; }} ;;
esac
exit 0
",
            calls = calls.display(),
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            _dir: dir,
            script,
            calls,
        }
    }

    fn calls(&self) -> Vec<String> {
        let mut lines: Vec<String> = std::fs::read_to_string(&self.calls)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect();
        lines.sort();
        lines
    }
}

fn run(args: &[&str], drbdsetup: Option<&Path>) -> Output {
    let mut cmd = Command::new(BIN);
    cmd.args(args).env_remove("RUST_LOG").env_remove("DRBDSETUP_LOCATION");
    if let Some(path) = drbdsetup {
        cmd.env("DRBDSETUP_LOCATION", path);
    }
    cmd.output().unwrap()
}

#[test]
fn execute_demotes_every_resource() {
    let drbd = FakeDrbd::new(r#"[{"name":"res0"},{"name":"res1"}]"#, 0, "");

    let out = run(&["execute"], Some(&drbd.script));

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        drbd.calls(),
        vec!["secondary --force res0", "secondary --force res1", "status --json"]
    );
}

#[test]
fn execute_reports_failed_resource() {
    let drbd = FakeDrbd::new(r#"[{"name":"res0"},{"name":"res1"}]"#, 0, "res1");

    let out = run(&["execute"], Some(&drbd.script));

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("'res1'"), "stderr: {stderr}");
    assert!(drbd.calls().contains(&"secondary --force res0".to_string()));
}

#[test]
fn execute_fails_when_status_fails() {
    let drbd = FakeDrbd::new("", 20, "");

    let out = run(&["execute"], Some(&drbd.script));

    assert!(!out.status.success());
    assert_eq!(drbd.calls(), vec!["status --json"]);
}

#[test]
fn execute_with_no_resources() {
    let drbd = FakeDrbd::new("[]", 0, "");

    let out = run(&["execute"], Some(&drbd.script));

    assert!(out.status.success());
    assert_eq!(drbd.calls(), vec!["status --json"]);
}

#[test]
fn commands_require_drbdsetup_location() {
    for command in ["execute", "install"] {
        let out = run(&[command], None);
        assert!(!out.status.success());
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("DRBDSETUP_LOCATION"), "{command}: {stderr}");
    }
}

#[test]
fn commands_reject_arguments() {
    let out = run(&["execute", "extra"], None);
    assert!(!out.status.success());
}
