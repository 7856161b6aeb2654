use std::fs;
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn muse_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("muse-status"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_RUNTIME_DIR", home.join("run"));
    cmd
}

fn write_config(home: &Path, body: &str) -> PathBuf {
    let path = home.join("config").join("muse-status").join("config.yaml");
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, body).expect("write config");
    path
}

struct DaemonProcess {
    child: Child,
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_for(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !path.exists() {
        assert!(Instant::now() < deadline, "daemon never bound {}", path.display());
        sleep(Duration::from_millis(20));
    }
}

#[test]
fn notify_without_daemon_reports_not_running() {
    let home = TempDir::new().expect("home");
    muse_cmd(home.path())
        .args(["notify", "volume"])
        .assert()
        .success()
        .stdout(contains("daemon is not running"));
}

#[test]
fn config_prints_paths_and_yaml() {
    let home = TempDir::new().expect("home");
    let path = write_config(
        home.path(),
        "mode: i3\nblocks:\n  left: []\n  center:\n    - kind: date\n  right: []\n",
    );

    muse_cmd(home.path())
        .arg("config")
        .assert()
        .success()
        .stdout(contains(format!("# config: {}", path.display())))
        .stdout(contains("muse-status.sock"))
        .stdout(contains("mode: i3"))
        .stdout(contains("kind: date"));
}

#[test]
fn socket_flag_overrides_default() {
    let home = TempDir::new().expect("home");
    let socket = home.path().join("elsewhere.sock");
    muse_cmd(home.path())
        .args(["config", "--socket"])
        .arg(&socket)
        .assert()
        .success()
        .stdout(contains(format!("# socket: {}", socket.display())));
}

#[test]
fn malformed_config_is_reported() {
    let home = TempDir::new().expect("home");
    write_config(home.path(), "mode: [not, a, mode\n");
    muse_cmd(home.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

#[test]
fn bad_color_flag_is_rejected() {
    let home = TempDir::new().expect("home");
    muse_cmd(home.path())
        .args(["daemon", "--primary-color", "zzz"])
        .assert()
        .failure()
        .stderr(contains("invalid color"));
}

#[test]
fn daemon_serves_listeners_and_accepts_notify() {
    let home = TempDir::new().expect("home");
    write_config(
        home.path(),
        "blocks:\n  left: []\n  center:\n    - kind: date\n  right: []\n",
    );
    let socket = home.path().join("run").join("muse-status.sock");

    let child = muse_cmd(home.path())
        .arg("daemon")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn daemon");
    let _daemon = DaemonProcess { child };
    wait_for(&socket);

    let stream = UnixStream::connect(&socket).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("timeout");
    let mut first = String::new();
    BufReader::new(stream)
        .read_line(&mut first)
        .expect("greeting");
    assert!(first.starts_with("%{c}"), "{first}");

    muse_cmd(home.path())
        .args(["notify", "date"])
        .assert()
        .success()
        .stdout(predicates::str::is_empty());
}
