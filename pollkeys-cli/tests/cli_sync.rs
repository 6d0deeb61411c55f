use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, sleep};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

type Remote = Arc<Mutex<(u16, Vec<u8>)>>;

/// Minimal HTTP/1.1 server answering every request with the current
/// `(status, body)`. Lives until the test process exits.
fn serve(remote: Remote) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            read_request_head(&mut stream);
            let (status, body) = remote.lock().expect("lock").clone();
            let reason = if status == 200 { "OK" } else { "Error" };
            let head = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}/authorized_keys")
}

fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => head.push(byte[0]),
            _ => break,
        }
    }
}

fn remote(status: u16, body: &str) -> Remote {
    Arc::new(Mutex::new((status, body.as_bytes().to_vec())))
}

fn pollkeys(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pollkeys").expect("pollkeys binary");
    cmd.env("HOME", home.path()).env("RUST_LOG", "info");
    cmd
}

fn seed(dir: &TempDir, content: &str) -> PathBuf {
    let target = dir.path().join("authorized_keys");
    fs::write(&target, content).expect("seed target");
    target
}

#[test]
fn go_style_flags_replace_changed_target() {
    let dir = TempDir::new().unwrap();
    let url = serve(remote(200, "key-A\n"));
    let target = seed(&dir, "key-B\n");

    pollkeys(&dir)
        .arg("-remote")
        .arg(&url)
        .arg("-path")
        .arg(&target)
        .arg("-temp")
        .arg(dir.path().join("keys.txt"))
        .assert()
        .success()
        .stderr(predicate::str::contains("changes detected"))
        .stderr(predicate::str::contains("overwritten"));

    assert_eq!(fs::read_to_string(&target).unwrap(), "key-A\n");
}

#[test]
fn identical_target_reports_no_changes() {
    let dir = TempDir::new().unwrap();
    let url = serve(remote(200, "same\n"));
    let target = seed(&dir, "same\n");

    pollkeys(&dir)
        .args(["--remote", url.as_str()])
        .arg("--path")
        .arg(&target)
        .arg("--temp")
        .arg(dir.path().join("keys.txt"))
        .assert()
        .success()
        .stderr(predicate::str::contains("no changes necessary"));

    assert_eq!(fs::read_to_string(&target).unwrap(), "same\n");
}

#[test]
fn failed_download_exits_non_zero_and_keeps_target() {
    let dir = TempDir::new().unwrap();
    let url = serve(remote(500, "boom"));
    let target = seed(&dir, "keep\n");

    pollkeys(&dir)
        .args(["--remote", url.as_str()])
        .arg("--path")
        .arg(&target)
        .arg("--temp")
        .arg(dir.path().join("keys.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to download"));

    assert_eq!(fs::read_to_string(&target).unwrap(), "keep\n");
}

#[test]
fn missing_target_fails_unless_create_missing() {
    let dir = TempDir::new().unwrap();
    let url = serve(remote(200, "key\n"));
    let target = dir.path().join("nested").join("authorized_keys");
    let temp = dir.path().join("keys.txt");

    pollkeys(&dir)
        .args(["--remote", url.as_str()])
        .arg("--path")
        .arg(&target)
        .arg("--temp")
        .arg(&temp)
        .assert()
        .code(1);
    assert!(!target.exists());

    pollkeys(&dir)
        .args(["--remote", url.as_str(), "--create-missing", "--atomic"])
        .arg("--path")
        .arg(&target)
        .arg("--temp")
        .arg(&temp)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&target).unwrap(), "key\n");
}

#[test]
fn missing_remote_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    pollkeys(&dir)
        .args(["-path", "/tmp/never-written"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote url required"));
}

#[test]
fn invalid_perms_and_interval_are_configuration_errors() {
    let dir = TempDir::new().unwrap();
    pollkeys(&dir)
        .args(["-remote", "http://127.0.0.1:9/k", "-path", "/tmp/x", "-perms", "rw-r--r--"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("permissions"));

    pollkeys(&dir)
        .args(["-remote", "http://127.0.0.1:9/k", "-path", "/tmp/x", "-interval", "often"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn path_defaults_to_ssh_authorized_keys_under_home() {
    let home = TempDir::new().unwrap();
    let url = serve(remote(200, "ssh-ed25519 AAAA deploy\n"));
    let ssh = home.path().join(".ssh");
    fs::create_dir_all(&ssh).unwrap();
    fs::write(ssh.join("authorized_keys"), "").unwrap();

    pollkeys(&home)
        .args(["-remote", url.as_str()])
        .arg("-temp")
        .arg(home.path().join("keys.txt"))
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(ssh.join("authorized_keys")).unwrap(),
        "ssh-ed25519 AAAA deploy\n"
    );
}

#[test]
fn config_file_supplies_values() {
    let dir = TempDir::new().unwrap();
    let url = serve(remote(200, "from-config\n"));
    let target = seed(&dir, "old\n");
    let config = dir.path().join("pollkeys.yaml");
    fs::write(
        &config,
        format!(
            "remote: {url}\npath: {}\ntemp: {}\nperms: \"0600\"\n",
            target.display(),
            dir.path().join("keys.txt").display()
        ),
    )
    .unwrap();

    pollkeys(&dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&target).unwrap(), "from-config\n");
}

struct Running(Child);

impl Drop for Running {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn wait_for(path: &Path, expected: &str, limit: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if fs::read_to_string(path).map(|s| s == expected).unwrap_or(false) {
            return true;
        }
        sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn looped_mode_survives_failures_and_picks_up_changes() {
    let dir = TempDir::new().unwrap();
    let state = remote(503, "unavailable");
    let url = serve(state.clone());
    let target = seed(&dir, "key-0\n");

    let bin = assert_cmd::cargo::cargo_bin("pollkeys");
    let child = std::process::Command::new(bin)
        .env("HOME", dir.path())
        .env("RUST_LOG", "info")
        .arg("-remote")
        .arg(&url)
        .arg("-path")
        .arg(&target)
        .arg("-temp")
        .arg(dir.path().join("keys.txt"))
        .arg("-interval")
        .arg("100ms")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn pollkeys");
    let mut running = Running(child);

    sleep(Duration::from_millis(400));
    assert!(
        running.0.try_wait().expect("try_wait").is_none(),
        "poller exited after a failed cycle"
    );
    assert_eq!(fs::read_to_string(&target).unwrap(), "key-0\n");

    *state.lock().unwrap() = (200, b"key-1\n".to_vec());
    assert!(
        wait_for(&target, "key-1\n", Duration::from_secs(10)),
        "target never picked up the new remote content"
    );
    assert!(running.0.try_wait().expect("try_wait").is_none());
}
