//! Process-level tests for the server binary

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_xlang-testing-server");

fn free_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}

#[test]
fn test_serves_on_configured_port() {
    let port = free_port();
    let mut child = Command::new(BIN)
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .env_remove("RUST_LOG")
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn server");

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut connected = false;
    while Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            connected = true;
            break;
        }
        if let Some(status) = child.try_wait().unwrap() {
            panic!("server exited early with {status}");
        }
        thread::sleep(Duration::from_millis(50));
    }

    child.kill().unwrap();
    child.wait().unwrap();
    assert!(connected, "server never accepted a connection on port {port}");
}

#[test]
fn test_announces_readiness_on_stdout() {
    let port = free_port();
    let mut child = Command::new(BIN)
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn server");

    let mut line = String::new();
    let stdout = child.stdout.take().unwrap();
    BufReader::new(stdout).read_line(&mut line).unwrap();

    // Listening by the time the line is printed
    let connected = TcpStream::connect(("127.0.0.1", port)).is_ok();

    child.kill().unwrap();
    child.wait().unwrap();
    assert_eq!(line.trim_end(), format!("Server listening on 127.0.0.1:{port}"));
    assert!(connected);
}

#[test]
fn test_port_in_use_exits_nonzero() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let output = Command::new(BIN)
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .output()
        .expect("run server");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: failed to bind"), "stderr: {stderr}");
}

#[test]
fn test_invalid_host_exits_nonzero() {
    let output = Command::new(BIN)
        .args(["--host", "not-an-address", "--port", "0"])
        .output()
        .expect("run server");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid listen address"), "stderr: {stderr}");
}

#[test]
fn test_bad_config_file_exits_nonzero() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let output = Command::new(BIN)
        .arg("--config")
        .arg(file.path())
        .output()
        .expect("run server");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "stderr: {stderr}");
}
