//! Test driver for cmdopt end-to-end tests.
//!
//! Spawns a host binary (normally `optdump`) with:
//! - stdout: a pipe, captured for assertions
//! - stderr: a pipe, captured for assertions
//! - a clean `RUST_LOG` unless the test sets one

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/// A running host process.
pub struct TestSession {
    child: Child,
    /// Captured stdout, populated by background thread.
    stdout_capture: Arc<Mutex<Vec<u8>>>,
    /// Captured stderr, populated by background thread.
    stderr_capture: Arc<Mutex<Vec<u8>>>,
    /// Join handle for stdout drain thread.
    _stdout_thread: thread::JoinHandle<()>,
    /// Join handle for stderr drain thread.
    _stderr_thread: thread::JoinHandle<()>,
}

impl TestSession {
    /// Spawn `binary` with the given arguments.
    ///
    /// `args` become argv[1..]; `env` are additional environment variables.
    pub fn spawn(
        binary: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> std::io::Result<TestSession> {
        let mut cmd = Command::new(binary);
        cmd.args(args);
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("OPTDUMP_STRICT");
        for (k, v) in env {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stdout_capture = Arc::new(Mutex::new(Vec::new()));
        let stdout_thread = drain(child.stdout.take(), Arc::clone(&stdout_capture));

        let stderr_capture = Arc::new(Mutex::new(Vec::new()));
        let stderr_thread = drain(child.stderr.take(), Arc::clone(&stderr_capture));

        Ok(TestSession {
            child,
            stdout_capture,
            stderr_capture,
            _stdout_thread: stdout_thread,
            _stderr_thread: stderr_thread,
        })
    }

    /// Wait for the child to exit and assert the exit code.
    pub fn wait_exit(mut self, expected_code: i32) -> SessionOutput {
        let status = self.child.wait().expect("failed to wait for child");
        let code = status.code().unwrap_or(-1);

        // Capture threads finish once the child's pipes close.
        let _ = self._stdout_thread.join();
        let _ = self._stderr_thread.join();

        let stdout = String::from_utf8_lossy(&self.stdout_capture.lock().unwrap()).to_string();
        let stderr = String::from_utf8_lossy(&self.stderr_capture.lock().unwrap()).to_string();

        assert_eq!(
            code, expected_code,
            "expected exit code {expected_code}, got {code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );

        SessionOutput { stdout, stderr }
    }
}

/// Background thread copying a child pipe into `capture` until EOF.
fn drain<R>(pipe: Option<R>, capture: Arc<Mutex<Vec<u8>>>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    capture.lock().unwrap().extend_from_slice(&buf[..n]);
                }
                Err(e) => {
                    eprintln!("drain error: {e}");
                    break;
                }
            }
        }
    })
}

/// Output captured from a completed session.
pub struct SessionOutput {
    pub stdout: String,
    pub stderr: String,
}

impl SessionOutput {
    /// The `name: ...` line of an optdump report, without the prefix.
    pub fn field(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}: ");
        self.stdout
            .lines()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
    }
}
