use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PipelineError, PipelineResult};

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> PipelineResult<String> {
    let output = spawn(program, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let command = format_command(program, args);
        eprintln!("stderr: {stderr}");
        Err(PipelineError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

/// Run a command and capture its output, killing the process if it
/// does not exit before the deadline.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> PipelineResult<String> {
    run_with_timeout_raw(program, args, timeout).map(|s| s.trim().to_string())
}

/// Like [`run_with_timeout`], but preserve stdout exactly as produced.
/// Remote file reads depend on byte-identical content.
pub fn run_with_timeout_raw(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> PipelineResult<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::CommandNotFound(program.to_string())
            } else {
                PipelineError::Io(e)
            }
        })?;

    // Drain the pipes on separate threads so a chatty child cannot
    // fill the pipe buffer and stall while we poll for exit.
    let stdout_handle = child.stdout.take().map(|mut s| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = s.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_handle = child.stderr.take().map(|mut s| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = s.read_to_end(&mut buf);
            buf
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PipelineError::CommandTimeout {
                command: format_command(program, args),
                timeout,
            });
        }
        thread::sleep(Duration::from_millis(50));
    };

    let stdout = stdout_handle.map_or_else(Vec::new, |h| h.join().unwrap_or_default());
    let stderr = stderr_handle.map_or_else(Vec::new, |h| h.join().unwrap_or_default());

    if status.success() {
        Ok(String::from_utf8_lossy(&stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        eprintln!("stderr: {stderr}");
        Err(PipelineError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Run a command with stdin/stdout/stderr inherited (interactive).
pub fn run_interactive(program: &str, args: &[&str]) -> PipelineResult<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::CommandNotFound(program.to_string())
            } else {
                PipelineError::Io(e)
            }
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Run a command that pipes its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> PipelineResult<String> {
    use std::io::Write;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::CommandNotFound(program.to_string())
            } else {
                PipelineError::Io(e)
            }
        })?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        eprintln!("stderr: {stderr}");
        Err(PipelineError::CommandFailed {
            command: format_command(program, args),
            status: output.status,
        })
    }
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn spawn(program: &str, args: &[&str]) -> PipelineResult<Output> {
    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::CommandNotFound(program.to_string())
            } else {
                PipelineError::Io(e)
            }
        })
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run("echo", &["hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn timeout_kills_slow_command() {
        let err = run_with_timeout("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, PipelineError::CommandTimeout { .. }));
    }

    #[test]
    fn timeout_passes_fast_command() {
        let out = run_with_timeout("echo", &["ok"], Duration::from_secs(5)).unwrap();
        assert_eq!(out, "ok");
    }

    #[test]
    fn raw_preserves_trailing_newline() {
        let out = run_with_timeout_raw("echo", &["line"], Duration::from_secs(5)).unwrap();
        assert_eq!(out, "line\n");
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = run("definitely-not-a-real-program", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::CommandNotFound(_)));
    }
}
