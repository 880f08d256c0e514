use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::debug;
use which::which;

/// What came back from one run of the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// `None` when the process could not be started or was killed by a signal.
    pub exit_code: Option<i32>,
    /// Interleaved stdout and stderr, or the launch error.
    pub output: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches the transcoder. Implementations must block until it exits.
pub trait Executor: Sync {
    fn execute(&self, program: &Path, args: &[OsString]) -> ProcessResult;
}

/// Runs the real binary as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegExecutor;

impl Executor for FfmpegExecutor {
    fn execute(&self, program: &Path, args: &[OsString]) -> ProcessResult {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                return ProcessResult {
                    exit_code: None,
                    output: format!("failed to spawn {}: {err}", program.display()),
                };
            }
        };

        let (tx, rx) = mpsc::channel();
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(pump_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(pump_lines(stderr, tx.clone()));
        }
        drop(tx);

        let status = child.wait();
        for pump in pumps {
            let _ = pump.join();
        }
        let output = rx.into_iter().collect::<Vec<_>>().join("\n");

        match status {
            Ok(status) => ProcessResult {
                exit_code: status.code(),
                output,
            },
            Err(err) => ProcessResult {
                exit_code: None,
                output: format!("{output}\nfailed to wait for {}: {err}", program.display()),
            },
        }
    }
}

/// Forwards lines from one pipe so both streams land in arrival order.
/// Drains to EOF whatever the bytes are; a closed pipe would kill the child.
fn pump_lines<R: Read + Send + 'static>(
    reader: R,
    tx: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    // keep reading after the receiver is gone
                    let _ = tx.send(line);
                }
            }
        }
    })
}

/// Picks the binary to run: an explicit path wins, otherwise `ffmpeg` from
/// PATH, otherwise the bare name so launch errors surface per job.
pub fn resolve_ffmpeg(configured: Option<PathBuf>) -> PathBuf {
    if let Some(path) = configured {
        return path;
    }

    which("ffmpeg")
        .or_else(|_| {
            if cfg!(windows) {
                which("ffmpeg.exe")
            } else {
                Err(which::Error::CannotFindBinaryPath)
            }
        })
        .unwrap_or_else(|_| {
            debug!("`ffmpeg` not found in PATH, relying on the OS lookup at launch");
            PathBuf::from("ffmpeg")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_a_failed_result() {
        let res = FfmpegExecutor.execute(Path::new("/nonexistent/ffmpeg-12345"), &[]);
        assert_eq!(res.exit_code, None);
        assert!(!res.success());
        assert!(res.output.contains("failed to spawn"));
    }

    #[test]
    fn test_explicit_binary_wins() {
        let p = PathBuf::from("/opt/custom/ffmpeg");
        assert_eq!(resolve_ffmpeg(Some(p.clone())), p);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_codes() {
        assert!(FfmpegExecutor.execute(Path::new("true"), &[]).success());

        let res = FfmpegExecutor.execute(Path::new("false"), &[]);
        assert_eq!(res.exit_code, Some(1));
        assert!(!res.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_merges_stdout_and_stderr() {
        let args: Vec<OsString> = vec!["-c".into(), "echo to-out; echo to-err >&2; exit 3".into()];
        let res = FfmpegExecutor.execute(Path::new("sh"), &args);
        assert_eq!(res.exit_code, Some(3));
        assert!(res.output.contains("to-out"));
        assert!(res.output.contains("to-err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_output_is_drained() {
        let script = "printf 'Title: caf\\351\\n' >&2; sleep 0.3; \
                      i=0; while [ $i -lt 200 ]; do echo \"line $i\" >&2; i=$((i+1)); done; \
                      exit 0";
        let args: Vec<OsString> = vec!["-c".into(), script.into()];
        let res = FfmpegExecutor.execute(Path::new("sh"), &args);
        assert_eq!(res.exit_code, Some(0), "output: {}", res.output);
        assert!(res.output.contains("Title: caf\u{fffd}"));
        assert!(res.output.contains("line 199"));
    }
}
