//! Executes a single conversion job and reports how it ended.

use crate::config::GlobalConfig;
use crate::ffmpeg::Executor;
use crate::media::may_be_audio_or_video_file;
use crate::planner::plan;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub input: PathBuf,
}

impl Job {
    pub fn new(id: usize, input: impl Into<PathBuf>) -> Self {
        Self {
            id,
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    Done,
    Skipped,
    Failed,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobOutcome::Done => "done",
            JobOutcome::Skipped => "skipped",
            JobOutcome::Failed => "failed",
        })
    }
}

/// Runs `job` to its terminal state. Blocks for as long as the transcoder
/// runs, so callers wanting parallelism give each job its own thread.
pub fn run_job(job: &Job, config: &GlobalConfig, executor: &dyn Executor) -> JobOutcome {
    if !may_be_audio_or_video_file(&job.input) {
        debug!(job = job.id, input = %job.input.display(), "not an audio or video file, skipping");
        return JobOutcome::Skipped;
    }

    let plan = plan(&job.input, config);
    let output = plan.output_file();
    info!(job = job.id, input = %job.input.display(), output = %output.display(), "starting job");

    // create_dir_all treats an existing directory as success, including one
    // created concurrently by a sibling job
    if let Err(err) = fs::create_dir_all(&plan.output_dir) {
        warn!(job = job.id, dir = %plan.output_dir.display(), "cannot create output directory: {err}");
        return JobOutcome::Failed;
    }

    if config.quick_convert_mode {
        if output.exists() {
            debug!(job = job.id, "output already exists, skipping");
            return JobOutcome::Skipped;
        }

        let same_format = job
            .input
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&plan.output_extension));
        if same_format {
            debug!(job = job.id, "input already in target format, copying");
            return match fs::copy(&job.input, &output) {
                Ok(_) => JobOutcome::Done,
                Err(err) => {
                    warn!(job = job.id, "copy to {} failed: {err}", output.display());
                    JobOutcome::Failed
                }
            };
        }
    }

    debug!(job = job.id, command = %plan.command_line(&config.ffmpeg_binary), "launching");
    let result = executor.execute(&config.ffmpeg_binary, &plan.args);
    debug!(job = job.id, "tool output:\n{}", result.output);

    if result.success() {
        info!(job = job.id, "finished");
        JobOutcome::Done
    } else {
        match result.exit_code {
            Some(code) => warn!(job = job.id, code, "transcoder exited with an error"),
            None => warn!(job = job.id, "transcoder did not run to completion"),
        }
        JobOutcome::Failed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{OutputFormat, Quality};
    use crate::ffmpeg::ProcessResult;
    use std::ffi::OsString;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every launch and answers with a fixed exit code.
    pub(crate) struct FakeExecutor {
        pub exit_code: Option<i32>,
        pub calls: Mutex<Vec<Vec<OsString>>>,
    }

    impl FakeExecutor {
        pub fn exiting(exit_code: Option<i32>) -> Self {
            Self {
                exit_code,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Executor for FakeExecutor {
        fn execute(&self, _program: &Path, args: &[OsString]) -> ProcessResult {
            self.calls.lock().unwrap().push(args.to_vec());
            ProcessResult {
                exit_code: self.exit_code,
                output: String::new(),
            }
        }
    }

    fn config(format: OutputFormat, quick: bool) -> GlobalConfig {
        GlobalConfig {
            output_format: format,
            quality: Quality::High,
            quick_convert_mode: quick,
            ..Default::default()
        }
    }

    #[test]
    fn test_non_media_is_skipped_without_planning() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("readme.txt");
        fs::write(&input, "hello").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, false), &exec);

        assert_eq!(outcome, JobOutcome::Skipped);
        assert_eq!(exec.call_count(), 0);
        assert!(!dir.path().join("out").exists(), "no output dir for skipped input");
    }

    #[test]
    fn test_exit_zero_is_done() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(7, &input), &config(OutputFormat::Mp3, false), &exec);

        assert_eq!(outcome, JobOutcome::Done);
        assert!(dir.path().join("out").is_dir());
        let calls = exec.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].last().unwrap(),
            &OsString::from(dir.path().join("out").join("song.mp3"))
        );
    }

    #[test]
    fn test_nonzero_exit_is_failed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();

        let exec = FakeExecutor::exiting(Some(1));
        assert_eq!(
            run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, false), &exec),
            JobOutcome::Failed
        );

        let exec = FakeExecutor::exiting(None);
        assert_eq!(
            run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, false), &exec),
            JobOutcome::Failed
        );
    }

    #[test]
    fn test_quick_mode_skips_existing_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out").join("song.mp3"), b"old").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, true), &exec);

        assert_eq!(outcome, JobOutcome::Skipped);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn test_existing_output_is_reencoded_without_quick_mode() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out").join("song.mp3"), b"old").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, false), &exec);

        assert_eq!(outcome, JobOutcome::Done);
        assert_eq!(exec.call_count(), 1);
        assert_eq!(exec.calls.lock().unwrap()[0][1], OsString::from("-y"));
    }

    #[test]
    fn test_quick_mode_copies_same_format() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("Track.MP3");
        fs::write(&input, b"ID3 payload").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, true), &exec);

        assert_eq!(outcome, JobOutcome::Done);
        assert_eq!(exec.call_count(), 0);
        let copied = fs::read(dir.path().join("out").join("Track.mp3")).unwrap();
        assert_eq!(copied, b"ID3 payload");
    }

    #[cfg(unix)]
    #[test]
    fn test_quick_mode_copy_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.flac");
        fs::write(&input, b"fLaC").unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        // dangling link: `exists()` is false, and writing through it fails
        // even for root because the target's parent is missing
        std::os::unix::fs::symlink(dir.path().join("missing").join("song.flac"), out.join("song.flac"))
            .unwrap();

        let exec = FakeExecutor::exiting(Some(0));
        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Flac, true), &exec);

        assert_eq!(outcome, JobOutcome::Failed);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn test_quick_mode_converts_other_formats() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.flac");
        fs::write(&input, b"").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Opus, true), &exec);

        assert_eq!(outcome, JobOutcome::Done);
        assert_eq!(exec.call_count(), 1);
        assert_eq!(exec.calls.lock().unwrap()[0][1], OsString::from("-n"));
    }

    #[test]
    fn test_output_dir_creation_failure_is_failed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();
        // a regular file where the output directory should go
        fs::write(dir.path().join("out"), b"").unwrap();
        let exec = FakeExecutor::exiting(Some(0));

        let outcome = run_job(&Job::new(0, &input), &config(OutputFormat::Mp3, false), &exec);

        assert_eq!(outcome, JobOutcome::Failed);
        assert_eq!(exec.call_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_executor_exit_codes() {
        use crate::ffmpeg::FfmpegExecutor;

        let dir = tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"").unwrap();

        let mut cfg = config(OutputFormat::Mp3, false);
        cfg.ffmpeg_binary = PathBuf::from("true");
        assert_eq!(run_job(&Job::new(0, &input), &cfg, &FfmpegExecutor), JobOutcome::Done);

        cfg.ffmpeg_binary = PathBuf::from("false");
        assert_eq!(run_job(&Job::new(1, &input), &cfg, &FfmpegExecutor), JobOutcome::Failed);

        cfg.ffmpeg_binary = dir.path().join("no-such-ffmpeg");
        assert_eq!(run_job(&Job::new(2, &input), &cfg, &FfmpegExecutor), JobOutcome::Failed);
    }
}
