use crate::config::GlobalConfig;
use crate::error::Result;
use crate::ffmpeg::Executor;
use crate::runner::{run_job, Job, JobOutcome};
use std::sync::mpsc::Sender;
use tracing::debug;

/// Sent once per job, after it reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobEvent {
    pub id: usize,
    pub outcome: JobOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Done => self.done += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.skipped + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs every job on a pool of `workers` threads (0 = one per CPU) and
/// returns once all of them finished.
pub fn run_batch(
    config: &GlobalConfig,
    jobs: Vec<Job>,
    workers: usize,
    executor: &dyn Executor,
    events: Sender<JobEvent>,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("convert-{i}"))
        .build()?;
    debug!(jobs = jobs.len(), threads = pool.current_num_threads(), "dispatching batch");

    pool.scope(|scope| {
        for job in jobs {
            let events = events.clone();
            scope.spawn(move |_| {
                let outcome = run_job(&job, config, executor);
                if events.send(JobEvent { id: job.id, outcome }).is_err() {
                    debug!(job = job.id, "nobody is listening for job events");
                }
            });
        }
    });
    Ok(())
}
