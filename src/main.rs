use anyhow::{anyhow, Context, Result};
use audio_converter::batch::{run_batch, BatchSummary};
use audio_converter::cli::Cli;
use audio_converter::ffmpeg::FfmpegExecutor;
use audio_converter::media::may_be_audio_or_video_file;
use audio_converter::tui::interactive_config;
use audio_converter::{plan, GlobalConfig, Job, JobOutcome};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use tracing::warn;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = cli.global_config().context("invalid configuration")?;
    if cli.interactive {
        config = interactive_config(config)?;
    }

    let jobs = cli.jobs()?;
    if jobs.is_empty() {
        warn!("nothing to convert");
        return Ok(ExitCode::SUCCESS);
    }

    if cli.dry_run {
        print_plans(&jobs, &config);
        return Ok(ExitCode::SUCCESS);
    }

    let summary = convert(jobs, &config, cli.workers)?;
    println!(
        "{} converted, {} skipped, {} failed",
        summary.done, summary.skipped, summary.failed
    );

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "audio_converter=debug".to_string()
        } else {
            "audio_converter=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_plans(jobs: &[Job], config: &GlobalConfig) {
    for job in jobs {
        if may_be_audio_or_video_file(&job.input) {
            println!("{}", plan(&job.input, config).command_line(&config.ffmpeg_binary));
        } else {
            println!("# skip {}", job.input.display());
        }
    }
}

fn convert(jobs: Vec<Job>, config: &GlobalConfig, workers: usize) -> Result<BatchSummary> {
    let inputs: Vec<PathBuf> = jobs.iter().map(|job| job.input.clone()).collect();

    let bar = ProgressBar::new(jobs.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}]  [{bar:40.cyan/bright-black}] {pos}/{len}  ETA:{eta}\n{wide_msg}",
        )?
        .progress_chars("#>-"),
    );

    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        let pool = scope.spawn(move || run_batch(config, jobs, workers, &FfmpegExecutor, tx));

        let mut summary = BatchSummary::default();
        for event in rx {
            summary.record(event.outcome);
            let input = inputs[event.id].display();
            match event.outcome {
                JobOutcome::Failed => bar.println(format!("failed: {input}")),
                outcome => bar.set_message(format!("{outcome}: {input}")),
            }
            bar.inc(1);
        }
        bar.finish_with_message("Done");

        pool.join()
            .map_err(|_| anyhow!("worker pool panicked"))?
            .context("failed to run conversions")?;
        Ok(summary)
    })
}
