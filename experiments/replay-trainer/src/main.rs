use anyhow::Context;
use spotter_base::{init_file_logger, init_stdout_logger, log, MonotonicClock};
use spotter_form::{run_session, LogFeedback, RunOutcome, Trainer, TrainerConfig};
use spotter_pose::ReplaySource;
use spotter_store::{Fallback, HistoryFile, HttpEndpoint, Persister};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <frames.jsonl> [config.toml]", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(path) => TrainerConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => TrainerConfig::default(),
    };
    match &config.log_dir {
        Some(dir) => init_file_logger(dir).context("opening log directory")?,
        None => init_stdout_logger(),
    }

    let profile = config.resolve_profile()?;
    log::info!("training {} (cap {} reps)", profile.name, profile.rep_cap);
    let mut trainer = Trainer::new(profile)?;

    let runner = config.runner_config();
    let mut source = ReplaySource::open(&args[1])
        .with_context(|| format!("reading frames from {}", args[1]))?
        .with_frame_interval(Duration::from_millis(runner.min_frame_interval_ms()));

    let history = HistoryFile::new(&config.history_path).with_limit(config.history_limit);
    let mut persister = match &config.remote_url {
        Some(url) => Persister::spawn(Fallback::new(HttpEndpoint::new(url.clone()), history)),
        None => Persister::spawn(history),
    };

    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let clock = MonotonicClock::new();
    let mut feedback = LogFeedback::default();
    let outcome = run_session(
        &mut source,
        &mut trainer,
        &clock,
        &mut feedback,
        &mut persister,
        &mut cancel_rx,
        &runner,
    )
    .await;

    if let RunOutcome::SourceError { error, .. } = &outcome {
        log::error!("replay stopped early: {}", error);
    }
    if !matches!(outcome, RunOutcome::Completed(_)) {
        trainer.finish(&mut persister);
    }

    let stats = outcome.stats();
    println!(
        "{}: {} reps, {} correct, {} incorrect, score {}",
        trainer.profile().name,
        stats.total_reps,
        stats.correct_reps,
        stats.incorrect_reps,
        trainer.score()
    );
    for (i, rep) in stats.reps.iter().enumerate() {
        println!("  rep {:>2}: {:>6.1} deg  {}", i + 1, rep.angle, rep.feedback);
    }

    let saved = persister.shutdown().await?;
    log::info!("{} session(s) saved", saved);
    Ok(())
}
