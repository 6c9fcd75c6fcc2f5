//! Bounce Beat entry point
//!
//! `bouncebeat run <config.json>` generates a single run and writes its
//! summary; `bouncebeat batch <songs-dir> [config.json]` fans out one run
//! per song. Frame and audio encoding are downstream consumers of the run
//! output; this binary reports what a run produced.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bouncebeat::audio::RodioLibrary;
use bouncebeat::batch::{BatchOptions, generate_batch};
use bouncebeat::config::RunConfig;
use bouncebeat::run::generate_run;

fn usage() -> ExitCode {
    eprintln!("usage: bouncebeat run <config.json>");
    eprintln!("       bouncebeat batch <songs-dir> [config.json]");
    ExitCode::FAILURE
}

fn load_config(path: &Path) -> Option<RunConfig> {
    match RunConfig::load(path) {
        Ok(config) => Some(config),
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

fn run_single(config_path: &Path) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    let output = generate_run(&config, &RodioLibrary);
    log::info!(
        "run complete: {} frames, {:.1}s audio, {} bounces in {} intervals, {} clip events",
        output.frames.len(),
        output.audio.duration(),
        output.bounce_times.len(),
        output.collision_intervals.len(),
        output.collision_events.len(),
    );

    if let Some(parent) = config.output_file.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("failed to create output dir: {e}");
            return ExitCode::FAILURE;
        }
    }
    let summary = serde_json::json!({
        "frame_count": output.frames.len(),
        "audio_duration": output.audio.duration(),
        "bounce_times": output.bounce_times,
        "collision_intervals": output.collision_intervals,
        "clip_event_count": output.collision_events.len(),
    });
    match serde_json::to_string_pretty(&summary)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(&config.output_file, json))
    {
        Ok(()) => {
            log::info!("summary written to {}", config.output_file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("failed to write summary: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_batch(songs_dir: PathBuf, config_path: Option<PathBuf>) -> ExitCode {
    let base = match config_path {
        Some(path) => match load_config(&path) {
            Some(config) => config,
            None => return ExitCode::FAILURE,
        },
        None => RunConfig::default(),
    };

    let options = BatchOptions {
        songs_dir,
        ..BatchOptions::default()
    };
    match generate_batch(&base, &options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("batch failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, config] if cmd == "run" => run_single(Path::new(config)),
        [cmd, songs] if cmd == "batch" => run_batch(PathBuf::from(songs), None),
        [cmd, songs, config] if cmd == "batch" => {
            run_batch(PathBuf::from(songs), Some(PathBuf::from(config)))
        }
        _ => usage(),
    }
}
