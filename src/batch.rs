//! Batch generation across a directory of songs
//!
//! Each song gets its own randomized run configuration (palette, speeds,
//! spawn point) derived deterministically from the batch seed and the song
//! name. Runs share no state, so they parallelize across whole runs only.

use std::collections::hash_map::DefaultHasher;
use std::f32::consts::TAU;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use serde::Serialize;

use crate::audio::RodioLibrary;
use crate::color::{CURATED_HUES, multi_stop_gradient, random_gradient};
use crate::config::RunConfig;
use crate::run::generate_run;

/// Duration choices for batch runs (seconds)
const DURATION_CHOICES: &[f32] = &[25.0, 26.0, 28.0, 30.0, 32.0, 35.0];
/// Palette length for generated gradients
const GRADIENT_STEPS: usize = 32;
/// Random gradients generated on top of the curated hue stops
const RANDOM_GRADIENTS: usize = 50;
/// Spawn at least this far from the obstacle center (pixels)
const SPAWN_MIN_RADIUS: f32 = 100.0;
/// Spawn no farther out than this fraction of the obstacle radius
const SPAWN_MAX_FRACTION: f32 = 0.6;

/// Batch-level options
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub songs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Skip songs whose summary file already exists
    pub skip_existing: bool,
    pub parallel: bool,
    pub seed: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            songs_dir: PathBuf::from("sounds"),
            output_dir: PathBuf::from("output"),
            skip_existing: true,
            parallel: true,
            seed: 0,
        }
    }
}

/// Per-run record written next to the frames/audio for diagnostics
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub song: String,
    pub duration: f32,
    pub frame_count: usize,
    pub bounce_times: Vec<f32>,
    pub collision_intervals: Vec<(f32, f32)>,
    pub clip_event_count: usize,
}

/// Replace non-alphanumeric characters so song names are safe file names
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Deterministic per-song RNG seed
fn song_seed(batch_seed: u64, song_name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    song_name.hash(&mut hasher);
    batch_seed ^ hasher.finish()
}

/// Uniform point inside the annulus `[min_r, max_r]` around `center`
fn spawn_inside_circle(rng: &mut Pcg32, center: [f32; 2], min_r: f32, max_r: f32) -> [f32; 2] {
    let angle = rng.random_range(0.0..TAU);
    let r = rng.random_range(min_r..max_r);
    [center[0] + r * angle.cos(), center[1] + r * angle.sin()]
}

/// Pick a palette: one of the curated gradients or a freshly generated one
fn pick_gradient(rng: &mut Pcg32) -> Vec<crate::color::Rgb> {
    let index = rng.random_range(0..CURATED_HUES.len() + RANDOM_GRADIENTS);
    if index < CURATED_HUES.len() {
        multi_stop_gradient(CURATED_HUES[index], GRADIENT_STEPS)
    } else {
        random_gradient(rng, GRADIENT_STEPS)
    }
}

/// Derive one song's run configuration from the base config
pub fn build_config(base: &RunConfig, song_path: &Path, seed: u64) -> RunConfig {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut config = base.clone();

    config.seed = seed;
    config.duration = DURATION_CHOICES[rng.random_range(0..DURATION_CHOICES.len())];
    config.song_path = song_path.to_path_buf();

    let gradient = pick_gradient(&mut rng);
    let center = config
        .gap_circles
        .center
        .unwrap_or([config.video_size[0] / 2.0, config.video_size[1] / 2.0]);
    let max_r = config.gap_circles.start_radius * SPAWN_MAX_FRACTION;
    let start_pos = spawn_inside_circle(&mut rng, center, SPAWN_MIN_RADIUS, max_r);

    for ball in &mut config.balls {
        ball.start_speed = rng.random_range(180.0..=250.0);
        ball.speed_increment = rng.random_range(40.0..=100.0);
        ball.start_color = gradient.first().copied();
        ball.palette = Some(gradient.clone());
        ball.start_pos = Some(start_pos);
        // Aim the launch outward, toward the ring
        ball.initial_velocity = Some([start_pos[0] - center[0], start_pos[1] - center[1]]);
    }

    config
}

/// Generate one song's run and write its summary. Returns the summary path.
fn render_song(
    base: &RunConfig,
    options: &BatchOptions,
    song_path: &Path,
) -> std::io::Result<Option<PathBuf>> {
    let song_name = song_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let summary_path = options
        .output_dir
        .join(format!("BouncePlay_{}.json", sanitize_filename(&song_name)));

    if options.skip_existing && summary_path.exists() {
        log::info!("skipping {song_name}: {} exists", summary_path.display());
        return Ok(None);
    }

    let config = build_config(base, song_path, song_seed(options.seed, &song_name));
    log::info!(
        "generating {song_name}: duration {}s, speed {:.0}",
        config.duration,
        config.balls.first().map(|b| b.start_speed).unwrap_or(0.0)
    );

    let output = generate_run(&config, &RodioLibrary);
    let summary = RunSummary {
        song: song_name,
        duration: config.duration,
        frame_count: output.frames.len(),
        bounce_times: output.bounce_times,
        collision_intervals: output.collision_intervals,
        clip_event_count: output.collision_events.len(),
    };

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(&summary_path, json)?;
    Ok(Some(summary_path))
}

/// Song files the batch will pick up
fn is_song_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("mp3" | "wav" | "ogg" | "flac")
    )
}

/// Run the whole batch. Returns the number of runs generated.
pub fn generate_batch(base: &RunConfig, options: &BatchOptions) -> std::io::Result<usize> {
    std::fs::create_dir_all(&options.output_dir)?;

    let mut songs: Vec<PathBuf> = std::fs::read_dir(&options.songs_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_song_file(path))
        .collect();
    songs.sort();

    log::info!("starting batch: {} songs", songs.len());

    let render = |song: &PathBuf| -> usize {
        // One retry per song; a failure is logged, never fatal to the batch
        for attempt in 0..2 {
            match render_song(base, options, song) {
                Ok(Some(_)) => return 1,
                Ok(None) => return 0,
                Err(e) => {
                    log::error!(
                        "error generating {} (attempt {}): {e}",
                        song.display(),
                        attempt + 1
                    );
                }
            }
        }
        0
    };

    let generated = if options.parallel {
        songs.par_iter().map(render).sum()
    } else {
        songs.iter().map(render).sum()
    };

    log::info!("batch complete: {generated} generated");
    Ok(generated)
}
