//! Bounce Beat - deterministic bouncing-ball music video simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (balls, obstacles, collisions, events)
//! - `audio`: Collision-driven audio timeline construction
//! - `render`: Narrow draw-command contract for external frame encoders
//! - `run`: Two-pass run orchestration (track, schedule audio, re-render)
//! - `batch`: Parallel generation across many songs

pub mod audio;
pub mod batch;
pub mod color;
pub mod config;
pub mod render;
pub mod run;
pub mod sim;

pub use config::RunConfig;
pub use run::{RunOutput, generate_run};

use glam::Vec2;

/// Simulation defaults shared by config and batch generation
pub mod consts {
    /// Default output frame rate
    pub const DEFAULT_FPS: u32 = 60;
    /// Default audio sample rate (Hz)
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
    /// Audio timelines are stereo
    pub const AUDIO_CHANNELS: u16 = 2;

    /// Padding used when merging bounce timestamps into intervals (seconds)
    pub const CHUNK_PADDING: f32 = 0.1;
    /// Extra song runtime appended past each interval end (seconds)
    pub const EXCERPT_TAIL: f32 = 0.1;

    /// Speeds below this snap to a full stop (prevents numeric creep)
    pub const SPEED_EPSILON: f32 = 1e-3;
    /// Time increment for the square obstacle's separation loop (seconds)
    pub const SEPARATION_DT: f32 = 0.01;
    /// Iteration cap for the separation loop
    pub const SEPARATION_MAX_STEPS: u32 = 10_000;

    /// Outline stroke width for obstacles and ball borders (pixels)
    pub const STROKE_WIDTH: f32 = 3.0;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
