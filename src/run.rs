//! Two-pass run orchestration
//!
//! Pass one simulates the whole duration and records collision events
//! (frames are discarded). Only then can the song timeline be scheduled:
//! interval merging needs every timestamp up front. Pass two re-runs a
//! fresh simulation from the same configuration for the final frames, so no
//! physics state leaks between passes.

use std::path::PathBuf;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::{AudioBuffer, ClipLibrary, build_clip_audio, build_song_audio, merge_bounce_times};
use crate::color::{default_ball_palette, default_border_palette};
use crate::config::{ObstacleConfig, RunConfig};
use crate::consts::CHUNK_PADDING;
use crate::render::{DrawCommand, Frame, FrameRecorder, Renderer};
use crate::sim::{
    Ball, CircleObstacle, EventRouter, GapCircleObstacle, Obstacle, ObstacleStyle,
    RotationMode, Simulation, SquareObstacle,
};

/// Everything a run produces
#[derive(Debug)]
pub struct RunOutput {
    /// Final-pass frames as draw-command lists, one per output frame
    pub frames: Vec<Frame>,
    /// Mixed audio timeline of exactly the run's duration
    pub audio: AudioBuffer,
    /// Raw song-mode bounce timestamps (diagnostics/tests)
    pub bounce_times: Vec<f32>,
    /// Raw clip-mode events (diagnostics/tests)
    pub collision_events: Vec<(f32, PathBuf)>,
    /// Merged activity intervals that gated the song track
    pub collision_intervals: Vec<(f32, f32)>,
}

/// Build the run's balls from configuration
pub fn build_balls(config: &RunConfig) -> Vec<Ball> {
    let arena = Vec2::from(config.video_size);
    config
        .balls
        .iter()
        .map(|cfg| {
            let palette = cfg.palette.clone().unwrap_or_else(default_ball_palette);
            Ball::from_config(cfg, arena, palette, default_border_palette())
        })
        .collect()
}

/// Build the run's obstacles: generated concentric gap circles first, then
/// any explicitly placed obstacles.
pub fn build_obstacles(config: &RunConfig) -> Vec<Obstacle> {
    let generation = &config.gap_circles;
    let center = generation
        .center
        .map(Vec2::from)
        .unwrap_or(Vec2::from(config.video_size) / 2.0);

    let mut obstacles = Vec::new();
    for i in 0..generation.count {
        // Alternate rotation direction ring by ring
        let rotation = if i % 2 == 0 {
            RotationMode::Clockwise
        } else {
            RotationMode::AntiClockwise
        };
        let circle = CircleObstacle {
            center,
            start_radius: generation.start_radius + i as f32 * generation.radius_step,
            end_radius: generation.end_radius_base + i as f32 * generation.end_radius_step,
            fill_color: generation.fill_color,
            style: ObstacleStyle {
                start_time: generation.start_time,
                end_time: generation.end_time,
                color: generation.color,
                color_mode: generation.color_mode,
            },
        };
        obstacles.push(Obstacle::GapCircle(GapCircleObstacle::new(
            circle,
            generation.gap_angle_deg.to_radians(),
            generation.gap_offset_deg.to_radians(),
            generation.rotation_speed_deg.to_radians(),
            rotation,
            generation.disappear_on_gap_pass,
        )));
    }

    for obstacle in &config.obstacles {
        obstacles.push(match obstacle.clone() {
            ObstacleConfig::Circle {
                center,
                start_radius,
                end_radius,
                fill_color,
                style,
            } => Obstacle::Circle(CircleObstacle {
                center: Vec2::from(center),
                start_radius,
                end_radius,
                fill_color,
                style: ObstacleStyle {
                    start_time: style.start_time,
                    end_time: style.end_time,
                    color: style.color,
                    color_mode: style.color_mode,
                },
            }),
            ObstacleConfig::Square {
                center,
                size,
                style,
            } => Obstacle::Square(SquareObstacle {
                center: Vec2::from(center),
                size,
                style: ObstacleStyle {
                    start_time: style.start_time,
                    end_time: style.end_time,
                    color: style.color,
                    color_mode: style.color_mode,
                },
            }),
            ObstacleConfig::GapCircle {
                center,
                start_radius,
                end_radius,
                gap_angle_deg,
                gap_offset_deg,
                rotation_speed_deg,
                rotation_mode,
                disappear_on_gap_pass,
                fill_color,
                style,
            } => Obstacle::GapCircle(GapCircleObstacle::new(
                CircleObstacle {
                    center: Vec2::from(center),
                    start_radius,
                    end_radius,
                    fill_color,
                    style: ObstacleStyle {
                        start_time: style.start_time,
                        end_time: style.end_time,
                        color: style.color,
                        color_mode: style.color_mode,
                    },
                },
                gap_angle_deg.to_radians(),
                gap_offset_deg.to_radians(),
                rotation_speed_deg.to_radians(),
                rotation_mode,
                disappear_on_gap_pass,
            )),
        });
    }

    obstacles
}

/// Number of output frames for a run
fn frame_count(config: &RunConfig) -> u32 {
    (config.duration * config.fps as f32).ceil() as u32
}

/// Phase 1: simulate the full timeline and collect routed events
fn tracking_pass(config: &RunConfig) -> EventRouter {
    let mut sim = Simulation::new(build_balls(config), build_obstacles(config));
    let mut router = EventRouter::new(config.ball_audio.clone());

    for frame in 0..frame_count(config) {
        let t = frame as f32 / config.fps as f32;
        let events = sim.step(t);
        router.record_all(&events);
    }

    log::info!(
        "tracking pass: {} song timestamps, {} clip events",
        router.bounce_times.len(),
        router.collision_events.len()
    );
    router
}

/// Phase 2: fresh simulation, final frames
fn render_pass(config: &RunConfig, renderer: &mut dyn Renderer) {
    let mut sim = Simulation::new(build_balls(config), build_obstacles(config));
    let mut rng = Pcg32::seed_from_u64(config.seed);

    for frame in 0..frame_count(config) {
        let t = frame as f32 / config.fps as f32;
        sim.step(t);
        renderer.begin_frame(frame, t);
        renderer.draw(DrawCommand::Clear {
            color: config.background_color,
        });
        sim.draw(renderer, t, &mut rng);
        renderer.end_frame();
    }
}

/// Execute a full run: simulate, schedule audio, render.
///
/// The configuration must already be validated (see [`RunConfig::load`]).
pub fn generate_run(config: &RunConfig, library: &dyn ClipLibrary) -> RunOutput {
    let router = tracking_pass(config);
    let collision_intervals = merge_bounce_times(&router.bounce_times, CHUNK_PADDING);

    let song_audio = build_song_audio(
        config.duration,
        &collision_intervals,
        &config.song_path,
        library,
        config.volume,
        config.sample_rate,
    );
    let clip_audio = build_clip_audio(
        config.duration,
        &router.collision_events,
        library,
        config.sample_rate,
    );
    let audio = match song_audio {
        Some(song) => song.mix(&clip_audio),
        None => clip_audio,
    };

    let mut recorder = FrameRecorder::new();
    render_pass(config, &mut recorder);

    RunOutput {
        frames: recorder.frames,
        audio,
        bounce_times: router.bounce_times,
        collision_events: router.collision_events,
        collision_intervals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryLibrary;
    use crate::config::{AudioMode, AudioRoute, BallConfig};

    /// Obstacle-free arena with one song-routed ball dropped under gravity
    fn gravity_drop_config() -> RunConfig {
        let mut config = RunConfig::default();
        config.duration = 6.0;
        config.video_size = [1000.0, 1000.0];
        config.fps = 120;
        config.gap_circles.count = 0;
        config.song_path = PathBuf::from("song.mp3");
        config.balls = vec![BallConfig {
            id: 0,
            radius: 20.0,
            start_speed: 0.0,
            speed_increment: 0.0,
            restitution: 1.0,
            start_pos: Some([500.0, 500.0]),
            initial_velocity: Some([0.0, 1.0]),
            bounce_on_edges: true,
            gravity_enabled: true,
            gravity_strength: 400.0,
            ..BallConfig::default()
        }];
        config.ball_audio.clear();
        config.ball_audio.insert(
            0,
            AudioRoute {
                mode: AudioMode::Song,
                path: None,
            },
        );
        config.validate().unwrap();
        config
    }

    fn silent_library() -> MemoryLibrary {
        let mut library = MemoryLibrary::new();
        library.insert("song.mp3", AudioBuffer::silence(60.0, 44_100));
        library
    }

    #[test]
    fn test_run_output_shape() {
        let config = gravity_drop_config();
        let output = generate_run(&config, &silent_library());

        assert_eq!(output.frames.len(), 720);
        // Audio spans exactly the run duration
        assert!((output.audio.duration() - config.duration).abs() < 1e-3);
        assert!(!output.bounce_times.is_empty());
        assert!(output.collision_events.is_empty());
    }

    #[test]
    fn test_gravity_drop_bounce_count_matches_prediction() {
        // Free fall from rest over h = 1000 - 500 - 20 = 480px at g = 400:
        // first impact at sqrt(2h/g) ~= 1.549s; with e = 1 each later period
        // is 2*sqrt(2h/g). Expect impacts near 1.55, 4.65 within 6s.
        let config = gravity_drop_config();
        let output = generate_run(&config, &silent_library());

        let wall_bounces = output.bounce_times.len();
        assert_eq!(wall_bounces, 2, "bounce times: {:?}", output.bounce_times);
        assert!((output.bounce_times[0] - 1.55).abs() < 0.05);
        assert!((output.bounce_times[1] - 4.65).abs() < 0.1);
    }

    #[test]
    fn test_passes_are_deterministic() {
        // The final-pass physics must replay the tracking pass exactly: the
        // last frame's ball position is identical across two full runs.
        let config = gravity_drop_config();
        let a = generate_run(&config, &silent_library());
        let b = generate_run(&config, &silent_library());

        assert_eq!(a.frames.last().unwrap().commands, b.frames.last().unwrap().commands);
        assert_eq!(a.bounce_times, b.bounce_times);
    }

    #[test]
    fn test_generated_obstacles_alternate_rotation() {
        let mut config = RunConfig::default();
        config.gap_circles.count = 3;
        let obstacles = build_obstacles(&config);
        assert_eq!(obstacles.len(), 3);
        let rotations: Vec<RotationMode> = obstacles
            .iter()
            .map(|o| match o {
                Obstacle::GapCircle(g) => g.rotation,
                other => panic!("unexpected obstacle {other:?}"),
            })
            .collect();
        assert_eq!(
            rotations,
            vec![
                RotationMode::Clockwise,
                RotationMode::AntiClockwise,
                RotationMode::Clockwise
            ]
        );
    }
}
