//! Run configuration
//!
//! A structured, serde-backed record supplying every numeric/behavioral
//! parameter of a run. The loader validates before anything reaches the
//! simulation core; the core treats the config as already-validated input.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{ColorMode, Rgb};
use crate::consts::{DEFAULT_FPS, DEFAULT_SAMPLE_RATE};

/// Per-ball audio routing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    /// Short sound clip on every event
    #[default]
    Clip,
    /// Continuous song excerpts gated by activity intervals
    Song,
}

/// Where a ball's collision events go
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioRoute {
    #[serde(default)]
    pub mode: AudioMode,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Ball border color behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderColorMode {
    #[default]
    Static,
    /// Advance one border-palette slot per bounce
    Cycle,
}

/// How trail samples are colored when appearance is not locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailColorMode {
    /// Current ball color, dimmed by the fade alpha
    #[default]
    Fade,
    /// A fixed configured color
    Fixed,
}

/// Everything configurable about one ball
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub id: u32,
    pub radius: f32,
    pub start_speed: f32,
    pub speed_increment: f32,
    pub restitution: f32,
    pub frozen_color: Rgb,
    pub start_color: Option<Rgb>,
    pub start_time: f32,
    pub move_start_time: f32,
    pub free_time: Option<f32>,
    /// Defaults to the arena center
    pub start_pos: Option<[f32; 2]>,
    /// Direction only; normalized and scaled by `start_speed`
    pub initial_velocity: Option<[f32; 2]>,
    pub border_color: Option<Rgb>,
    pub border_color_mode: BorderColorMode,
    pub trail_enabled: bool,
    pub trail_length: usize,
    pub trail_fade_time: f32,
    pub trail_thickness: f32,
    pub trail_color_mode: TrailColorMode,
    pub trail_color: Rgb,
    pub trail_match_radius: bool,
    pub trail_lock_appearance: bool,
    pub bounce_on_edges: bool,
    pub gravity_enabled: bool,
    pub gravity_strength: f32,
    pub grow_start_radius: Option<f32>,
    pub grow_end_radius: Option<f32>,
    pub grow_start_time: Option<f32>,
    pub grow_end_time: Option<f32>,
    /// Per-run fill palette; defaults to the built-in red/violet cycle
    pub palette: Option<Vec<Rgb>>,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            id: 0,
            radius: 50.0,
            start_speed: 300.0,
            speed_increment: 30.0,
            restitution: 0.8,
            frozen_color: Rgb::WHITE,
            start_color: None,
            start_time: 0.0,
            move_start_time: 0.0,
            free_time: None,
            start_pos: None,
            initial_velocity: None,
            border_color: None,
            border_color_mode: BorderColorMode::Static,
            trail_enabled: false,
            trail_length: 20,
            trail_fade_time: 1.0,
            trail_thickness: 2.0,
            trail_color_mode: TrailColorMode::Fade,
            trail_color: Rgb(200, 200, 200),
            trail_match_radius: false,
            trail_lock_appearance: false,
            bounce_on_edges: true,
            gravity_enabled: false,
            gravity_strength: 200.0,
            grow_start_radius: None,
            grow_end_radius: None,
            grow_start_time: None,
            grow_end_time: None,
            palette: None,
        }
    }
}

/// Generator for the concentric rotating-gap circles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapCircleGenConfig {
    pub count: u32,
    pub start_radius: f32,
    /// Added per ring index
    pub radius_step: f32,
    pub end_radius_base: f32,
    /// Added per ring index to the end radius
    pub end_radius_step: f32,
    pub gap_angle_deg: f32,
    pub gap_offset_deg: f32,
    pub rotation_speed_deg: f32,
    pub disappear_on_gap_pass: bool,
    pub start_time: f32,
    pub end_time: f32,
    pub color: Rgb,
    pub color_mode: ColorMode,
    pub fill_color: Option<Rgb>,
    /// Defaults to the arena center
    pub center: Option<[f32; 2]>,
}

impl Default for GapCircleGenConfig {
    fn default() -> Self {
        Self {
            count: 1,
            start_radius: 550.0,
            radius_step: 50.0,
            end_radius_base: 30.0,
            end_radius_step: 700.0,
            gap_angle_deg: 45.0,
            gap_offset_deg: 0.0,
            rotation_speed_deg: 60.0,
            disappear_on_gap_pass: true,
            start_time: 0.0,
            end_time: 9999.0,
            color: Rgb::WHITE,
            color_mode: ColorMode::Static,
            fill_color: Some(Rgb::WHITE),
            center: None,
        }
    }
}

/// Activity window + color shared by explicitly listed obstacles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleStyleConfig {
    pub start_time: f32,
    pub end_time: f32,
    pub color: Rgb,
    pub color_mode: ColorMode,
}

impl Default for ObstacleStyleConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 9999.0,
            color: Rgb::WHITE,
            color_mode: ColorMode::Static,
        }
    }
}

/// An explicitly placed obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ObstacleConfig {
    Circle {
        center: [f32; 2],
        start_radius: f32,
        end_radius: f32,
        #[serde(default)]
        fill_color: Option<Rgb>,
        #[serde(flatten)]
        style: ObstacleStyleConfig,
    },
    Square {
        center: [f32; 2],
        size: f32,
        #[serde(flatten)]
        style: ObstacleStyleConfig,
    },
    GapCircle {
        center: [f32; 2],
        start_radius: f32,
        end_radius: f32,
        #[serde(default = "default_gap_angle")]
        gap_angle_deg: f32,
        #[serde(default)]
        gap_offset_deg: f32,
        #[serde(default = "default_rotation_speed")]
        rotation_speed_deg: f32,
        #[serde(default)]
        rotation_mode: crate::sim::RotationMode,
        #[serde(default)]
        disappear_on_gap_pass: bool,
        #[serde(default)]
        fill_color: Option<Rgb>,
        #[serde(flatten)]
        style: ObstacleStyleConfig,
    },
}

fn default_gap_angle() -> f32 {
    45.0
}

fn default_rotation_speed() -> f32 {
    30.0
}

/// Full configuration for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Output duration in seconds
    pub duration: f32,
    /// Arena (and frame) size in pixels
    pub video_size: [f32; 2],
    pub fps: u32,
    pub background_color: Rgb,
    pub song_path: PathBuf,
    /// Gain applied to the song track
    pub volume: f32,
    pub sample_rate: u32,
    /// Seed for the run's color-animation RNG
    pub seed: u64,
    pub balls: Vec<BallConfig>,
    /// Collision-audio routing keyed by ball id
    pub ball_audio: HashMap<u32, AudioRoute>,
    /// Concentric rotating-gap circle generation
    pub gap_circles: GapCircleGenConfig,
    /// Additional explicitly placed obstacles
    pub obstacles: Vec<ObstacleConfig>,
    pub output_file: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        let mut ball_audio = HashMap::new();
        ball_audio.insert(
            0,
            AudioRoute {
                mode: AudioMode::Song,
                path: None,
            },
        );
        Self {
            duration: 28.0,
            video_size: [1080.0, 1920.0],
            fps: DEFAULT_FPS,
            background_color: Rgb(20, 20, 20),
            song_path: PathBuf::new(),
            volume: 0.6,
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 0,
            balls: vec![BallConfig::default()],
            ball_audio,
            gap_circles: GapCircleGenConfig::default(),
            obstacles: Vec::new(),
            output_file: PathBuf::from("output/run.json"),
        }
    }
}

impl RunConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core is not specified to handle
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.duration <= 0.0 {
            return invalid(format!("duration must be positive, got {}", self.duration));
        }
        if self.fps == 0 {
            return invalid("fps must be positive".into());
        }
        if self.video_size[0] <= 0.0 || self.video_size[1] <= 0.0 {
            return invalid(format!(
                "video_size must be positive, got {:?}",
                self.video_size
            ));
        }
        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".into());
        }
        if self.volume < 0.0 {
            return invalid(format!("volume must be >= 0, got {}", self.volume));
        }

        let mut seen_ids = std::collections::HashSet::new();
        for ball in &self.balls {
            if !seen_ids.insert(ball.id) {
                return invalid(format!("duplicate ball id {}", ball.id));
            }
            if ball.radius <= 0.0 {
                return invalid(format!("ball {}: radius must be positive", ball.id));
            }
            if ball.restitution < 0.0 {
                return invalid(format!("ball {}: restitution must be >= 0", ball.id));
            }
            if ball.trail_enabled && ball.trail_length == 0 {
                return invalid(format!("ball {}: trail_length must be >= 1", ball.id));
            }
            if ball.start_time < 0.0 || ball.move_start_time < 0.0 {
                return invalid(format!("ball {}: negative gate time", ball.id));
            }
            if matches!(ball.free_time, Some(t) if t < 0.0) {
                return invalid(format!("ball {}: negative free_time", ball.id));
            }
            if let Some(palette) = &ball.palette {
                if palette.is_empty() {
                    return invalid(format!("ball {}: empty palette", ball.id));
                }
            }
            let growth_fields = [
                ball.grow_start_radius.is_some(),
                ball.grow_end_radius.is_some(),
                ball.grow_start_time.is_some(),
                ball.grow_end_time.is_some(),
            ];
            let set = growth_fields.iter().filter(|&&b| b).count();
            if set != 0 && set != 4 {
                return invalid(format!(
                    "ball {}: growth schedule needs all four grow_* fields",
                    ball.id
                ));
            }
            if let (Some(start), Some(end)) = (ball.grow_start_time, ball.grow_end_time) {
                if end <= start {
                    return invalid(format!("ball {}: grow_end_time <= grow_start_time", ball.id));
                }
            }
        }

        for (&id, route) in &self.ball_audio {
            if route.mode == AudioMode::Clip && route.path.is_none() {
                return invalid(format!("ball {id}: clip route without a path"));
            }
        }

        Ok(())
    }
}

/// Configuration loading/validation failure
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_roundtrip() {
        let config = RunConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back.duration, config.duration);
        assert_eq!(back.balls.len(), 1);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let back: RunConfig =
            serde_json::from_str(r#"{"duration": 10.0, "fps": 30}"#).unwrap();
        assert_eq!(back.duration, 10.0);
        assert_eq!(back.fps, 30);
        assert_eq!(back.video_size, [1080.0, 1920.0]);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = RunConfig::default();
        config.duration = 0.0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.balls[0].radius = -1.0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.balls.push(BallConfig::default()); // duplicate id 0
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.balls[0].grow_start_radius = Some(10.0); // partial schedule
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config
            .ball_audio
            .insert(5, AudioRoute { mode: AudioMode::Clip, path: None });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_obstacle_config_tagged_parse() {
        let json = r#"{
            "shape": "gap_circle",
            "center": [540.0, 960.0],
            "start_radius": 550.0,
            "end_radius": 30.0,
            "gap_angle_deg": 30.0,
            "rotation_mode": "anti-clockwise",
            "disappear_on_gap_pass": true
        }"#;
        let parsed: ObstacleConfig = serde_json::from_str(json).unwrap();
        match parsed {
            ObstacleConfig::GapCircle {
                rotation_mode,
                disappear_on_gap_pass,
                ..
            } => {
                assert_eq!(rotation_mode, crate::sim::RotationMode::AntiClockwise);
                assert!(disappear_on_gap_pass);
            }
            other => panic!("parsed wrong variant: {other:?}"),
        }
    }
}
