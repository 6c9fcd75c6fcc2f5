//! Deterministic simulation module
//!
//! All physics and collision logic lives here. This module must stay pure
//! and deterministic:
//! - Steps driven by externally supplied sample times, in strict order
//! - Seeded RNG only (obstacle color animation)
//! - No rendering or audio dependencies beyond the draw-command contract

pub mod ball;
pub mod collision;
pub mod obstacle;
pub mod stepper;

pub use ball::{Ball, GrowthSchedule, TrailPoint};
pub use collision::{CollisionEvent, CollisionKind, PairKey, resolve_ball_collision};
pub use obstacle::{
    CircleObstacle, GapCircleObstacle, Obstacle, ObstacleStyle, RotationMode, SquareObstacle,
};
pub use stepper::{EventRouter, Simulation};
