//! Ball-ball collision resolution and collision event types

use serde::{Deserialize, Serialize};

use crate::sim::ball::Ball;

/// What a ball collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Arena edge
    Wall,
    ObstacleCircle,
    ObstacleSquare,
    GapCircle,
    BallBall,
}

/// One collision, as recorded by the stepper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub time: f32,
    pub ball_id: u32,
    pub kind: CollisionKind,
}

/// Order-independent identity for an unordered ball pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(u32, u32);

impl PairKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Resolve a collision between two balls.
///
/// Returns `true` if the pair collided. Separated or exactly coincident
/// pairs are skipped, as are pairs that are not closing. The impulse uses
/// the minimum restitution of the pair; a stationary ball is treated as
/// immovable, so the moving ball takes the full impulse and only moving
/// balls are pushed apart.
pub fn resolve_ball_collision(ball1: &mut Ball, ball2: &mut Ball) -> bool {
    let delta = ball1.pos - ball2.pos;
    let dist = delta.length();
    if dist == 0.0 || dist >= ball1.radius + ball2.radius {
        return false;
    }

    let normal = delta / dist;
    let rel_vel = ball1.velocity - ball2.velocity;
    let vel_along_normal = rel_vel.dot(normal);
    if vel_along_normal >= 0.0 {
        return false;
    }

    let restitution = ball1.restitution.min(ball2.restitution);
    let impulse = -(1.0 + restitution) * vel_along_normal / 2.0;
    let impulse_vec = impulse * normal;

    if ball1.is_moving && ball2.is_moving {
        ball1.velocity += impulse_vec;
        ball2.velocity -= impulse_vec;
    } else if ball1.is_moving {
        ball1.velocity += 2.0 * impulse_vec;
    } else if ball2.is_moving {
        ball2.velocity -= 2.0 * impulse_vec;
    }

    let overlap = (ball1.radius + ball2.radius - dist) / 2.0;
    if ball1.is_moving {
        ball1.pos += normal * overlap;
    }
    if ball2.is_moving {
        ball2.pos -= normal * overlap;
    }

    true
}
