//! Obstacle family: circle, square and rotating-gap circle
//!
//! Every variant exposes the same surface: an activity window, a drawable
//! outline and a collision response that mutates the ball and reports what
//! happened. The gap circle carries the only extra mutable state, a one-way
//! `active` latch that fires when a ball escapes through the gap.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::color::{ColorMode, Rgb, color_at};
use crate::consts::{SEPARATION_DT, SEPARATION_MAX_STEPS, STROKE_WIDTH};
use crate::normalize_angle;
use crate::render::{DrawCommand, Renderer};
use crate::sim::ball::Ball;
use crate::sim::collision::CollisionKind;

/// Rotation direction of the gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationMode {
    #[default]
    Clockwise,
    AntiClockwise,
    None,
}

/// Activity window and outline color shared by all obstacle shapes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleStyle {
    pub start_time: f32,
    pub end_time: f32,
    pub color: Rgb,
    pub color_mode: ColorMode,
}

impl ObstacleStyle {
    pub fn is_active(&self, t: f32) -> bool {
        self.start_time <= t && t <= self.end_time
    }
}

/// Circular boundary that may grow across its activity window
#[derive(Debug, Clone)]
pub struct CircleObstacle {
    pub center: Vec2,
    pub start_radius: f32,
    pub end_radius: f32,
    pub fill_color: Option<Rgb>,
    pub style: ObstacleStyle,
}

impl CircleObstacle {
    /// Radius at time `t`: linear across the activity window, start radius
    /// outside it.
    pub fn current_radius(&self, t: f32) -> f32 {
        if !self.style.is_active(t) {
            return self.start_radius;
        }
        let total = self.style.end_time - self.style.start_time;
        let progress = ((t - self.style.start_time) / total).clamp(0.0, 1.0);
        self.start_radius + (self.end_radius - self.start_radius) * progress
    }

    fn draw(&self, renderer: &mut dyn Renderer, t: f32, rng: &mut impl Rng) {
        if !self.style.is_active(t) {
            return;
        }
        let radius = self.current_radius(t);
        if let Some(fill) = self.fill_color {
            renderer.draw(DrawCommand::FillCircle {
                center: self.center,
                radius,
                color: fill,
            });
        }
        renderer.draw(DrawCommand::StrokeCircle {
            center: self.center,
            radius,
            color: color_at(t, self.style.color, self.style.color_mode, rng),
            thickness: STROKE_WIDTH,
        });
    }

    fn handle_collision(&self, ball: &mut Ball, t: f32) -> Option<CollisionKind> {
        if !self.style.is_active(t) {
            return None;
        }
        let radius = self.current_radius(t);
        if !ball_escapes_circle(ball, self.center, radius) {
            return None;
        }
        reflect_ball_into_circle(ball, self.center, radius)
            .then_some(CollisionKind::ObstacleCircle)
    }
}

/// Axis-aligned square outline
#[derive(Debug, Clone)]
pub struct SquareObstacle {
    pub center: Vec2,
    pub size: f32,
    pub style: ObstacleStyle,
}

impl SquareObstacle {
    fn draw(&self, renderer: &mut dyn Renderer, t: f32, rng: &mut impl Rng) {
        if !self.style.is_active(t) {
            return;
        }
        renderer.draw(DrawCommand::StrokeRect {
            center: self.center,
            size: Vec2::splat(self.size),
            color: color_at(t, self.style.color, self.style.color_mode, rng),
            thickness: STROKE_WIDTH,
        });
    }

    fn handle_collision(&self, ball: &mut Ball, t: f32) -> Option<CollisionKind> {
        if !self.style.is_active(t) {
            return None;
        }

        let half = self.size / 2.0;
        let left = self.center.x - half;
        let right = self.center.x + half;
        let top = self.center.y - half;
        let bottom = self.center.y + half;

        let overlaps = |pos: Vec2, r: f32| {
            pos.x + r > left && pos.x - r < right && pos.y + r > top && pos.y - r < bottom
        };
        if !overlaps(ball.pos, ball.radius) {
            return None;
        }

        // Axis heuristic: reflect whichever axis the ball is displaced
        // farther along. Not a true face normal; the escape loop below
        // corrects the corner cases it mishandles.
        let dx = ball.pos.x - self.center.x;
        let dy = ball.pos.y - self.center.y;
        if dx.abs() > dy.abs() {
            ball.velocity.x = -ball.velocity.x;
        } else {
            ball.velocity.y = -ball.velocity.y;
        }

        let speed = ball.velocity.length();
        if speed > 0.0 {
            ball.velocity = ball.velocity / speed * (speed + ball.speed_increment);
        }

        // Walk the ball out along its reflected velocity until it clears
        // the box. Bounded so a stopped ball cannot spin forever.
        let mut steps = 0;
        while overlaps(ball.pos, ball.radius) && steps < SEPARATION_MAX_STEPS {
            ball.pos += ball.velocity * SEPARATION_DT;
            steps += 1;
        }

        ball.next_color();
        Some(CollisionKind::ObstacleSquare)
    }
}

/// Circle obstacle whose boundary has a rotating angular gap
#[derive(Debug, Clone)]
pub struct GapCircleObstacle {
    pub circle: CircleObstacle,
    /// Angular width of the gap (radians)
    pub gap_angle: f32,
    /// Gap center at t = 0 (radians)
    pub gap_offset: f32,
    /// Rotation speed (radians per second)
    pub rotation_speed: f32,
    pub rotation: RotationMode,
    /// Latch the obstacle off once a ball exits through the gap
    pub disappear_on_gap_pass: bool,
    /// One-way latch; never resets within a run
    active: bool,
}

impl GapCircleObstacle {
    pub fn new(
        circle: CircleObstacle,
        gap_angle: f32,
        gap_offset: f32,
        rotation_speed: f32,
        rotation: RotationMode,
        disappear_on_gap_pass: bool,
    ) -> Self {
        Self {
            circle,
            gap_angle,
            gap_offset,
            rotation_speed,
            rotation,
            disappear_on_gap_pass,
            active: true,
        }
    }

    pub fn is_active(&self, t: f32) -> bool {
        self.circle.style.is_active(t) && self.active
    }

    /// Gap center angle at time `t`. Pure in t while active; frozen at the
    /// offset once the latch fires.
    pub fn current_gap_angle(&self, t: f32) -> f32 {
        if !self.is_active(t) {
            return self.gap_offset;
        }
        let direction = match self.rotation {
            RotationMode::Clockwise => -1.0,
            RotationMode::AntiClockwise => 1.0,
            RotationMode::None => return self.gap_offset,
        };
        normalize_angle(self.gap_offset + self.rotation_speed * t * direction)
    }

    fn draw(&self, renderer: &mut dyn Renderer, t: f32, rng: &mut impl Rng) {
        if !self.is_active(t) {
            return;
        }
        let radius = self.circle.current_radius(t);
        if let Some(fill) = self.circle.fill_color {
            renderer.draw(DrawCommand::FillCircle {
                center: self.circle.center,
                radius,
                color: fill,
            });
        }
        // One arc spanning everything except the gap
        let gap_center = self.current_gap_angle(t);
        let start_angle = normalize_angle(gap_center + self.gap_angle / 2.0);
        renderer.draw(DrawCommand::StrokeArc {
            center: self.circle.center,
            radius,
            start_angle,
            end_angle: start_angle + (TAU - self.gap_angle),
            color: color_at(t, self.circle.style.color, self.circle.style.color_mode, rng),
            thickness: STROKE_WIDTH,
        });
    }

    fn handle_collision(&mut self, ball: &mut Ball, t: f32) -> Option<CollisionKind> {
        if !self.is_active(t) {
            return None;
        }

        let radius = self.circle.current_radius(t);
        if !ball_escapes_circle(ball, self.circle.center, radius) {
            return None;
        }
        let delta = ball.pos - self.circle.center;
        if delta.length() == 0.0 {
            return None;
        }

        let angle = normalize_angle(delta.y.atan2(delta.x));
        let gap_center = self.current_gap_angle(t);
        let gap_start = normalize_angle(gap_center - self.gap_angle / 2.0);
        let gap_end = normalize_angle(gap_center + self.gap_angle / 2.0);

        let in_gap = if gap_start < gap_end {
            gap_start <= angle && angle <= gap_end
        } else {
            // Gap spans the 0/2π seam
            angle >= gap_start || angle <= gap_end
        };

        if in_gap {
            if self.disappear_on_gap_pass {
                self.active = false;
            }
            return None;
        }

        reflect_ball_into_circle(ball, self.circle.center, radius)
            .then_some(CollisionKind::GapCircle)
    }
}

/// True if the ball's outer edge pokes past the circular boundary
fn ball_escapes_circle(ball: &Ball, center: Vec2, radius: f32) -> bool {
    (ball.pos - center).length() + ball.radius > radius
}

/// Snap the ball to the boundary, reflect its velocity along the outward
/// normal with a `(1 + restitution)` impulse, then renormalize speed by the
/// ball's fixed increment. Returns false for the degenerate centered ball.
fn reflect_ball_into_circle(ball: &mut Ball, center: Vec2, radius: f32) -> bool {
    let delta = ball.pos - center;
    let dist = delta.length();
    if dist == 0.0 {
        return false;
    }

    let normal = delta / dist;
    ball.pos = center + normal * (radius - ball.radius);

    let velocity_component = ball.velocity.dot(normal);
    ball.velocity -= (1.0 + ball.restitution) * velocity_component * normal;

    let speed = ball.velocity.length();
    if speed > 0.0 {
        ball.velocity = ball.velocity / speed * (speed + ball.speed_increment);
    }

    ball.next_color();
    true
}

/// The polymorphic obstacle
#[derive(Debug, Clone)]
pub enum Obstacle {
    Circle(CircleObstacle),
    Square(SquareObstacle),
    GapCircle(GapCircleObstacle),
}

impl Obstacle {
    pub fn is_active(&self, t: f32) -> bool {
        match self {
            Obstacle::Circle(c) => c.style.is_active(t),
            Obstacle::Square(s) => s.style.is_active(t),
            Obstacle::GapCircle(g) => g.is_active(t),
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, t: f32, rng: &mut impl Rng) {
        match self {
            Obstacle::Circle(c) => c.draw(renderer, t, rng),
            Obstacle::Square(s) => s.draw(renderer, t, rng),
            Obstacle::GapCircle(g) => g.draw(renderer, t, rng),
        }
    }

    /// Run collision response against one ball. No-op outside the activity
    /// window (and after the gap latch has fired).
    pub fn handle_collision(&mut self, ball: &mut Ball, t: f32) -> Option<CollisionKind> {
        match self {
            Obstacle::Circle(c) => c.handle_collision(ball, t),
            Obstacle::Square(s) => s.handle_collision(ball, t),
            Obstacle::GapCircle(g) => g.handle_collision(ball, t),
        }
    }
}
