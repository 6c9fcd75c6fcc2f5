//! Ball entity
//!
//! Owns kinematic state, the growth schedule, the trail history and the
//! color-cycling rules. `update` returns whether the ball bounced off an
//! arena edge this step; the stepper turns that into an event.

use glam::Vec2;

use crate::color::Rgb;
use crate::config::{BallConfig, BorderColorMode, TrailColorMode};
use crate::consts::{SPEED_EPSILON, STROKE_WIDTH};
use crate::render::{DrawCommand, Renderer};

/// Appearance snapshot stored when `trail_lock_appearance` is set
#[derive(Debug, Clone, Copy)]
pub struct LockedStyle {
    pub color: Rgb,
    pub border_color: Option<Rgb>,
    pub radius: f32,
}

/// One historical trail sample
#[derive(Debug, Clone, Copy)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub time: f32,
    /// Frozen appearance, if locking is enabled
    pub locked: Option<LockedStyle>,
}

/// Radius interpolation window
#[derive(Debug, Clone, Copy)]
pub struct GrowthSchedule {
    pub start_radius: f32,
    pub end_radius: f32,
    pub start_time: f32,
    pub end_time: f32,
}

impl GrowthSchedule {
    /// Radius at time `t`, clamped to the boundary values outside the window
    pub fn radius_at(&self, t: f32) -> f32 {
        let span = self.end_time - self.start_time;
        if span <= 0.0 {
            return self.end_radius;
        }
        let progress = ((t - self.start_time) / span).clamp(0.0, 1.0);
        self.start_radius + progress * (self.end_radius - self.start_radius)
    }
}

/// Trail behavior (all per-ball configuration)
#[derive(Debug, Clone)]
pub struct TrailSettings {
    pub enabled: bool,
    pub length: usize,
    pub fade_time: f32,
    pub thickness: f32,
    pub color_mode: TrailColorMode,
    pub color: Rgb,
    pub match_radius: bool,
    pub lock_appearance: bool,
}

/// A ball entity
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub speed_increment: f32,
    pub restitution: f32,

    pub start_time: f32,
    pub move_start_time: f32,
    pub free_time: Option<f32>,
    pub growth: Option<GrowthSchedule>,

    pub gravity_enabled: bool,
    pub gravity_strength: f32,
    pub bounce_on_edges: bool,

    pub palette: Vec<Rgb>,
    pub color_index: usize,
    pub color: Rgb,
    pub frozen_color: Rgb,
    pub border_palette: Vec<Rgb>,
    pub border_color_mode: BorderColorMode,
    pub border_color_index: usize,
    pub border_color: Option<Rgb>,

    pub trail_settings: TrailSettings,
    pub trail: Vec<TrailPoint>,

    pub is_visible: bool,
    pub is_moving: bool,

    arena: Vec2,
}

impl Ball {
    /// Build a ball from validated configuration. `palette` and
    /// `border_palette` are owned per ball; there is no shared color state.
    pub fn from_config(
        cfg: &BallConfig,
        arena: Vec2,
        palette: Vec<Rgb>,
        border_palette: Vec<Rgb>,
    ) -> Self {
        let pos = cfg.start_pos.map(Vec2::from).unwrap_or(arena / 2.0);

        let velocity = match cfg.initial_velocity {
            Some(dir) => {
                let dir = Vec2::from(dir);
                let norm = dir.length();
                if norm > 0.0 {
                    dir / norm * cfg.start_speed
                } else {
                    Vec2::new(0.0, cfg.start_speed)
                }
            }
            None => Vec2::new(0.0, cfg.start_speed),
        };

        let color_index = cfg
            .start_color
            .and_then(|c| palette.iter().position(|&p| p == c))
            .unwrap_or(0);
        let color = palette[color_index];
        let border_color = cfg.border_color.or_else(|| border_palette.first().copied());

        let growth = match (
            cfg.grow_start_radius,
            cfg.grow_end_radius,
            cfg.grow_start_time,
            cfg.grow_end_time,
        ) {
            (Some(start_radius), Some(end_radius), Some(start_time), Some(end_time)) => {
                Some(GrowthSchedule {
                    start_radius,
                    end_radius,
                    start_time,
                    end_time,
                })
            }
            _ => None,
        };

        Self {
            id: cfg.id,
            pos,
            velocity,
            radius: cfg.radius,
            speed_increment: cfg.speed_increment,
            restitution: cfg.restitution,
            start_time: cfg.start_time,
            move_start_time: cfg.move_start_time,
            free_time: cfg.free_time,
            growth,
            gravity_enabled: cfg.gravity_enabled,
            gravity_strength: cfg.gravity_strength,
            bounce_on_edges: cfg.bounce_on_edges,
            palette,
            color_index,
            color,
            frozen_color: cfg.frozen_color,
            border_palette,
            border_color_mode: cfg.border_color_mode,
            border_color_index: 0,
            border_color,
            trail_settings: TrailSettings {
                enabled: cfg.trail_enabled,
                length: cfg.trail_length,
                fade_time: cfg.trail_fade_time,
                thickness: cfg.trail_thickness,
                color_mode: cfg.trail_color_mode,
                color: cfg.trail_color,
                match_radius: cfg.trail_match_radius,
                lock_appearance: cfg.trail_lock_appearance,
            },
            trail: Vec::new(),
            is_visible: false,
            is_moving: false,
            arena,
        }
    }

    /// Advance the fill color one palette slot (wraps)
    pub fn next_color(&mut self) {
        self.color_index = (self.color_index + 1) % self.palette.len();
        self.color = self.palette[self.color_index];
    }

    /// Advance kinematics by `dt` at absolute time `t`.
    ///
    /// Returns `true` if the ball bounced off an arena edge.
    pub fn update(&mut self, dt: f32, t: f32) -> bool {
        if let Some(growth) = self.growth {
            self.radius = growth.radius_at(t);
        }

        self.is_visible = t >= self.start_time;
        self.is_moving = t >= self.move_start_time;

        if let Some(free_time) = self.free_time {
            if t >= free_time {
                // Terminal state: frozen in place, locked to the frozen color
                self.is_moving = false;
                self.color = self.frozen_color;
            }
        }

        if !self.is_moving {
            return false;
        }

        if self.gravity_enabled {
            self.velocity.y += self.gravity_strength * dt;
        }

        if self.trail_settings.enabled {
            let locked = self.trail_settings.lock_appearance.then(|| LockedStyle {
                color: self.color,
                border_color: self.border_color,
                radius: self.radius,
            });
            self.trail.push(TrailPoint {
                pos: self.pos,
                time: t,
                locked,
            });
            if self.trail.len() > self.trail_settings.length {
                self.trail.remove(0);
            }
        }

        self.pos += self.velocity * dt;
        let mut bounced = false;

        if self.bounce_on_edges {
            if self.pos.x - self.radius <= 0.0 {
                self.pos.x = self.radius;
                self.velocity.x = -self.velocity.x;
                bounced = true;
            } else if self.pos.x + self.radius >= self.arena.x {
                self.pos.x = self.arena.x - self.radius;
                self.velocity.x = -self.velocity.x;
                bounced = true;
            }

            if self.pos.y - self.radius <= 0.0 {
                self.pos.y = self.radius;
                self.velocity.y = -self.velocity.y;
                bounced = true;
            } else if self.pos.y + self.radius >= self.arena.y {
                self.pos.y = self.arena.y - self.radius;
                self.velocity.y = -self.velocity.y;
                bounced = true;
            }
        }

        if bounced {
            if self.restitution == 0.0 {
                self.velocity = Vec2::ZERO;
            } else {
                self.velocity *= self.restitution;
            }

            let speed = self.velocity.length();
            if speed > 0.0 {
                self.velocity = self.velocity / speed * (speed + self.speed_increment);
            }

            self.next_color();

            if self.border_color_mode == BorderColorMode::Cycle {
                self.border_color_index = (self.border_color_index + 1) % self.border_palette.len();
                self.border_color = Some(self.border_palette[self.border_color_index]);
            }
        }

        if self.velocity.length() < SPEED_EPSILON {
            self.velocity = Vec2::ZERO;
        }

        bounced
    }

    /// Emit draw commands for the trail and the ball body
    pub fn draw(&self, renderer: &mut dyn Renderer, t: f32) {
        if !self.is_visible {
            return;
        }

        let ts = &self.trail_settings;
        if ts.enabled {
            for point in &self.trail {
                let alpha = (1.0 - (t - point.time) / ts.fade_time).max(0.0);
                if alpha <= 0.0 {
                    continue;
                }

                let (color, border_color, radius) = match point.locked {
                    Some(style) => (style.color, style.border_color, style.radius),
                    None => {
                        let color = match ts.color_mode {
                            TrailColorMode::Fade => self.color,
                            TrailColorMode::Fixed => ts.color,
                        };
                        let radius = if ts.match_radius {
                            self.radius
                        } else {
                            ts.thickness
                        };
                        (color, self.border_color, radius)
                    }
                };

                // Locked samples keep their recorded size and color; live
                // samples shrink and dim as they age.
                let draw_radius = if point.locked.is_some() {
                    radius
                } else {
                    (radius * alpha).max(1.0)
                };
                let draw_color = if point.locked.is_some() {
                    color
                } else {
                    color.scaled(alpha)
                };

                if let Some(border) = border_color {
                    renderer.draw(DrawCommand::FillCircle {
                        center: point.pos,
                        radius: draw_radius,
                        color: border,
                    });
                }
                renderer.draw(DrawCommand::FillCircle {
                    center: point.pos,
                    radius: (draw_radius - STROKE_WIDTH).max(1.0),
                    color: draw_color,
                });
            }
        }

        renderer.draw(DrawCommand::FillCircle {
            center: self.pos,
            radius: self.radius,
            color: self.color,
        });
        if let Some(border) = self.border_color {
            renderer.draw(DrawCommand::StrokeCircle {
                center: self.pos,
                radius: self.radius,
                color: border,
                thickness: STROKE_WIDTH,
            });
        }
    }
}
