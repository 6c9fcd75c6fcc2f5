//! Simulation stepper
//!
//! Advances the world to each externally supplied sample time. Steps must be
//! called in chronological order: each call's dt comes from the previous
//! call's recorded time. Collisions surface as explicit events; the stepper
//! never invokes callbacks.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::config::{AudioMode, AudioRoute};
use crate::render::Renderer;
use crate::sim::ball::Ball;
use crate::sim::collision::{
    CollisionEvent, CollisionKind, PairKey, resolve_ball_collision,
};
use crate::sim::obstacle::Obstacle;

/// Owns all mutable world state for one run
#[derive(Debug)]
pub struct Simulation {
    pub balls: Vec<Ball>,
    pub obstacles: Vec<Obstacle>,
    previous_time: f32,
    /// Pairs already resolved within the current step
    collided_pairs: HashSet<PairKey>,
}

impl Simulation {
    pub fn new(balls: Vec<Ball>, obstacles: Vec<Obstacle>) -> Self {
        Self {
            balls,
            obstacles,
            previous_time: 0.0,
            collided_pairs: HashSet::new(),
        }
    }

    /// Advance to absolute time `t` and return every collision that
    /// happened during this step.
    ///
    /// Order within a step: ball kinematics (edge bounces), then obstacle
    /// responses, then ball-ball resolution with per-pair dedup.
    pub fn step(&mut self, t: f32) -> Vec<CollisionEvent> {
        let dt = t - self.previous_time;
        self.previous_time = t;
        self.collided_pairs.clear();

        let mut events = Vec::new();

        for ball in &mut self.balls {
            if ball.update(dt, t) {
                events.push(CollisionEvent {
                    time: t,
                    ball_id: ball.id,
                    kind: CollisionKind::Wall,
                });
            }
        }

        for obstacle in &mut self.obstacles {
            for ball in &mut self.balls {
                if let Some(kind) = obstacle.handle_collision(ball, t) {
                    events.push(CollisionEvent {
                        time: t,
                        ball_id: ball.id,
                        kind,
                    });
                }
            }
        }

        for i in 0..self.balls.len() {
            for j in (i + 1)..self.balls.len() {
                let (head, tail) = self.balls.split_at_mut(j);
                let ball1 = &mut head[i];
                let ball2 = &mut tail[0];

                let key = PairKey::new(ball1.id, ball2.id);
                if self.collided_pairs.contains(&key) {
                    continue;
                }
                if resolve_ball_collision(ball1, ball2) {
                    self.collided_pairs.insert(key);
                    for id in [ball1.id, ball2.id] {
                        events.push(CollisionEvent {
                            time: t,
                            ball_id: id,
                            kind: CollisionKind::BallBall,
                        });
                    }
                }
            }
        }

        log::trace!("step t={t:.4} dt={dt:.4} events={}", events.len());
        events
    }

    /// Paint the current world state: obstacles first, balls on top
    pub fn draw(&self, renderer: &mut dyn Renderer, t: f32, rng: &mut impl rand::Rng) {
        for obstacle in &self.obstacles {
            obstacle.draw(renderer, t, rng);
        }
        for ball in &self.balls {
            ball.draw(renderer, t);
        }
    }
}

/// Buckets collision events into the two audio sequences by per-ball route
#[derive(Debug, Default)]
pub struct EventRouter {
    routes: HashMap<u32, AudioRoute>,
    /// Timestamps feeding the song-excerpt timeline
    pub bounce_times: Vec<f32>,
    /// Discrete (time, clip path) events feeding the clip timeline
    pub collision_events: Vec<(f32, PathBuf)>,
}

impl EventRouter {
    pub fn new(routes: HashMap<u32, AudioRoute>) -> Self {
        Self {
            routes,
            bounce_times: Vec::new(),
            collision_events: Vec::new(),
        }
    }

    /// Record one event; balls without a route stay silent
    pub fn record(&mut self, event: &CollisionEvent) {
        let Some(route) = self.routes.get(&event.ball_id) else {
            return;
        };
        match route.mode {
            AudioMode::Song => self.bounce_times.push(event.time),
            AudioMode::Clip => {
                if let Some(path) = &route.path {
                    self.collision_events.push((event.time, path.clone()));
                }
            }
        }
    }

    pub fn record_all(&mut self, events: &[CollisionEvent]) {
        for event in events {
            self.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMode, Rgb};
    use crate::config::BallConfig;
    use crate::sim::obstacle::{CircleObstacle, ObstacleStyle};
    use glam::Vec2;

    fn ball(id: u32, pos: [f32; 2], vel: [f32; 2], speed: f32) -> Ball {
        Ball::from_config(
            &BallConfig {
                id,
                start_pos: Some(pos),
                initial_velocity: Some(vel),
                start_speed: speed,
                radius: 10.0,
                restitution: 1.0,
                speed_increment: 0.0,
                gravity_enabled: false,
                bounce_on_edges: true,
                ..BallConfig::default()
            },
            Vec2::new(1000.0, 1000.0),
            crate::color::default_ball_palette(),
            crate::color::default_border_palette(),
        )
    }

    #[test]
    fn test_dt_comes_from_previous_step() {
        let mut sim = Simulation::new(vec![ball(0, [500.0, 500.0], [1.0, 0.0], 100.0)], vec![]);
        sim.step(0.5);
        assert!((sim.balls[0].pos.x - 550.0).abs() < 1e-3);
        sim.step(0.75);
        assert!((sim.balls[0].pos.x - 575.0).abs() < 1e-3);
    }

    #[test]
    fn test_wall_bounce_emits_event() {
        let mut sim = Simulation::new(vec![ball(3, [985.0, 500.0], [1.0, 0.0], 100.0)], vec![]);
        let events = sim.step(0.1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ball_id, 3);
        assert_eq!(events[0].kind, CollisionKind::Wall);
        assert_eq!(events[0].time, 0.1);
    }

    #[test]
    fn test_obstacle_phase_runs_before_ball_pairs() {
        // A circle obstacle small enough that the ball pokes out of it; the
        // obstacle snaps the ball back inside before pair resolution runs.
        let obstacle = Obstacle::Circle(CircleObstacle {
            center: Vec2::new(500.0, 500.0),
            start_radius: 60.0,
            end_radius: 60.0,
            fill_color: None,
            style: ObstacleStyle {
                start_time: 0.0,
                end_time: 9999.0,
                color: Rgb::WHITE,
                color_mode: ColorMode::Static,
            },
        });
        let mut sim = Simulation::new(
            vec![ball(0, [545.0, 500.0], [1.0, 0.0], 120.0)],
            vec![obstacle],
        );
        let events = sim.step(0.05);
        assert!(events.iter().any(|e| e.kind == CollisionKind::ObstacleCircle));
        let ball = &sim.balls[0];
        assert!((ball.pos - Vec2::new(500.0, 500.0)).length() + ball.radius <= 60.0 + 1e-3);
    }

    #[test]
    fn test_pair_resolves_once_per_step() {
        let mut sim = Simulation::new(
            vec![
                ball(1, [100.0, 100.0], [1.0, 0.0], 50.0),
                ball(2, [112.0, 100.0], [-1.0, 0.0], 50.0),
            ],
            vec![],
        );
        let events = sim.step(0.001);
        let pair_events: Vec<_> = events
            .iter()
            .filter(|e| e.kind == CollisionKind::BallBall)
            .collect();
        // One resolution, reported once per participant
        assert_eq!(pair_events.len(), 2);
    }

    #[test]
    fn test_router_buckets_by_mode() {
        let mut routes = HashMap::new();
        routes.insert(
            0,
            AudioRoute {
                mode: AudioMode::Song,
                path: None,
            },
        );
        routes.insert(
            1,
            AudioRoute {
                mode: AudioMode::Clip,
                path: Some(PathBuf::from("sounds/tick.wav")),
            },
        );

        let mut router = EventRouter::new(routes);
        router.record_all(&[
            CollisionEvent {
                time: 1.0,
                ball_id: 0,
                kind: CollisionKind::Wall,
            },
            CollisionEvent {
                time: 2.0,
                ball_id: 1,
                kind: CollisionKind::ObstacleCircle,
            },
            CollisionEvent {
                time: 3.0,
                ball_id: 9, // no route: dropped
                kind: CollisionKind::Wall,
            },
        ]);

        assert_eq!(router.bounce_times, vec![1.0]);
        assert_eq!(router.collision_events.len(), 1);
        assert_eq!(router.collision_events[0].0, 2.0);
    }
}
