//! Colors, palettes and gradient generation
//!
//! Palettes are per-run data passed into each ball; nothing here is global,
//! so concurrent batch runs cannot interfere with each other.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color. Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Scale each channel by `alpha` in [0, 1] (trail fade-out)
    pub fn scaled(self, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        Rgb(
            (self.0 as f32 * a) as u8,
            (self.1 as f32 * a) as u8,
            (self.2 as f32 * a) as u8,
        )
    }
}

/// How an obstacle's outline color evolves over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Static,
    /// New random color every frame
    Random,
    /// Sine-wave channel sweep over time
    Time,
}

/// Evaluate a color mode at time `t`
pub fn color_at(t: f32, base: Rgb, mode: ColorMode, rng: &mut impl Rng) -> Rgb {
    match mode {
        ColorMode::Static => base,
        ColorMode::Random => Rgb(rng.random(), rng.random(), rng.random()),
        ColorMode::Time => Rgb(
            (127.0 + 127.0 * t.sin()) as u8,
            (127.0 + 127.0 * (t + 2.0).sin()) as u8,
            (127.0 + 127.0 * (t + 4.0).sin()) as u8,
        ),
    }
}

/// Default ball fill palette: red sweeping toward violet and back, with a
/// long red hold at the end of the cycle.
pub fn default_ball_palette() -> Vec<Rgb> {
    let mut colors = Vec::with_capacity(32);
    // Ramp up toward violet
    for i in 0..10 {
        colors.push(Rgb(255, 0, (i * 256 / 18) as u8));
    }
    // Ramp back down
    for i in (0..10).rev() {
        colors.push(Rgb(255, 0, (i * 256 / 18) as u8));
    }
    // Hold on red
    for _ in 0..12 {
        colors.push(Rgb(255, 0, 0));
    }
    colors
}

/// Default border palette: grayscale ramp black -> near-white -> black.
pub fn default_border_palette() -> Vec<Rgb> {
    let mut colors = Vec::with_capacity(56);
    for i in 0..28 {
        let v = (i * 8).min(220) as u8;
        colors.push(Rgb(v, v, v));
    }
    for i in (1..29).rev() {
        let v = ((i - 1) * 8).min(220) as u8;
        colors.push(Rgb(v, v, v));
    }
    colors
}

/// Convert HSV (all components in [0, 1]) to RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let i = h.floor() as i32 % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Hue stop lists that are known to produce pleasant ball palettes
pub const CURATED_HUES: &[&[f32]] = &[
    &[0.0, 0.1, 0.2],
    &[0.9, 0.7, 0.5],
    &[0.0, 0.33, 0.66, 0.0],
    &[0.0, 0.08, 0.17, 0.33],
    &[0.6, 0.4, 0.2, 0.0],
    &[0.0, 0.17, 0.33, 0.5],
    &[0.83, 0.66, 0.5, 0.33],
    &[0.0, 0.1, 0.5, 0.9],
];

/// Interpolate a cyclic palette through the given hue stops.
///
/// `steps` is split evenly across segments; leftover steps go to the earliest
/// segments so the total length is exact.
pub fn multi_stop_gradient(hues: &[f32], steps: usize) -> Vec<Rgb> {
    if hues.len() < 2 {
        return vec![hsv_to_rgb(hues.first().copied().unwrap_or(0.0), 1.0, 1.0); steps.max(1)];
    }
    let segments = hues.len() - 1;
    let steps_per_segment = steps / segments;
    let remainder = steps % segments;

    let mut gradient = Vec::with_capacity(steps);
    for i in 0..segments {
        let (s_hue, e_hue) = (hues[i], hues[i + 1]);
        let seg_steps = steps_per_segment + if i < remainder { 1 } else { 0 };
        for j in 0..seg_steps {
            let ratio = j as f32 / (seg_steps.max(2) - 1) as f32;
            let h = (s_hue + ratio * (e_hue - s_hue)).rem_euclid(1.0);
            gradient.push(hsv_to_rgb(h, 1.0, 1.0));
        }
    }
    gradient
}

/// Generate a random multi-stop gradient (2-5 stops walking the hue wheel)
pub fn random_gradient(rng: &mut impl Rng, steps: usize) -> Vec<Rgb> {
    let base: f32 = rng.random();
    let num_stops = rng.random_range(2..=5);
    let stops: Vec<f32> = (0..num_stops)
        .map(|i| (base + i as f32 / num_stops as f32).rem_euclid(1.0))
        .collect();
    multi_stop_gradient(&stops, steps)
}
