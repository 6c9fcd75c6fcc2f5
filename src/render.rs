//! Draw-command contract between the simulation and an external encoder
//!
//! The core never touches pixel buffers. Entities describe themselves as
//! filled/outlined circles, rectangles and arcs; whatever paints and encodes
//! frames implements [`Renderer`]. [`FrameRecorder`] captures the command
//! stream so runs stay headless and inspectable in tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// A single primitive draw call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Fill the whole frame
    Clear { color: Rgb },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Rgb,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        color: Rgb,
        thickness: f32,
    },
    StrokeRect {
        center: Vec2,
        size: Vec2,
        color: Rgb,
        thickness: f32,
    },
    /// Circular arc from `start_angle` to `end_angle` (radians, CCW)
    StrokeArc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Rgb,
        thickness: f32,
    },
}

/// Sink for one run's frame stream
pub trait Renderer {
    /// Start the frame sampled at time `t`
    fn begin_frame(&mut self, index: u32, t: f32);
    fn draw(&mut self, command: DrawCommand);
    fn end_frame(&mut self);
}

/// A completed frame as an ordered command list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub index: u32,
    pub time: f32,
    pub commands: Vec<DrawCommand>,
}

/// Records every frame's command list in memory
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: Vec<Frame>,
    current: Vec<DrawCommand>,
    current_index: u32,
    current_time: f32,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for FrameRecorder {
    fn begin_frame(&mut self, index: u32, t: f32) {
        self.current.clear();
        self.current_index = index;
        self.current_time = t;
    }

    fn draw(&mut self, command: DrawCommand) {
        self.current.push(command);
    }

    fn end_frame(&mut self) {
        self.frames.push(Frame {
            index: self.current_index,
            time: self.current_time,
            commands: std::mem::take(&mut self.current),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_collects_frames() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame(0, 0.0);
        rec.draw(DrawCommand::Clear { color: Rgb::BLACK });
        rec.end_frame();
        rec.begin_frame(1, 1.0 / 60.0);
        rec.end_frame();

        assert_eq!(rec.frames.len(), 2);
        assert_eq!(rec.frames[0].commands.len(), 1);
        assert!(rec.frames[1].commands.is_empty());
        assert_eq!(rec.frames[1].index, 1);
    }
}
