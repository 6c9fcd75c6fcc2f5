//! In-memory audio buffers
//!
//! The scheduler composes timelines out of interleaved f32 buffers: silence,
//! sub-ranges of a loaded source, concatenation and mixing. Every buffer in
//! one timeline shares the run's channel count and sample rate (the loader
//! converts on decode).

/// Interleaved f32 samples at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            samples,
        }
    }

    /// A silent stereo buffer of the given duration
    pub fn silence(duration: f32, sample_rate: u32) -> Self {
        let channels = crate::consts::AUDIO_CHANNELS;
        let frames = (duration.max(0.0) * sample_rate as f32) as usize;
        Self {
            channels,
            sample_rate,
            samples: vec![0.0; frames * channels as usize],
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Extract `[start, end)` in seconds, clamped to the buffer. An inverted
    /// or out-of-range request yields an empty buffer.
    pub fn subclip(&self, start: f32, end: f32) -> Self {
        let ch = self.channels as usize;
        let start_frame = ((start.max(0.0) * self.sample_rate as f32) as usize).min(self.frames());
        let end_frame = ((end.max(0.0) * self.sample_rate as f32) as usize).min(self.frames());
        let (start_frame, end_frame) = (start_frame, end_frame.max(start_frame));
        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples: self.samples[start_frame * ch..end_frame * ch].to_vec(),
        }
    }

    /// Join buffers back to back. All parts must share channel count and
    /// sample rate.
    pub fn concat(parts: &[AudioBuffer]) -> Self {
        let first = match parts.first() {
            Some(p) => p,
            None => return AudioBuffer::silence(0.0, crate::consts::DEFAULT_SAMPLE_RATE),
        };
        debug_assert!(
            parts
                .iter()
                .all(|p| p.channels == first.channels && p.sample_rate == first.sample_rate)
        );
        let total = parts.iter().map(|p| p.samples.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for part in parts {
            samples.extend_from_slice(&part.samples);
        }
        Self {
            channels: first.channels,
            sample_rate: first.sample_rate,
            samples,
        }
    }

    /// Sample-wise sum of two timelines; the result spans the longer one
    pub fn mix(&self, other: &AudioBuffer) -> Self {
        debug_assert_eq!(self.channels, other.channels);
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        let (longer, shorter) = if self.samples.len() >= other.samples.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut samples = longer.samples.clone();
        for (out, s) in samples.iter_mut().zip(&shorter.samples) {
            *out += s;
        }
        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples,
        }
    }

    /// Scale every sample by `volume`
    pub fn gain(mut self, volume: f32) -> Self {
        for sample in &mut self.samples {
            *sample *= volume;
        }
        self
    }

    /// Pad with silence or truncate so the buffer lasts exactly `duration`
    pub fn set_duration(mut self, duration: f32) -> Self {
        let target_frames = (duration.max(0.0) * self.sample_rate as f32) as usize;
        let target_samples = target_frames * self.channels as usize;
        self.samples.resize(target_samples, 0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 1000; // small rate keeps the math readable

    #[test]
    fn test_silence_duration() {
        let buffer = AudioBuffer::silence(1.5, SR);
        assert_eq!(buffer.frames(), 1500);
        assert!((buffer.duration() - 1.5).abs() < 1e-6);
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_subclip_bounds() {
        let samples: Vec<f32> = (0..2000).map(|i| i as f32).collect(); // 1s stereo
        let buffer = AudioBuffer::from_samples(samples, 2, SR);

        let mid = buffer.subclip(0.25, 0.75);
        assert_eq!(mid.frames(), 500);
        assert_eq!(mid.samples()[0], 500.0); // frame 250, channel 0

        // Overrunning end clamps
        assert_eq!(buffer.subclip(0.5, 2.0).frames(), 500);
        // Inverted range yields empty
        assert_eq!(buffer.subclip(1.5, 0.5).frames(), 0);
    }

    #[test]
    fn test_concat_and_set_duration() {
        let a = AudioBuffer::silence(0.5, SR);
        let b = AudioBuffer::silence(0.25, SR);
        let joined = AudioBuffer::concat(&[a, b]);
        assert!((joined.duration() - 0.75).abs() < 1e-6);

        let padded = joined.clone().set_duration(1.0);
        assert_eq!(padded.frames(), 1000);
        let cut = joined.set_duration(0.5);
        assert_eq!(cut.frames(), 500);
    }

    #[test]
    fn test_mix_spans_longer_input() {
        let quiet = AudioBuffer::from_samples(vec![0.5; 200], 2, SR);
        let long = AudioBuffer::silence(1.0, SR);
        let mixed = long.mix(&quiet);
        assert_eq!(mixed.frames(), 1000);
        assert_eq!(mixed.samples()[0], 0.5);
        assert_eq!(mixed.samples()[300], 0.0);
    }

    #[test]
    fn test_gain() {
        let buffer = AudioBuffer::from_samples(vec![0.5, -0.5], 2, SR).gain(0.6);
        assert!((buffer.samples()[0] - 0.3).abs() < 1e-6);
        assert!((buffer.samples()[1] + 0.3).abs() < 1e-6);
    }
}
