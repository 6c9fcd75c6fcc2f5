//! Audio source loading
//!
//! The scheduler only sees [`ClipLibrary`]; real files decode through rodio
//! with channel/rate conversion to the run's output format, and tests feed
//! in-memory buffers instead.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::Decoder;
use rodio::source::UniformSourceIterator;

use crate::audio::buffer::AudioBuffer;
use crate::consts::AUDIO_CHANNELS;

/// Failure to produce a buffer from a source path
#[derive(Debug)]
pub enum AudioError {
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
    /// A path the library has no entry for (memory library only)
    Missing(PathBuf),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Open { path, source } => {
                write!(f, "failed to open {}: {source}", path.display())
            }
            AudioError::Decode { path, source } => {
                write!(f, "failed to decode {}: {source}", path.display())
            }
            AudioError::Missing(path) => write!(f, "no audio loaded for {}", path.display()),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Open { source, .. } => Some(source),
            AudioError::Decode { source, .. } => Some(source),
            AudioError::Missing(_) => None,
        }
    }
}

/// Loads audio sources by path at a target sample rate
pub trait ClipLibrary {
    fn load(&self, path: &Path, sample_rate: u32) -> Result<AudioBuffer, AudioError>;
}

/// Decodes files from disk via rodio
#[derive(Debug, Default)]
pub struct RodioLibrary;

impl ClipLibrary for RodioLibrary {
    fn load(&self, path: &Path, sample_rate: u32) -> Result<AudioBuffer, AudioError> {
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        // Convert whatever the file contains to the run's stereo format
        let converted: UniformSourceIterator<_, f32> =
            UniformSourceIterator::new(decoder, AUDIO_CHANNELS, sample_rate);
        let samples: Vec<f32> = converted.collect();
        Ok(AudioBuffer::from_samples(samples, AUDIO_CHANNELS, sample_rate))
    }
}

/// Preloaded buffers keyed by path (tests, pre-decoded assets)
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    clips: HashMap<PathBuf, AudioBuffer>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, buffer: AudioBuffer) {
        self.clips.insert(path.into(), buffer);
    }
}

impl ClipLibrary for MemoryLibrary {
    fn load(&self, path: &Path, _sample_rate: u32) -> Result<AudioBuffer, AudioError> {
        self.clips
            .get(path)
            .cloned()
            .ok_or_else(|| AudioError::Missing(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_library_hit_and_miss() {
        let mut library = MemoryLibrary::new();
        library.insert("a.wav", AudioBuffer::silence(1.0, 1000));

        assert!(library.load(Path::new("a.wav"), 1000).is_ok());
        let err = library.load(Path::new("b.wav"), 1000).unwrap_err();
        assert!(matches!(err, AudioError::Missing(_)));
    }

    #[test]
    fn test_rodio_library_reports_missing_file() {
        let err = RodioLibrary
            .load(Path::new("/nonexistent/audio.mp3"), 44_100)
            .unwrap_err();
        assert!(matches!(err, AudioError::Open { .. }));
    }
}
