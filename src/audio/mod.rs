//! Collision-driven audio timeline construction
//!
//! Buffers are plain interleaved samples; the scheduler assembles them into
//! a track of exactly the run's duration. File decoding sits behind the
//! [`ClipLibrary`] seam so the scheduler itself never touches I/O.

pub mod buffer;
pub mod loader;
pub mod timeline;

pub use buffer::AudioBuffer;
pub use loader::{AudioError, ClipLibrary, MemoryLibrary, RodioLibrary};
pub use timeline::{build_clip_audio, build_song_audio, merge_bounce_times};
