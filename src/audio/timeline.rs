//! Event/audio scheduler
//!
//! Turns the run's recorded collision timestamps into audio timelines. The
//! song timeline needs the complete timestamp set before it can be built:
//! interval merging has no streaming form, which is why runs are two-pass.

use std::path::{Path, PathBuf};

use crate::audio::buffer::AudioBuffer;
use crate::audio::loader::ClipLibrary;
use crate::consts::EXCERPT_TAIL;

/// Merge bounce timestamps into non-overlapping activity intervals.
///
/// Each timestamp opens (or extends) a window `[t, t + chunk_padding]`;
/// overlapping windows fuse. The result is sorted and disjoint.
pub fn merge_bounce_times(bounce_times: &[f32], chunk_padding: f32) -> Vec<(f32, f32)> {
    if bounce_times.is_empty() {
        return Vec::new();
    }

    let mut times = bounce_times.to_vec();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut intervals = Vec::new();
    let mut current_start = times[0];
    let mut current_end = current_start + chunk_padding;
    for &t in &times[1..] {
        if t <= current_end {
            current_end = current_end.max(t + chunk_padding);
        } else {
            intervals.push((current_start, current_end));
            current_start = t;
            current_end = t + chunk_padding;
        }
    }
    intervals.push((current_start, current_end));
    intervals
}

/// Build the song-excerpt timeline: the song plays only inside the merged
/// activity intervals, and its own playhead advances only while playing.
///
/// Returns `None` (the mode contributes nothing) when the song cannot be
/// loaded; the failure is logged, not fatal.
pub fn build_song_audio(
    duration: f32,
    collision_intervals: &[(f32, f32)],
    song_path: &Path,
    library: &dyn ClipLibrary,
    volume: f32,
    sample_rate: u32,
) -> Option<AudioBuffer> {
    let song = match library.load(song_path, sample_rate) {
        Ok(song) => song,
        Err(e) => {
            log::error!("song audio unavailable: {e}");
            return None;
        }
    };

    let mut segments = Vec::new();
    let mut song_cursor = 0.0_f32;
    let mut timeline_cursor = 0.0_f32;

    for &(start, end) in collision_intervals {
        let extended_end = (end + EXCERPT_TAIL).min(duration);
        let chunk = (extended_end - start).max(0.0);

        if start > timeline_cursor {
            segments.push(AudioBuffer::silence(start - timeline_cursor, sample_rate));
            timeline_cursor = start;
        }

        // Clamp to the song's end; an exhausted song yields empty excerpts
        // and the trailing pad below covers the rest.
        let excerpt = if song_cursor + chunk <= song.duration() {
            song.subclip(song_cursor, song_cursor + chunk)
        } else {
            song.subclip(song_cursor, song.duration())
        };
        segments.push(excerpt);
        timeline_cursor = extended_end;
        song_cursor += chunk;

        if timeline_cursor >= duration {
            break;
        }
    }

    if timeline_cursor < duration {
        segments.push(AudioBuffer::silence(duration - timeline_cursor, sample_rate));
    }

    Some(
        AudioBuffer::concat(&segments)
            .set_duration(duration)
            .gain(volume),
    )
}

/// Build the clip timeline: silence between events, one clip spliced in per
/// event, trailing silence out to `duration`.
///
/// No events, or any load failure, degrades the whole track to silence.
pub fn build_clip_audio(
    duration: f32,
    collision_events: &[(f32, PathBuf)],
    library: &dyn ClipLibrary,
    sample_rate: u32,
) -> AudioBuffer {
    if collision_events.is_empty() {
        return AudioBuffer::silence(duration, sample_rate);
    }

    let mut events = collision_events.to_vec();
    events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut clips = Vec::new();
    let mut last_time = 0.0_f32;
    for (t, path) in &events {
        if *t > last_time {
            clips.push(AudioBuffer::silence(t - last_time, sample_rate));
        }
        let clip = match library.load(path, sample_rate) {
            Ok(clip) => clip,
            Err(e) => {
                log::error!("clip audio unavailable, using silence track: {e}");
                return AudioBuffer::silence(duration, sample_rate);
            }
        };
        last_time = t + clip.duration();
        clips.push(clip);
    }
    if last_time < duration {
        clips.push(AudioBuffer::silence(duration - last_time, sample_rate));
    }

    AudioBuffer::concat(&clips).set_duration(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::loader::MemoryLibrary;
    use proptest::prelude::*;

    const SR: u32 = 1000;

    #[test]
    fn test_merge_example_intervals() {
        let intervals = merge_bounce_times(&[0.0, 0.05, 0.5], 0.1);
        assert_eq!(intervals.len(), 2);
        assert!((intervals[0].0 - 0.0).abs() < 1e-6);
        assert!((intervals[0].1 - 0.15).abs() < 1e-6);
        assert!((intervals[1].0 - 0.5).abs() < 1e-6);
        assert!((intervals[1].1 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_bounce_times(&[], 0.1).is_empty());
    }

    #[test]
    fn test_merge_unsorted_input() {
        let intervals = merge_bounce_times(&[0.5, 0.0, 0.05], 0.1);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].0, 0.0);
    }

    proptest! {
        #[test]
        fn prop_merge_is_sorted_and_disjoint(
            times in proptest::collection::vec(0.0_f32..100.0, 0..50),
            padding in 0.01_f32..1.0,
        ) {
            let intervals = merge_bounce_times(&times, padding);
            for pair in intervals.windows(2) {
                prop_assert!(pair[0].1 < pair[1].0);
            }
            for &(start, end) in &intervals {
                prop_assert!(end >= start + padding - 1e-4);
            }
        }

        #[test]
        fn prop_merge_is_idempotent(
            times in proptest::collection::vec(0.0_f32..100.0, 1..50),
            padding in 0.01_f32..1.0,
        ) {
            let once = merge_bounce_times(&times, padding);
            let starts: Vec<f32> = once.iter().map(|&(s, _)| s).collect();
            let twice = merge_bounce_times(&starts, padding);
            // Same interval count and the same starts survive a re-merge
            prop_assert_eq!(once.len(), twice.len());
            for (a, b) in once.iter().zip(&twice) {
                prop_assert!((a.0 - b.0).abs() < 1e-5);
            }
        }

        #[test]
        fn prop_close_timestamps_share_an_interval(
            t in 0.0_f32..100.0,
            delta in 0.0_f32..0.1,
        ) {
            let intervals = merge_bounce_times(&[t, t + delta], 0.1);
            prop_assert_eq!(intervals.len(), 1);
        }
    }

    fn library_with_song(duration: f32) -> MemoryLibrary {
        let mut library = MemoryLibrary::new();
        // Constant-value song so excerpt placement is detectable
        let frames = (duration * SR as f32) as usize;
        library.insert(
            "song.mp3",
            AudioBuffer::from_samples(vec![1.0; frames * 2], 2, SR),
        );
        library
    }

    #[test]
    fn test_song_timeline_exact_duration() {
        let library = library_with_song(60.0);
        for intervals in [
            vec![],
            vec![(0.0, 0.15)],
            vec![(1.0, 2.0), (5.0, 5.5), (9.7, 9.95)],
        ] {
            let audio = build_song_audio(
                10.0,
                &intervals,
                Path::new("song.mp3"),
                &library,
                1.0,
                SR,
            )
            .unwrap();
            assert_eq!(audio.frames(), 10_000);
        }
    }

    #[test]
    fn test_song_plays_only_inside_intervals() {
        let library = library_with_song(60.0);
        let audio = build_song_audio(
            2.0,
            &[(1.0, 1.5)],
            Path::new("song.mp3"),
            &library,
            1.0,
            SR,
        )
        .unwrap();

        let samples = audio.samples();
        // Before the interval: silence
        assert_eq!(samples[2 * 500], 0.0);
        // Inside the interval: song
        assert_eq!(samples[2 * 1100], 1.0);
        // Well after interval end (+ tail buffer): silence again
        assert_eq!(samples[2 * 1900], 0.0);
    }

    #[test]
    fn test_song_cursor_skips_nothing_between_bursts() {
        // Song = ramp so we can see which part plays
        let mut library = MemoryLibrary::new();
        let frames = 10 * SR as usize;
        let ramp: Vec<f32> = (0..frames * 2).map(|i| (i / 2) as f32).collect();
        library.insert("ramp.mp3", AudioBuffer::from_samples(ramp, 2, SR));

        let audio = build_song_audio(
            4.0,
            &[(0.0, 0.5), (2.0, 2.5)],
            Path::new("ramp.mp3"),
            &library,
            1.0,
            SR,
        )
        .unwrap();

        let samples = audio.samples();
        // Second burst starts where the first left off (0.6s of song played:
        // 0.5 interval + 0.1 tail), not at the 2.0s mark of the song.
        let second_burst_start = samples[2 * 2000];
        assert!((second_burst_start - 600.0).abs() < 2.0);
    }

    #[test]
    fn test_song_missing_source_degrades() {
        let library = MemoryLibrary::new();
        let audio = build_song_audio(
            5.0,
            &[(0.0, 1.0)],
            Path::new("missing.mp3"),
            &library,
            1.0,
            SR,
        );
        assert!(audio.is_none());
    }

    #[test]
    fn test_clip_timeline_placement_and_padding() {
        let mut library = MemoryLibrary::new();
        library.insert(
            "tick.wav",
            AudioBuffer::from_samples(vec![1.0; 200], 2, SR), // 0.1s
        );

        let events = vec![
            (1.0, PathBuf::from("tick.wav")),
            (3.0, PathBuf::from("tick.wav")),
        ];
        let audio = build_clip_audio(5.0, &events, &library, SR);

        assert_eq!(audio.frames(), 5_000);
        let samples = audio.samples();
        assert_eq!(samples[2 * 500], 0.0); // gap before first event
        assert_eq!(samples[2 * 1050], 1.0); // first clip
        assert_eq!(samples[2 * 2000], 0.0); // between events
        assert_eq!(samples[2 * 3050], 1.0); // second clip
        assert_eq!(samples[2 * 4500], 0.0); // trailing pad
    }

    #[test]
    fn test_clip_timeline_no_events_is_silence() {
        let library = MemoryLibrary::new();
        let audio = build_clip_audio(3.0, &[], &library, SR);
        assert_eq!(audio.frames(), 3_000);
        assert!(audio.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_clip_timeline_missing_clip_degrades_to_silence() {
        let library = MemoryLibrary::new();
        let events = vec![(1.0, PathBuf::from("gone.wav"))];
        let audio = build_clip_audio(3.0, &events, &library, SR);
        assert_eq!(audio.frames(), 3_000);
        assert!(audio.samples().iter().all(|&s| s == 0.0));
    }
}
