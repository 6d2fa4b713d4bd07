//! Capabilities the engine consumes.
//!
//! Measurement, buffering and the bitrate ladder live outside this crate.
//! The engine only reads them through these traits, injected at construction.

use std::sync::Arc;

#[cfg(test)]
use unimock::unimock;

use crate::types::{BufferLevelState, MediaInfo, TrackId};

/// Source of smoothed throughput and latency measurements.
#[cfg_attr(test, unimock(api = ThroughputTrackerMock))]
pub trait ThroughputTracker {
    /// Average throughput for the track, kbit/s.
    fn average_throughput(&self, track: TrackId) -> f64;

    /// Average request latency for the track, ms.
    fn average_latency(&self, track: TrackId) -> f64;
}

/// Buffer occupancy and buffer-state history for a track.
#[cfg_attr(test, unimock(api = BufferStateMock))]
pub trait BufferState {
    /// Seconds of media downloaded but not yet played.
    fn current_buffer_level(&self, track: TrackId) -> f64;

    /// Most recent entry of the buffer-state history, `None` if nothing was recorded yet.
    fn latest_buffer_state(&self, track: TrackId) -> Option<BufferLevelState>;
}

/// Mapping between a track's bitrates and quality indices.
#[cfg_attr(test, unimock(api = QualityLadderMock))]
pub trait QualityLadder {
    /// Available bitrates in bit/s, ascending. Position is the quality index.
    fn bitrate_list(&self, media: &MediaInfo) -> Vec<u64>;

    /// Highest quality index sustainable at `bitrate_kbps` given `latency_ms`.
    fn quality_for_bitrate(&self, media: &MediaInfo, bitrate_kbps: f64, latency_ms: f64)
    -> usize;
}

impl<T: ThroughputTracker + ?Sized> ThroughputTracker for &T {
    fn average_throughput(&self, track: TrackId) -> f64 {
        (**self).average_throughput(track)
    }

    fn average_latency(&self, track: TrackId) -> f64 {
        (**self).average_latency(track)
    }
}

impl<T: ThroughputTracker + ?Sized> ThroughputTracker for Arc<T> {
    fn average_throughput(&self, track: TrackId) -> f64 {
        (**self).average_throughput(track)
    }

    fn average_latency(&self, track: TrackId) -> f64 {
        (**self).average_latency(track)
    }
}

impl<T: BufferState + ?Sized> BufferState for &T {
    fn current_buffer_level(&self, track: TrackId) -> f64 {
        (**self).current_buffer_level(track)
    }

    fn latest_buffer_state(&self, track: TrackId) -> Option<BufferLevelState> {
        (**self).latest_buffer_state(track)
    }
}

impl<T: BufferState + ?Sized> BufferState for Arc<T> {
    fn current_buffer_level(&self, track: TrackId) -> f64 {
        (**self).current_buffer_level(track)
    }

    fn latest_buffer_state(&self, track: TrackId) -> Option<BufferLevelState> {
        (**self).latest_buffer_state(track)
    }
}

impl<T: QualityLadder + ?Sized> QualityLadder for &T {
    fn bitrate_list(&self, media: &MediaInfo) -> Vec<u64> {
        (**self).bitrate_list(media)
    }

    fn quality_for_bitrate(
        &self,
        media: &MediaInfo,
        bitrate_kbps: f64,
        latency_ms: f64,
    ) -> usize {
        (**self).quality_for_bitrate(media, bitrate_kbps, latency_ms)
    }
}

impl<T: QualityLadder + ?Sized> QualityLadder for Arc<T> {
    fn bitrate_list(&self, media: &MediaInfo) -> Vec<u64> {
        (**self).bitrate_list(media)
    }

    fn quality_for_bitrate(
        &self,
        media: &MediaInfo,
        bitrate_kbps: f64,
        latency_ms: f64,
    ) -> usize {
        (**self).quality_for_bitrate(media, bitrate_kbps, latency_ms)
    }
}
