use crate::{traits::QualityLadder, types::MediaInfo};

/// Ordered list of bitrates for one track.
///
/// Quality index `i` is the `i`-th lowest bitrate. Bitrate-to-quality lookup
/// picks the highest bitrate not exceeding the available throughput; when the
/// ladder knows the fragment duration, the throughput is first reduced by the
/// share of each fragment spent waiting on request latency.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitrateLadder {
    bitrates_bps: Vec<u64>,
    fragment_duration_secs: Option<f64>,
}

impl BitrateLadder {
    /// Build a ladder from bitrates in bit/s. Order does not matter.
    #[must_use]
    pub fn new(mut bitrates_bps: Vec<u64>) -> Self {
        bitrates_bps.sort_unstable();
        Self {
            bitrates_bps,
            fragment_duration_secs: None,
        }
    }

    /// Enable latency compensation for fragments of the given duration (seconds).
    #[must_use]
    pub fn with_fragment_duration(mut self, secs: f64) -> Self {
        self.fragment_duration_secs = (secs.is_finite() && secs > 0.0).then_some(secs);
        self
    }

    pub fn len(&self) -> usize {
        self.bitrates_bps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitrates_bps.is_empty()
    }

    pub fn bitrate(&self, quality: usize) -> Option<u64> {
        self.bitrates_bps.get(quality).copied()
    }

    /// Throughput left for payload once latency is paid on every fragment.
    fn effective_kbps(&self, bitrate_kbps: f64, latency_ms: f64) -> f64 {
        let Some(fragment) = self.fragment_duration_secs else {
            return bitrate_kbps;
        };
        let latency = latency_ms / 1000.0;
        if latency > 0.0 && fragment > latency {
            bitrate_kbps * (fragment - latency) / fragment
        } else {
            bitrate_kbps
        }
    }
}

impl From<Vec<u64>> for BitrateLadder {
    fn from(bitrates_bps: Vec<u64>) -> Self {
        Self::new(bitrates_bps)
    }
}

impl QualityLadder for BitrateLadder {
    fn bitrate_list(&self, _media: &MediaInfo) -> Vec<u64> {
        self.bitrates_bps.clone()
    }

    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    fn quality_for_bitrate(
        &self,
        _media: &MediaInfo,
        bitrate_kbps: f64,
        latency_ms: f64,
    ) -> usize {
        let available_bps = self.effective_kbps(bitrate_kbps, latency_ms) * 1000.0;
        if available_bps.is_nan() {
            return 0;
        }
        self.bitrates_bps
            .iter()
            .rposition(|bw| (*bw as f64) <= available_bps)
            .unwrap_or(0)
    }
}
