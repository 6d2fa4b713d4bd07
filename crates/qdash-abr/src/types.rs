use std::fmt;

/// Identity of the media track an engine governs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Kind of media carried by a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    Text,
}

/// Static description of a track, handed to the [`QualityLadder`](crate::QualityLadder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaInfo {
    pub track: TrackId,
    pub kind: MediaKind,
    /// Codec string (e.g., "mp4a.40.2"), if known.
    pub codecs: Option<String>,
}

impl MediaInfo {
    #[must_use]
    pub fn new(track: TrackId, kind: MediaKind) -> Self {
        Self {
            track,
            kind,
            codecs: None,
        }
    }
}

/// Representation currently selected for a track.
#[derive(Clone, Debug, PartialEq)]
pub struct RepresentationInfo {
    pub media: MediaInfo,
    /// Fragment duration in seconds. `None` until the manifest provides one.
    pub fragment_duration: Option<f64>,
}

/// Everything the host hands to a single evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackContext {
    pub track: TrackId,
    pub representation: Option<RepresentationInfo>,
}

impl TrackContext {
    /// Context for a track whose representation is known.
    #[must_use]
    pub fn new(media: MediaInfo, fragment_duration: Option<f64>) -> Self {
        Self {
            track: media.track,
            representation: Some(RepresentationInfo {
                media,
                fragment_duration,
            }),
        }
    }

    /// Context without representation info (e.g., before the manifest is parsed).
    #[must_use]
    pub fn without_representation(track: TrackId) -> Self {
        Self {
            track,
            representation: None,
        }
    }

    /// Fragment duration, only if positive and finite.
    pub(crate) fn fragment_duration(&self) -> Option<f64> {
        self.representation
            .as_ref()
            .and_then(|r| r.fragment_duration)
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Discrete buffer state, as recorded in the buffer-state history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferLevelState {
    /// Buffer ran dry; playback is stalled or about to be.
    Empty,
    /// Buffer holds enough media to play.
    Loaded,
}

/// State of the QDASH switching state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecisionState {
    /// Throughput and requested bitrate agree.
    #[default]
    Stable,
    /// Throughput moved; requests are being walked towards the new bitrate.
    Transition,
}

/// Throughput measurement read at one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThroughputSample {
    /// Average throughput, kbit/s.
    pub throughput_kbps: f64,
    /// Average latency, ms.
    pub latency_ms: f64,
}

/// Why an evaluation produced the request it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchReason {
    MissingContext,
    TrackMismatch,
    NoBufferState,
    AwaitingFirstBufferLoad,
    NoFragmentDuration,
    EmptyLadder,
    BufferEmpty,
    ThroughputStable,
    EnteringTransition,
    HoldingTransition,
    TransitionComplete,
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingContext => "no representation info for track",
            Self::TrackMismatch => "context belongs to another track",
            Self::NoBufferState => "no buffer state recorded",
            Self::AwaitingFirstBufferLoad => "waiting for first buffer load",
            Self::NoFragmentDuration => "fragment duration unknown",
            Self::EmptyLadder => "no bitrates available",
            Self::BufferEmpty => "buffer is empty",
            Self::ThroughputStable => "throughput stable",
            Self::EnteringTransition => "throughput changed, entering transition",
            Self::HoldingTransition => "holding quality during transition",
            Self::TransitionComplete => "transition complete",
        };
        f.write_str(msg)
    }
}

/// Decision returned by [`QdashEngine::evaluate`](crate::QdashEngine::evaluate).
///
/// `quality == None` means "no change this tick".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchRequest {
    pub quality: Option<usize>,
    pub reason: SwitchReason,
}

impl SwitchRequest {
    #[must_use]
    pub fn no_change(reason: SwitchReason) -> Self {
        Self {
            quality: None,
            reason,
        }
    }

    #[must_use]
    pub fn switch_to(quality: usize, reason: SwitchReason) -> Self {
        Self {
            quality: Some(quality),
            reason,
        }
    }

    pub fn is_no_change(&self) -> bool {
        self.quality.is_none()
    }
}

impl fmt::Display for SwitchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quality {
            Some(q) => write!(f, "QDASH: switch to {q}: {}", self.reason),
            None => write!(f, "QDASH: no change: {}", self.reason),
        }
    }
}

/// Playback notifications the host routes to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Player started seeking; prior buffer and throughput history is stale.
    Seeking { position_secs: f64 },
    /// Seek finished.
    Seeked { position_secs: f64 },
    Paused,
    Resumed,
}
