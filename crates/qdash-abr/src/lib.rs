//! QDASH adaptive bitrate decisions.
//!
//! This crate provides a per-track decision engine that smooths quality
//! switches in adaptive streaming (HLS, DASH, etc.). When throughput changes
//! it does not jump to the new optimal quality; it first requests the
//! midpoint quality and holds it for as many fragments as the buffer can
//! absorb, then commits.
//!
//! ## Features
//!
//! - **Two-state machine**: `Stable` / `Transition`, see [`DecisionState`]
//! - **Buffer-gated**: no decisions until the buffer has loaded once
//! - **Empty-buffer override**: drops straight to quality 0 when the buffer runs dry
//! - **Capability traits**: throughput, buffer and ladder are injected, see [`traits`]
//! - **Seek-aware**: [`QdashEngine::on_playback_event`] resets history on seek
//!
//! ## Example
//!
//! ```rust
//! use qdash_abr::{
//!     BitrateLadder, BufferLevelState, BufferState, MediaInfo, MediaKind, QdashEngine,
//!     QdashOptions, ThroughputTracker, TrackContext, TrackId,
//! };
//!
//! struct Network {
//!     kbps: f64,
//! }
//!
//! impl ThroughputTracker for Network {
//!     fn average_throughput(&self, _track: TrackId) -> f64 {
//!         self.kbps
//!     }
//!
//!     fn average_latency(&self, _track: TrackId) -> f64 {
//!         40.0
//!     }
//! }
//!
//! struct Buffer;
//!
//! impl BufferState for Buffer {
//!     fn current_buffer_level(&self, _track: TrackId) -> f64 {
//!         10.0
//!     }
//!
//!     fn latest_buffer_state(&self, _track: TrackId) -> Option<BufferLevelState> {
//!         Some(BufferLevelState::Loaded)
//!     }
//! }
//!
//! let track = TrackId(1);
//! let mut engine = QdashEngine::new(
//!     track,
//!     QdashOptions::default(),
//!     Network { kbps: 1000.0 },
//!     Buffer,
//!     BitrateLadder::new(vec![500_000, 1_000_000, 2_000_000]),
//! )
//! .expect("valid options");
//!
//! let ctx = TrackContext::new(MediaInfo::new(track, MediaKind::Video), Some(2.0));
//! assert!(engine.evaluate(&ctx).is_no_change());
//!
//! engine.throughput_mut().kbps = 500.0;
//! let request = engine.evaluate(&ctx);
//! assert_eq!(request.quality, Some(0));
//! ```

#![forbid(unsafe_code)]

mod engine;
mod error;
mod ladder;
mod options;
mod state;
pub mod traits;
mod types;

pub use engine::{QdashEngine, QdashEngineBuilder};
pub use error::{QdashError, QdashResult};
pub use ladder::BitrateLadder;
pub use options::QdashOptions;
pub use state::{EngineState, GateState};
pub use traits::{BufferState, QualityLadder, ThroughputTracker};
pub use types::{
    BufferLevelState, DecisionState, MediaInfo, MediaKind, PlaybackEvent, RepresentationInfo,
    SwitchReason, SwitchRequest, ThroughputSample, TrackContext, TrackId,
};
