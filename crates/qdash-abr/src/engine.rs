use tracing::{debug, warn};

use crate::{
    error::{QdashError, QdashResult},
    options::QdashOptions,
    state::{EngineState, GateState},
    traits::{BufferState, QualityLadder, ThroughputTracker},
    types::{
        BufferLevelState, DecisionState, MediaInfo, PlaybackEvent, SwitchReason, SwitchRequest,
        ThroughputSample, TrackContext, TrackId,
    },
};

/// QDASH decision engine for a single track.
///
/// Instead of jumping to the quality the measured throughput allows, a
/// throughput change first moves to the midpoint quality between the old and
/// new throughput, holds it while the buffer can absorb the difference, and
/// only then commits to the new quality.
///
/// Calls to [`evaluate`](Self::evaluate) must arrive in playback order. The
/// engine does no I/O and never blocks.
pub struct QdashEngine<T, B, L> {
    track: TrackId,
    opts: QdashOptions,
    throughput: T,
    buffer: B,
    ladder: L,
    state: EngineState,
    gate: GateState,
}

impl<T, B, L> QdashEngine<T, B, L>
where
    T: ThroughputTracker,
    B: BufferState,
    L: QualityLadder,
{
    /// Create an engine governing `track`.
    ///
    /// # Errors
    ///
    /// Returns [`QdashError::InvalidOption`] if `opts` fails validation.
    pub fn new(
        track: TrackId,
        opts: QdashOptions,
        throughput: T,
        buffer: B,
        ladder: L,
    ) -> QdashResult<Self> {
        if let Err(e) = opts.validate() {
            warn!(%track, error = %e, "QDASH: rejecting configuration");
            return Err(e);
        }
        let mut engine = Self {
            track,
            opts,
            throughput,
            buffer,
            ladder,
            state: EngineState::default(),
            gate: GateState::default(),
        };
        engine.reset();
        Ok(engine)
    }

    pub fn builder(track: TrackId) -> QdashEngineBuilder<T, B, L> {
        QdashEngineBuilder::new(track)
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn options(&self) -> &QdashOptions {
        &self.opts
    }

    pub fn state(&self) -> DecisionState {
        self.state.state
    }

    pub fn engine_state(&self) -> &EngineState {
        &self.state
    }

    pub fn first_buffer_loaded(&self) -> bool {
        self.gate.is_open()
    }

    pub fn throughput(&self) -> &T {
        &self.throughput
    }

    pub fn throughput_mut(&mut self) -> &mut T {
        &mut self.throughput
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn ladder(&self) -> &L {
        &self.ladder
    }

    /// Forget buffer and throughput history (construction, seek).
    pub fn reset(&mut self) {
        self.state = EngineState::default();
        self.gate = GateState::default();
        debug!(track = %self.track, "QDASH reset");
    }

    /// Route a playback notification to the engine.
    pub fn on_playback_event(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Seeking { position_secs } if self.opts.reset_on_seek => {
                debug!(track = %self.track, position_secs, "QDASH: seeking");
                self.reset();
            }
            _ => {}
        }
    }

    /// Decide which quality to request next.
    pub fn evaluate(&mut self, ctx: &TrackContext) -> SwitchRequest {
        let track = self.track;

        let Some(representation) = ctx.representation.as_ref() else {
            debug!(%track, "QDASH evaluate: no representation info");
            return SwitchRequest::no_change(SwitchReason::MissingContext);
        };
        if ctx.track != track {
            debug!(%track, ctx_track = %ctx.track, "QDASH evaluate: foreign track context");
            return SwitchRequest::no_change(SwitchReason::TrackMismatch);
        }

        let Some(buffer_state) = self.buffer.latest_buffer_state(track) else {
            debug!(%track, "QDASH evaluate: no buffer state");
            return SwitchRequest::no_change(SwitchReason::NoBufferState);
        };

        if !self.gate.observe(buffer_state == BufferLevelState::Loaded) {
            debug!(%track, ?buffer_state, "QDASH evaluate: waiting for first buffer load");
            return SwitchRequest::no_change(SwitchReason::AwaitingFirstBufferLoad);
        }

        let Some(fragment_duration) = ctx.fragment_duration() else {
            debug!(%track, "QDASH evaluate: fragment duration unknown");
            return SwitchRequest::no_change(SwitchReason::NoFragmentDuration);
        };

        if buffer_state == BufferLevelState::Empty {
            debug!(
                %track,
                state = ?self.state.state,
                "QDASH evaluate: buffer empty, switching to 0"
            );
            return SwitchRequest::switch_to(0, SwitchReason::BufferEmpty);
        }

        let media = &representation.media;
        let bitrates = self.ladder.bitrate_list(media);
        if bitrates.is_empty() {
            debug!(%track, "QDASH evaluate: empty bitrate list");
            return SwitchRequest::no_change(SwitchReason::EmptyLadder);
        }

        let sample = ThroughputSample {
            throughput_kbps: self.throughput.average_throughput(track),
            latency_ms: self.throughput.average_latency(track),
        };
        let buffer_level = self.buffer.current_buffer_level(track);
        self.state.push_throughput(sample);

        match self.state.state {
            DecisionState::Stable => {
                self.evaluate_stable(media, &bitrates, sample, fragment_duration, buffer_level)
            }
            DecisionState::Transition => self.evaluate_transition(media, &bitrates, sample),
        }
    }

    fn evaluate_stable(
        &mut self,
        media: &MediaInfo,
        bitrates: &[u64],
        sample: ThroughputSample,
        fragment_duration: f64,
        buffer_level: f64,
    ) -> SwitchRequest {
        let delta = self.state.throughput_delta;
        if delta.abs() <= self.opts.epsilon {
            debug!(
                track = %self.track,
                delta,
                epsilon = self.opts.epsilon,
                "QDASH evaluate: throughput stable"
            );
            return SwitchRequest::no_change(SwitchReason::ThroughputStable);
        }

        let max_quality = bitrates.len() - 1;
        let latency_ms = sample.latency_ms;
        let EngineState {
            old_throughput,
            current_throughput,
            ..
        } = self.state;
        let q_old = self.quality_for(media, old_throughput, latency_ms, max_quality);
        let q_new = self.quality_for(media, current_throughput, latency_ms, max_quality);
        // Midpoint between old and new quality, rounded down.
        let intermediate = (q_old + q_new) / 2;

        #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
        let intermediate_kbps = bitrates[intermediate] as f64 / 1000.0;
        self.state
            .begin_transition(intermediate_kbps, fragment_duration, buffer_level);

        debug!(
            track = %self.track,
            delta,
            q_old,
            q_new,
            intermediate,
            intermediate_kbps,
            tbuffer = self.state.tbuffer,
            sfrag = self.state.sfrag,
            nfrag = self.state.nfrag,
            "QDASH evaluate: entering transition"
        );
        SwitchRequest::switch_to(intermediate, SwitchReason::EnteringTransition)
    }

    fn evaluate_transition(
        &mut self,
        media: &MediaInfo,
        bitrates: &[u64],
        sample: ThroughputSample,
    ) -> SwitchRequest {
        if self.state.step_transition() {
            debug!(
                track = %self.track,
                nfrag = self.state.nfrag,
                "QDASH evaluate: holding during transition"
            );
            return SwitchRequest::no_change(SwitchReason::HoldingTransition);
        }

        let max_quality = bitrates.len() - 1;
        let quality =
            self.quality_for(media, self.state.new_bitrate, sample.latency_ms, max_quality);
        self.state.finish_transition();
        debug!(
            track = %self.track,
            quality,
            new_bitrate = self.state.new_bitrate,
            "QDASH evaluate: transition complete"
        );
        SwitchRequest::switch_to(quality, SwitchReason::TransitionComplete)
    }

    fn quality_for(
        &self,
        media: &MediaInfo,
        bitrate_kbps: f64,
        latency_ms: f64,
        max_quality: usize,
    ) -> usize {
        self.ladder
            .quality_for_bitrate(media, bitrate_kbps, latency_ms)
            .min(max_quality)
    }
}

impl<T, B, L> std::fmt::Debug for QdashEngine<T, B, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdashEngine")
            .field("track", &self.track)
            .field("opts", &self.opts)
            .field("state", &self.state)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

/// Builder for [`QdashEngine`].
///
/// All three collaborators are required; `build` reports the first missing one.
pub struct QdashEngineBuilder<T, B, L> {
    track: TrackId,
    opts: QdashOptions,
    throughput: Option<T>,
    buffer: Option<B>,
    ladder: Option<L>,
}

impl<T, B, L> QdashEngineBuilder<T, B, L>
where
    T: ThroughputTracker,
    B: BufferState,
    L: QualityLadder,
{
    pub fn new(track: TrackId) -> Self {
        Self {
            track,
            opts: QdashOptions::default(),
            throughput: None,
            buffer: None,
            ladder: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, opts: QdashOptions) -> Self {
        self.opts = opts;
        self
    }

    #[must_use]
    pub fn with_throughput(mut self, throughput: T) -> Self {
        self.throughput = Some(throughput);
        self
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: B) -> Self {
        self.buffer = Some(buffer);
        self
    }

    #[must_use]
    pub fn with_ladder(mut self, ladder: L) -> Self {
        self.ladder = Some(ladder);
        self
    }

    /// # Errors
    ///
    /// [`QdashError::MissingCollaborator`] if a collaborator was not supplied,
    /// [`QdashError::InvalidOption`] if the options fail validation.
    pub fn build(self) -> QdashResult<QdashEngine<T, B, L>> {
        let throughput = self
            .throughput
            .ok_or(QdashError::MissingCollaborator("throughput tracker"))?;
        let buffer = self
            .buffer
            .ok_or(QdashError::MissingCollaborator("buffer state"))?;
        let ladder = self
            .ladder
            .ok_or(QdashError::MissingCollaborator("quality ladder"))?;
        QdashEngine::new(self.track, self.opts, throughput, buffer, ladder)
    }
}
