use crate::types::{DecisionState, ThroughputSample};

/// Mutable QDASH record for one track.
///
/// Throughput and bitrate fields are kbit/s, `tbuffer` is seconds, `sfrag`
/// is kbit. `nfrag` counts remaining evaluations before the transition
/// commits to `new_bitrate`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineState {
    pub state: DecisionState,
    pub old_throughput: f64,
    pub current_throughput: f64,
    pub throughput_delta: f64,
    pub nfrag: f64,
    pub tbuffer: f64,
    pub sfrag: f64,
    pub new_bitrate: f64,
    pub old_bitrate: f64,
    /// Whether a throughput sample was taken since the last reset.
    pub seeded: bool,
}

impl EngineState {
    /// Shift in a new throughput sample and recompute the delta.
    ///
    /// The first sample after a reset fills both slots, so the delta is zero.
    pub(crate) fn push_throughput(&mut self, sample: ThroughputSample) {
        if self.seeded {
            self.old_throughput = self.current_throughput;
        } else {
            self.old_throughput = sample.throughput_kbps;
            self.seeded = true;
        }
        self.current_throughput = sample.throughput_kbps;
        self.throughput_delta = self.current_throughput - self.old_throughput;
    }

    /// Enter TRANSITION towards `current_throughput`.
    pub(crate) fn begin_transition(
        &mut self,
        intermediate_kbps: f64,
        fragment_duration: f64,
        buffer_level: f64,
    ) {
        self.old_bitrate = self.old_throughput;
        self.new_bitrate = self.current_throughput;
        self.sfrag = intermediate_kbps * fragment_duration;
        self.tbuffer = buffer_level;
        let runway = self.tbuffer * self.new_bitrate / self.sfrag;
        self.nfrag = if runway.is_finite() { runway } else { 0.0 };
        self.state = DecisionState::Transition;
    }

    /// Spend one tick of runway. Returns `false` once the runway is exhausted.
    pub(crate) fn step_transition(&mut self) -> bool {
        if self.nfrag <= 0.0 {
            return false;
        }
        self.nfrag -= 1.0;
        true
    }

    pub(crate) fn finish_transition(&mut self) {
        self.state = DecisionState::Stable;
    }
}

/// Latch set by the first LOADED buffer state seen for a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateState {
    first_buffer_loaded: bool,
}

impl GateState {
    /// Latch on `loaded`, then report whether decisions may be made.
    pub(crate) fn observe(&mut self, loaded: bool) -> bool {
        self.first_buffer_loaded |= loaded;
        self.first_buffer_loaded
    }

    pub fn is_open(&self) -> bool {
        self.first_buffer_loaded
    }
}
