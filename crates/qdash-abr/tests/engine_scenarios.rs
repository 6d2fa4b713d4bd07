use std::{cell::Cell, collections::HashMap, sync::Arc};

use qdash_abr::{
    BitrateLadder, BufferLevelState, BufferState, DecisionState, MediaInfo, MediaKind,
    PlaybackEvent, QdashEngine, QdashOptions, SwitchReason, SwitchRequest, ThroughputTracker,
    TrackContext, TrackId,
};
use rstest::{fixture, rstest};
use tracing_subscriber::EnvFilter;

const TRACK: TrackId = TrackId(1);

/// Throughput the test drives tick by tick.
#[derive(Default)]
struct Network {
    kbps: Cell<f64>,
    latency_ms: Cell<f64>,
}

impl ThroughputTracker for Network {
    fn average_throughput(&self, _track: TrackId) -> f64 {
        self.kbps.get()
    }

    fn average_latency(&self, _track: TrackId) -> f64 {
        self.latency_ms.get()
    }
}

struct Buffer {
    level_secs: Cell<f64>,
    state: Cell<Option<BufferLevelState>>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            level_secs: Cell::new(10.0),
            state: Cell::new(Some(BufferLevelState::Loaded)),
        }
    }
}

impl BufferState for Buffer {
    fn current_buffer_level(&self, _track: TrackId) -> f64 {
        self.level_secs.get()
    }

    fn latest_buffer_state(&self, _track: TrackId) -> Option<BufferLevelState> {
        self.state.get()
    }
}

struct Harness {
    network: Network,
    buffer: Buffer,
    ladder: BitrateLadder,
}

/// `RUST_LOG=qdash_abr=debug` shows every decision.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[fixture]
fn harness() -> Harness {
    init_tracing();
    Harness {
        network: Network::default(),
        buffer: Buffer::default(),
        ladder: BitrateLadder::new(vec![500_000, 1_000_000, 2_000_000]),
    }
}

fn context(track: TrackId) -> TrackContext {
    TrackContext::new(MediaInfo::new(track, MediaKind::Video), Some(2.0))
}

fn engine(h: &Harness) -> QdashEngine<&Network, &Buffer, &BitrateLadder> {
    QdashEngine::new(
        TRACK,
        QdashOptions::default(),
        &h.network,
        &h.buffer,
        &h.ladder,
    )
    .expect("default options are valid")
}

fn run(
    engine: &mut QdashEngine<&Network, &Buffer, &BitrateLadder>,
    network: &Network,
    samples: &[f64],
) -> Vec<SwitchRequest> {
    let ctx = context(TRACK);
    samples
        .iter()
        .map(|kbps| {
            network.kbps.set(*kbps);
            engine.evaluate(&ctx)
        })
        .collect()
}

#[rstest]
fn drop_from_1000_to_500_kbps(harness: Harness) {
    let mut engine = engine(&harness);

    let requests = run(&mut engine, &harness.network, &[1000.0, 1000.0, 500.0]);
    assert_eq!(
        requests,
        vec![
            SwitchRequest::no_change(SwitchReason::ThroughputStable),
            SwitchRequest::no_change(SwitchReason::ThroughputStable),
            // midpoint of q(1000) = 1 and q(500) = 0
            SwitchRequest::switch_to(0, SwitchReason::EnteringTransition),
        ]
    );
    assert_eq!(engine.state(), DecisionState::Transition);
    // sfrag = 500 kbit/s * 2 s, nfrag = 10 s * 500 / 1000
    assert_eq!(engine.engine_state().sfrag, 1000.0);
    assert_eq!(engine.engine_state().nfrag, 5.0);

    let requests = run(&mut engine, &harness.network, &[500.0; 6]);
    let (holds, last) = requests.split_at(5);
    assert!(
        holds
            .iter()
            .all(|r| *r == SwitchRequest::no_change(SwitchReason::HoldingTransition))
    );
    assert_eq!(
        last,
        [SwitchRequest::switch_to(0, SwitchReason::TransitionComplete)]
    );
    assert_eq!(engine.state(), DecisionState::Stable);
}

#[rstest]
fn rise_walks_through_intermediate_quality(harness: Harness) {
    harness.buffer.level_secs.set(4.0);
    let mut engine = engine(&harness);

    let requests = run(&mut engine, &harness.network, &[500.0, 2000.0]);
    assert_eq!(
        requests[1],
        SwitchRequest::switch_to(1, SwitchReason::EnteringTransition)
    );
    // sfrag = 1000 * 2, nfrag = 4 * 2000 / 2000
    assert_eq!(engine.engine_state().nfrag, 4.0);

    let requests = run(&mut engine, &harness.network, &[2000.0; 5]);
    let qualities: Vec<_> = requests.iter().map(|r| r.quality).collect();
    assert_eq!(qualities, vec![None, None, None, None, Some(2)]);
}

#[rstest]
#[case(vec![1000.0, 1000.0, 1000.0, 1000.0], 0.0)]
#[case(vec![1000.0, 1020.0, 990.0, 1005.0], 50.0)]
#[case(vec![700.0, 700.0], 0.0)]
fn jitter_within_epsilon_stays_stable(
    harness: Harness,
    #[case] samples: Vec<f64>,
    #[case] epsilon: f64,
) {
    let mut engine = QdashEngine::new(
        TRACK,
        QdashOptions::new().with_epsilon(epsilon),
        &harness.network,
        &harness.buffer,
        &harness.ladder,
    )
    .unwrap();

    for request in run(&mut engine, &harness.network, &samples) {
        assert_eq!(
            request,
            SwitchRequest::no_change(SwitchReason::ThroughputStable)
        );
    }
    assert_eq!(engine.state(), DecisionState::Stable);
}

#[rstest]
fn nothing_happens_before_first_load(harness: Harness) {
    harness.buffer.state.set(None);
    let mut engine = engine(&harness);
    assert!(
        run(&mut engine, &harness.network, &[100.0, 5000.0])
            .iter()
            .all(|r| r.reason == SwitchReason::NoBufferState)
    );

    harness.buffer.state.set(Some(BufferLevelState::Empty));
    assert!(
        run(&mut engine, &harness.network, &[100.0, 5000.0])
            .iter()
            .all(|r| r.reason == SwitchReason::AwaitingFirstBufferLoad)
    );
    assert!(!engine.first_buffer_loaded());

    harness.buffer.state.set(Some(BufferLevelState::Loaded));
    run(&mut engine, &harness.network, &[1000.0]);
    assert!(engine.first_buffer_loaded());
}

#[rstest]
fn empty_buffer_always_means_quality_zero(harness: Harness) {
    let mut engine = engine(&harness);
    run(&mut engine, &harness.network, &[2000.0, 500.0]);
    assert_eq!(engine.state(), DecisionState::Transition);

    harness.buffer.state.set(Some(BufferLevelState::Empty));
    for request in run(&mut engine, &harness.network, &[2000.0, 100.0, 900.0]) {
        assert_eq!(request, SwitchRequest::switch_to(0, SwitchReason::BufferEmpty));
    }
    assert_eq!(engine.state(), DecisionState::Transition);
}

#[rstest]
fn seek_replays_first_call_behavior(harness: Harness) {
    let mut engine = engine(&harness);
    let first = run(&mut engine, &harness.network, &[1000.0, 500.0]);

    engine.on_playback_event(&PlaybackEvent::Seeking {
        position_secs: 120.0,
    });
    assert!(!engine.first_buffer_loaded());
    assert_eq!(engine.state(), DecisionState::Stable);

    let replay = run(&mut engine, &harness.network, &[1000.0, 500.0]);
    assert_eq!(first, replay);
}

#[rstest]
fn latency_shifts_ladder_choice(harness: Harness) {
    let ladder =
        BitrateLadder::new(vec![500_000, 1_000_000, 2_000_000]).with_fragment_duration(2.0);
    harness.network.latency_ms.set(500.0);
    let mut engine = QdashEngine::new(
        TRACK,
        QdashOptions::default(),
        &harness.network,
        &harness.buffer,
        &ladder,
    )
    .unwrap();

    // With 500 ms latency on 2 s fragments only 3/4 of the throughput counts:
    // q(2000) = q(1500 effective) = 1, q(1000) = q(750 effective) = 0.
    // Without latency compensation the midpoint would be 1.
    let requests = run(&mut engine, &harness.network, &[2000.0, 1000.0]);
    assert_eq!(
        requests[1],
        SwitchRequest::switch_to(0, SwitchReason::EnteringTransition)
    );
}

/// Per-track throughput shared by several engines.
struct SharedNetwork {
    kbps: HashMap<TrackId, f64>,
}

impl ThroughputTracker for SharedNetwork {
    fn average_throughput(&self, track: TrackId) -> f64 {
        self.kbps.get(&track).copied().unwrap_or_default()
    }

    fn average_latency(&self, _track: TrackId) -> f64 {
        0.0
    }
}

#[rstest]
fn engines_share_collaborators_but_not_state(harness: Harness) {
    let network = Arc::new(SharedNetwork {
        kbps: HashMap::from([(TrackId(1), 1000.0), (TrackId(2), 64.0)]),
    });
    let ladder = Arc::new(harness.ladder);

    let mut video = QdashEngine::new(
        TrackId(1),
        QdashOptions::default(),
        Arc::clone(&network),
        &harness.buffer,
        Arc::clone(&ladder),
    )
    .unwrap();
    let mut audio = QdashEngine::new(
        TrackId(2),
        QdashOptions::default(),
        Arc::clone(&network),
        &harness.buffer,
        Arc::clone(&ladder),
    )
    .unwrap();

    video.evaluate(&context(TrackId(1)));
    audio.evaluate(&context(TrackId(2)));
    assert_eq!(video.engine_state().current_throughput, 1000.0);
    assert_eq!(audio.engine_state().current_throughput, 64.0);

    video.reset();
    assert!(!video.first_buffer_loaded());
    assert!(audio.first_buffer_loaded());

    // Contexts are not interchangeable between engines.
    assert_eq!(
        video.evaluate(&context(TrackId(2))).reason,
        SwitchReason::TrackMismatch
    );
}
