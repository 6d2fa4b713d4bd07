#![forbid(unsafe_code)]

use std::cell::Cell;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qdash_abr::{
    BitrateLadder, BufferLevelState, BufferState, MediaInfo, MediaKind, QdashEngine, QdashOptions,
    ThroughputTracker, TrackContext, TrackId,
};

const TRACK: TrackId = TrackId(1);

struct Network {
    kbps: Cell<f64>,
}

impl ThroughputTracker for Network {
    fn average_throughput(&self, _track: TrackId) -> f64 {
        self.kbps.get()
    }

    fn average_latency(&self, _track: TrackId) -> f64 {
        40.0
    }
}

struct Buffer;

impl BufferState for Buffer {
    fn current_buffer_level(&self, _track: TrackId) -> f64 {
        12.0
    }

    fn latest_buffer_state(&self, _track: TrackId) -> Option<BufferLevelState> {
        Some(BufferLevelState::Loaded)
    }
}

fn ladder() -> BitrateLadder {
    BitrateLadder::new(vec![
        256_000, 512_000, 1_024_000, 2_048_000, 4_096_000, 8_192_000,
    ])
    .with_fragment_duration(4.0)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("qdash_evaluate");

    for (label, pattern) in [
        ("steady", vec![2_000.0; 8]),
        ("oscillating", vec![600.0, 6_000.0, 600.0, 6_000.0]),
        ("ramp", vec![300.0, 900.0, 2_700.0, 8_100.0]),
    ] {
        group.bench_with_input(BenchmarkId::new("64_ticks", label), &pattern, |b, pattern| {
            let ladder = ladder();
            let ctx = TrackContext::new(MediaInfo::new(TRACK, MediaKind::Video), Some(4.0));
            b.iter(|| {
                let network = Network {
                    kbps: Cell::new(pattern[0]),
                };
                let mut engine =
                    QdashEngine::new(TRACK, QdashOptions::default(), &network, Buffer, &ladder)
                        .expect("default options are valid");
                for kbps in pattern.iter().cycle().take(64) {
                    network.kbps.set(*kbps);
                    black_box(engine.evaluate(&ctx));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
