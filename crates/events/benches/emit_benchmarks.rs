use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use toolbox_events::{Emitter, EmitterConfig, Listener, Payload};

fn counting_listeners(n: usize, hits: &Arc<AtomicU64>) -> Vec<Arc<Listener>> {
    (0..n)
        .map(|_| {
            let listener = Arc::new(Listener::new());
            let hits = Arc::clone(hits);
            listener.set_handler("Tick", move |data| {
                let n = data.get_as::<i64>("n")?;
                hits.fetch_add(*n as u64, Ordering::Relaxed);
                Ok(())
            });
            listener
        })
        .collect()
}

fn bench_emit_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fan_out");

    for listeners in [1usize, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*listeners as u64));

        for (label, config) in [
            ("fail_fast", EmitterConfig::default()),
            ("isolated", EmitterConfig::isolated()),
        ] {
            let hits = Arc::new(AtomicU64::new(0));
            let owned = counting_listeners(*listeners, &hits);
            let emitter = Emitter::with_config(config);
            for listener in &owned {
                emitter.add_listener(listener);
            }
            let payload = Payload::new().with("n", 1_i64);

            group.bench_with_input(BenchmarkId::new(label, listeners), listeners, |b, _| {
                b.iter(|| emitter.emit(black_box("Tick"), black_box(&payload)).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_add_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_registration");

    for existing in [10usize, 100, 1000].iter() {
        let hits = Arc::new(AtomicU64::new(0));
        let owned = counting_listeners(*existing, &hits);
        let emitter = Emitter::new();
        for listener in &owned {
            emitter.add_listener(listener);
        }
        let extra = Arc::new(Listener::new());

        group.bench_with_input(
            BenchmarkId::new("add_then_remove", existing),
            existing,
            |b, _| {
                b.iter(|| {
                    emitter.add_listener(black_box(&extra));
                    emitter.remove_listener(black_box(&extra));
                });
            },
        );
    }

    group.finish();
}

fn bench_emit_after_drops(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_after_drops");
    group.sample_size(50);

    // Half the listeners expire before each measured emit.
    group.bench_function("prune_half_of_1000", |b| {
        let hits = Arc::new(AtomicU64::new(0));
        let payload = Payload::new().with("n", 1_i64);
        b.iter_with_setup(
            || {
                let mut owned = counting_listeners(1000, &hits);
                let emitter = Emitter::new();
                for listener in &owned {
                    emitter.add_listener(listener);
                }
                owned.truncate(500);
                (emitter, owned)
            },
            |(emitter, _owned)| emitter.emit("Tick", &payload).unwrap(),
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_emit_fan_out,
    bench_add_remove,
    bench_emit_after_drops
);
criterion_main!(benches);
