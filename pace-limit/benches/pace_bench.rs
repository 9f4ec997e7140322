use std::sync::Arc;
use std::sync::Barrier;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use pace_limit::Cooldown;
use pace_limit::Debouncer;
use pace_limit::ManualTimer;
use pace_limit::Throttler;

fn bench_throttler(c: &mut Criterion) {
    let mut group = c.benchmark_group("Throttler");

    // Long cooldown: every call after the first takes the drop path.
    let hits = Arc::new(AtomicU64::new(0));
    let h = hits.clone();
    let throttler = Throttler::new(
        move |n: u64| {
            h.fetch_add(n, Ordering::Relaxed);
        },
        Duration::from_secs(3600),
    )
    .unwrap();

    group.bench_function("exec-dropped", |b| {
        b.iter(|| {
            let _ = black_box(&throttler).exec(black_box(1));
        })
    });

    // Reset before each call: every call takes the pass path.
    group.bench_function("exec-passed", |b| {
        b.iter(|| {
            throttler.reset();
            let _ = black_box(&throttler).exec(black_box(1));
        })
    });

    group.finish();
}

/// Runs `op` on `threads` threads released together, `iters` times in total.
fn contended<F>(threads: usize, iters: u64, op: F) -> Duration
where
    F: Fn() + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let gate = Arc::new(Barrier::new(threads + 1));

    let workers: Vec<_> = (0..threads)
        .map(|_| {
            let (op, gate) = (Arc::clone(&op), Arc::clone(&gate));
            let share = iters / threads as u64;
            thread::spawn(move || {
                gate.wait();
                (0..share).for_each(|_| op());
            })
        })
        .collect();

    gate.wait();
    let start = Instant::now();
    workers.into_iter().for_each(|w| {
        let _ = w.join();
    });
    start.elapsed()
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("Contended");

    let cooldown = Arc::new(Cooldown::new(Duration::from_micros(1)).unwrap());

    // Every exec re-arms the same timer slot under the state lock.
    let timer = ManualTimer::new();
    let debouncer = Arc::new(
        Debouncer::with_timer(
            |n: u64| {
                black_box(n);
            },
            Duration::from_millis(10),
            timer,
        )
        .unwrap(),
    );

    for threads in [2, 4, 8] {
        let cd = Arc::clone(&cooldown);
        group.bench_with_input(
            BenchmarkId::new("cooldown", format!("{threads}-threads")),
            &threads,
            move |b, &n| {
                b.iter_custom(|iters| {
                    let cd = Arc::clone(&cd);
                    contended(n, iters, move || {
                        let _ = black_box(cd.try_acquire());
                    })
                })
            },
        );

        let db = Arc::clone(&debouncer);
        group.bench_with_input(
            BenchmarkId::new("debouncer", format!("{threads}-threads")),
            &threads,
            move |b, &n| {
                b.iter_custom(|iters| {
                    let db = Arc::clone(&db);
                    contended(n, iters, move || db.exec(black_box(1)))
                })
            },
        );
    }
    group.finish();
}

fn bench_debouncer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Debouncer");

    let timer = ManualTimer::new();
    let debouncer = Debouncer::with_timer(
        |n: u64| {
            black_box(n);
        },
        Duration::from_millis(10),
        timer.clone(),
    )
    .unwrap();

    // Re-arming cancels and replaces the pending timer every time.
    group.bench_function("exec-rearm", |b| {
        b.iter(|| debouncer.exec(black_box(1)))
    });

    group.bench_function("exec-flush", |b| {
        b.iter(|| {
            debouncer.exec(black_box(1));
            debouncer.flush();
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_throttler,
    bench_contention,
    bench_debouncer
);
criterion_main!(benches);
