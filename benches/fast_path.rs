use std::hint::black_box;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use single_run::{SingleRun, TriggerValue};

const READERS: usize = 4;

/// The same contract without the atomic flag: every call takes the lock.
struct MutexOnly<T> {
   outcome: Mutex<Option<T>>,
}

impl<T: Clone> MutexOnly<T> {
   fn new() -> Self {
      Self {
         outcome: Mutex::new(None),
      }
   }

   fn run(&self, f: impl FnOnce() -> T) -> T {
      let mut outcome = self.outcome.lock().unwrap();
      outcome.get_or_insert_with(f).clone()
   }
}

fn make_config() -> Criterion {
   Criterion::default()
      .warm_up_time(Duration::from_secs(2))
      .measurement_time(Duration::from_secs(5))
}

fn completed_single_thread(c: &mut Criterion) {
   let mut group = c.benchmark_group("FastPath/single_thread");

   let guard: SingleRun<u64> = SingleRun::new();
   guard.run(|| 42);
   group.bench_function(BenchmarkId::new("single_run", "done"), |bencher| {
      bencher.iter(|| *black_box(&guard).run(|| unreachable!()))
   });

   let trigger: TriggerValue<u64> = TriggerValue::new();
   trigger.run(|| 42);
   group.bench_function(BenchmarkId::new("trigger_value", "done"), |bencher| {
      bencher.iter(|| *black_box(&trigger).run(|| unreachable!()))
   });

   let mutex = MutexOnly::new();
   mutex.run(|| 42u64);
   group.bench_function(BenchmarkId::new("mutex_only", "done"), |bencher| {
      bencher.iter(|| black_box(&mutex).run(|| unreachable!()))
   });

   group.finish();
}

/// Several threads hammering a completed guard: the fast path never
/// touches shared cache lines for writing, the mutex does every time.
fn completed_contended(c: &mut Criterion) {
   let mut group = c.benchmark_group(format!("FastPath/{READERS}_readers"));

   let guard = Arc::new(SingleRun::new());
   guard.run(|| 42u64);
   group.bench_function(BenchmarkId::new("single_run", READERS), |bencher| {
      bencher.iter_custom(|iters| {
         contended(iters, {
            let guard = Arc::clone(&guard);
            move || *guard.run(|| unreachable!())
         })
      })
   });

   let mutex = Arc::new(MutexOnly::new());
   mutex.run(|| 42u64);
   group.bench_function(BenchmarkId::new("mutex_only", READERS), |bencher| {
      bencher.iter_custom(|iters| {
         contended(iters, {
            let mutex = Arc::clone(&mutex);
            move || mutex.run(|| unreachable!())
         })
      })
   });

   group.finish();
}

fn contended<F>(iters: u64, read: F) -> Duration
where
   F: Fn() -> u64 + Clone + Send + 'static,
{
   let start = Arc::new(Barrier::new(READERS + 1));
   let threads: Vec<_> = (0..READERS)
      .map(|_| {
         let read = read.clone();
         let start = Arc::clone(&start);
         thread::spawn(move || {
            start.wait();
            for _ in 0..iters {
               black_box(read());
            }
         })
      })
      .collect();

   start.wait();
   let began = std::time::Instant::now();
   for handle in threads {
      handle.join().unwrap();
   }
   began.elapsed()
}

criterion_main!(benches);
criterion_group! {
   name = benches;
   config = make_config();
   targets = completed_single_thread, completed_contended
}
