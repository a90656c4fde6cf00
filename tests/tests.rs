//! Integration tests for the dispatcher, the partition and the system runner.

#![cfg(not(any(loom, feature = "shuttle")))]

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use core::time::Duration;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::thread;

use proptest::prelude::*;
use tracing::{Level, info};
use tracing_subscriber::fmt::Subscriber;

use tickpool::{
    ChunkRange, Config, ConfigError, DispatchError, Dispatcher, ExecutionMode, InitError,
    MultiThreadSystem, Partition, SystemRunner, SystemState, ThreadCount,
};

// -----------------------------------------------------------------------------
// Infrastructure

fn trace<F: FnOnce()>(f: F) {
    let subscriber = Subscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .without_time()
        .finish();

    tracing::subscriber::with_default(subscriber, f);
}

/// A stand-in for an entity collection: one visit counter per item, plus a
/// record of every chunk handed out.
struct World {
    visits: Vec<AtomicU32>,
    chunks: Mutex<Vec<(ChunkRange, String)>>,
    len: AtomicUsize,
}

impl World {
    fn new(capacity: usize) -> Arc<World> {
        Arc::new(World {
            visits: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            chunks: Mutex::new(Vec::new()),
            len: AtomicUsize::new(capacity),
        })
    }

    fn set_len(&self, len: usize) {
        assert!(len <= self.visits.len());
        self.len.store(len, Ordering::Relaxed);
    }

    fn visit(&self, chunk: ChunkRange) {
        let name = thread::current().name().unwrap_or("<unnamed>").to_string();
        self.chunks.lock().unwrap().push((chunk, name));
        for index in chunk {
            self.visits[index].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns the chunks handed out since the last call, sorted by start.
    fn take_chunks(&self) -> Vec<(ChunkRange, String)> {
        let mut chunks = core::mem::take(&mut *self.chunks.lock().unwrap());
        chunks.sort_by_key(|(chunk, _)| chunk.from());
        chunks
    }

    fn take_ranges(&self) -> Vec<ChunkRange> {
        self.take_chunks().into_iter().map(|(chunk, _)| chunk).collect()
    }

    fn visit_counts(&self) -> Vec<u32> {
        self.visits.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }

    fn reset_visits(&self) {
        for visit in &self.visits {
            visit.store(0, Ordering::Relaxed);
        }
    }
}

impl tickpool::ItemSource for World {
    fn item_count(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

type WorldCallback = fn(&Arc<World>, ChunkRange);

fn world_dispatcher(
    thread_count: usize,
    min_job_size: usize,
    world: &Arc<World>,
) -> Dispatcher<Arc<World>, WorldCallback> {
    let config = Config::builder()
        .thread_count(thread_count)
        .min_job_size(min_job_size)
        .thread_name_prefix("test-worker")
        .join_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let callback: WorldCallback = |world, chunk| world.visit(chunk);
    Dispatcher::new(config, world.clone(), callback).unwrap()
}

/// Tiny xorshift* generator, so the stress test is reproducible.
struct XorShift64Star(u64);

impl XorShift64Star {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn next_usize(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

// -----------------------------------------------------------------------------
// Range handle

#[test]
fn chunk_range_is_restartable() {
    let chunk = ChunkRange::new(3, 7);
    assert_eq!(chunk.len(), 4);
    assert_eq!(chunk.iter().collect::<Vec<_>>(), [3, 4, 5, 6]);
    assert_eq!(chunk.iter().collect::<Vec<_>>(), [3, 4, 5, 6]);
    assert_eq!((&chunk).into_iter().rev().collect::<Vec<_>>(), [6, 5, 4, 3]);
    assert_eq!(core::ops::Range::from(chunk), 3..7);
    assert!(chunk.contains(3) && chunk.contains(6));
    assert!(!chunk.contains(7) && !chunk.contains(2));
}

#[test]
fn chunk_range_empty() {
    let chunk = ChunkRange::new(5, 5);
    assert!(chunk.is_empty());
    assert_eq!(chunk.iter().count(), 0);
    assert_eq!(chunk.iter().len(), 0);
}

#[test]
fn chunk_iter_partial_traversal_does_not_affect_the_next() {
    let chunk = ChunkRange::new(0, 10);
    let mut first = chunk.iter();
    assert_eq!(first.nth(4), Some(4));
    assert_eq!(first.len(), 5);
    assert_eq!(chunk.iter().next(), Some(0));
}

// -----------------------------------------------------------------------------
// Partition

fn assert_tiles(partition: &Partition) {
    let mut next = 0;
    for chunk in partition.all_chunks() {
        assert_eq!(chunk.from(), next, "gap or overlap in {partition:?}");
        next = chunk.to();
    }
    assert_eq!(next, partition.count());
}

#[test]
fn partition_all_threads() {
    let partition = Partition::new(100, 3, 10);
    assert_eq!(partition.workers_used(), 4);
    assert_eq!(partition.job_size(), 25);
    assert_eq!(
        partition.all_chunks().collect::<Vec<_>>(),
        [
            ChunkRange::new(0, 25),
            ChunkRange::new(25, 50),
            ChunkRange::new(50, 75),
            ChunkRange::new(75, 100),
        ]
    );
}

#[test]
fn partition_few_items_runs_locally() {
    // 15 / 4 = 3 is not above 10, so 15 / 10 = 1 chunk is called for. That one
    // chunk is the calling thread's, and it absorbs the remainder.
    let partition = Partition::new(15, 3, 10);
    assert_eq!(partition.workers_used(), 1);
    assert_eq!(partition.worker_chunks(), 0);
    assert_eq!(partition.local(), ChunkRange::new(0, 15));
}

#[test]
fn partition_below_min_job_size() {
    let partition = Partition::new(5, 3, 10);
    assert_eq!(partition.workers_used(), 0);
    assert_eq!(partition.worker_chunks(), 0);
    assert_eq!(partition.local(), ChunkRange::new(0, 5));
    assert_eq!(partition.all_chunks().count(), 1);
}

#[test]
fn partition_fewer_larger_chunks() {
    // 25 / 4 = 6 is not above 10: two chunks of ten are called for, the
    // second of which runs locally and picks up the last five items.
    let partition = Partition::new(25, 3, 10);
    assert_eq!(partition.workers_used(), 2);
    assert_eq!(
        partition.all_chunks().collect::<Vec<_>>(),
        [ChunkRange::new(0, 10), ChunkRange::new(10, 25)]
    );
}

#[test]
fn partition_tie_prefers_fewer_chunks() {
    // 40 / 4 = 10 equals the minimum, so the minimum-sized branch is taken.
    let partition = Partition::new(40, 3, 10);
    assert_eq!(partition.job_size(), 10);
    assert_eq!(partition.workers_used(), 4);
    assert_eq!(partition.worker_chunks(), 3);
    assert_eq!(partition.local(), ChunkRange::new(30, 40));

    // One more item per thread tips it over.
    let partition = Partition::new(44, 3, 10);
    assert_eq!(partition.job_size(), 11);
    assert_eq!(partition.local(), ChunkRange::new(33, 44));
}

#[test]
fn partition_small_minimum_is_clamped_to_threads() {
    // 7 / 4 = 1 is not above 1, and 7 / 1 = 7 chunks would be more than the
    // three workers plus the calling thread.
    let partition = Partition::new(7, 3, 1);
    assert_eq!(partition.workers_used(), 4);
    assert_eq!(
        partition.all_chunks().collect::<Vec<_>>(),
        [
            ChunkRange::new(0, 1),
            ChunkRange::new(1, 2),
            ChunkRange::new(2, 3),
            ChunkRange::new(3, 7),
        ]
    );
}

#[test]
fn partition_never_needs_more_slots_than_threads() {
    for thread_count in 0..8 {
        for min_job_size in 1..20 {
            for count in 0..500 {
                let partition = Partition::new(count, thread_count, min_job_size);
                assert!(partition.worker_chunks() <= thread_count);
            }
        }
    }
}

#[test]
fn partition_empty() {
    let partition = Partition::new(0, 3, 10);
    assert!(partition.is_empty());
    assert_eq!(partition.workers_used(), 0);
    assert_eq!(partition.chunks().count(), 0);
    assert_eq!(partition.all_chunks().count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn proptest_partition_tiles_the_range(
        count in 0usize..20_000,
        thread_count in 0usize..32,
        min_job_size in 1usize..256,
    ) {
        let partition = Partition::new(count, thread_count, min_job_size);
        assert_tiles(&partition);
        prop_assert!(partition.worker_chunks() <= thread_count);

        let even_share = count / (thread_count + 1);
        if count > 0 && even_share > min_job_size {
            prop_assert_eq!(partition.workers_used(), thread_count + 1);
            prop_assert!(partition.chunks().all(|chunk| chunk.len() == even_share));
        } else {
            prop_assert_eq!(partition.workers_used(), (count / min_job_size).min(thread_count + 1));
            prop_assert!(partition.chunks().all(|chunk| chunk.len() == min_job_size));
        }

        // The local chunk is never shorter than a worker chunk.
        if partition.workers_used() > 0 {
            prop_assert!(partition.local().len() >= partition.job_size());
        }
    }
}

// -----------------------------------------------------------------------------
// Configuration

#[test]
fn config_rejects_invalid_values() {
    assert_eq!(Config::new(0, 1).unwrap_err(), ConfigError::ZeroThreadCount);
    assert_eq!(Config::new(1, 0).unwrap_err(), ConfigError::ZeroMinJobSize);
    assert_eq!(
        Config::builder().thread_name_prefix("").build().unwrap_err(),
        ConfigError::EmptyThreadNamePrefix
    );
}

#[test]
fn config_available_threads() {
    let config = Config::builder()
        .thread_count(ThreadCount::Available)
        .build()
        .unwrap();
    assert!(config.thread_count() >= 1);
    assert_eq!(config.min_job_size(), 1);
}

// -----------------------------------------------------------------------------
// Dispatch

#[test]
fn dispatch_visits_every_index_once() {
    trace(|| {
        let world = World::new(100);
        let mut dispatcher = world_dispatcher(3, 10, &world);

        let partition = dispatcher.dispatch().unwrap();
        assert_eq!(partition, Partition::new(100, 3, 10));
        assert!(world.visit_counts().iter().all(|&v| v == 1));

        let chunks = world.take_chunks();
        assert_eq!(
            chunks.iter().map(|(chunk, _)| *chunk).collect::<Vec<_>>(),
            [
                ChunkRange::new(0, 25),
                ChunkRange::new(25, 50),
                ChunkRange::new(50, 75),
                ChunkRange::new(75, 100),
            ]
        );

        // The first three went to workers in slot order, the last ran here.
        assert_eq!(chunks[0].1, "test-worker-0");
        assert_eq!(chunks[1].1, "test-worker-1");
        assert_eq!(chunks[2].1, "test-worker-2");
        assert_eq!(
            chunks[3].1,
            thread::current().name().unwrap_or("<unnamed>")
        );
    });
}

#[test]
fn dispatch_small_count_stays_on_calling_thread() {
    let world = World::new(15);
    let mut dispatcher = world_dispatcher(3, 10, &world);

    dispatcher.dispatch().unwrap();
    let chunks = world.take_chunks();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].0, ChunkRange::new(0, 15));
    assert_eq!(chunks[0].1, thread::current().name().unwrap_or("<unnamed>"));

    world.set_len(5);
    world.reset_visits();
    dispatcher.dispatch().unwrap();
    assert_eq!(world.take_ranges(), [ChunkRange::new(0, 5)]);
    assert_eq!(&world.visit_counts()[..5], &[1; 5]);
    assert_eq!(&world.visit_counts()[5..], &[0; 10]);
}

#[test]
fn dispatch_zero_count_is_a_no_op() {
    let world = World::new(0);
    let mut dispatcher = world_dispatcher(2, 1, &world);

    let partition = dispatcher.dispatch().unwrap();
    assert!(partition.is_empty());
    assert!(world.take_chunks().is_empty());
}

#[test]
fn dispatch_is_a_barrier() {
    // Workers sleep a little so that, without the join, the calling thread
    // would observe a partial count.
    let processed = Arc::new(AtomicUsize::new(0));
    let config = Config::new(4, 1).unwrap();
    let counter = processed.clone();
    let mut dispatcher = Dispatcher::new(config, AtomicUsize::new(0), move |_: &AtomicUsize, chunk: ChunkRange| {
        thread::sleep(Duration::from_millis(2));
        for _ in chunk {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    })
    .unwrap();

    for count in [1, 7, 64, 1000, 4096] {
        processed.store(0, Ordering::Relaxed);
        dispatcher.source().store(count, Ordering::Release);
        dispatcher.dispatch().unwrap();
        assert_eq!(processed.load(Ordering::Relaxed), count);
    }
}

#[test]
fn dispatch_count_overrides_source() {
    let world = World::new(64);
    let mut dispatcher = world_dispatcher(1, 4, &world);

    let partition = dispatcher.dispatch_count(32).unwrap();
    assert_eq!(partition.count(), 32);
    assert_eq!(
        world.take_ranges(),
        [ChunkRange::new(0, 16), ChunkRange::new(16, 32)]
    );
}

#[test]
fn chunks_never_overlap() {
    // Each index is claimed with a swap; a second claim within the same
    // dispatch means two chunks owned the same index.
    let claimed: Arc<Vec<AtomicBool>> = Arc::new((0..5000).map(|_| AtomicBool::new(false)).collect());
    let config = Config::new(6, 8).unwrap();
    let mut dispatcher = Dispatcher::new(config, claimed.clone(), |claimed: &Arc<Vec<AtomicBool>>, chunk: ChunkRange| {
        for index in chunk {
            assert!(!claimed[index].swap(true, Ordering::Relaxed), "index {index} claimed twice");
        }
    })
    .unwrap();

    for count in [5000, 4999, 57, 8, 9, 1] {
        for flag in claimed.iter() {
            flag.store(false, Ordering::Relaxed);
        }
        dispatcher.dispatch_count(count).unwrap();
        assert!(claimed[..count].iter().all(|f| f.load(Ordering::Relaxed)));
        assert!(claimed[count..].iter().all(|f| !f.load(Ordering::Relaxed)));
    }
}

#[test]
fn dispatch_stress_random_counts() {
    let world = World::new(10_000);
    let mut dispatcher = world_dispatcher(4, 16, &world);
    let mut rng = XorShift64Star(0x9e37_79b9_7f4a_7c15);

    let mut expected = vec![0u32; 10_000];
    for tick in 0..3000 {
        let count = rng.next_usize(10_001);
        world.set_len(count);
        let partition = dispatcher.dispatch().unwrap();
        assert_eq!(partition.count(), count, "tick {tick}");
        for slot in &mut expected[..count] {
            *slot += 1;
        }
        // Keep the chunk log from growing without bound.
        world.take_chunks();
    }

    assert_eq!(world.visit_counts(), expected);
    info!("stress test complete");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn proptest_dispatch_matches_partition(
        count in 0usize..4000,
        thread_count in 1usize..6,
        min_job_size in 1usize..100,
    ) {
        let world = World::new(4000);
        let mut dispatcher = world_dispatcher(thread_count, min_job_size, &world);

        world.set_len(count);
        let partition = dispatcher.dispatch().unwrap();
        let expected = Partition::new(count, thread_count, min_job_size);
        prop_assert_eq!(partition, expected);
        prop_assert_eq!(world.take_ranges(), expected.all_chunks().collect::<Vec<_>>());

        let counts = world.visit_counts();
        prop_assert!(counts[..count].iter().all(|&v| v == 1));
        prop_assert!(counts[count..].iter().all(|&v| v == 0));
    }
}

// -----------------------------------------------------------------------------
// Failures

#[test]
fn worker_panic_is_reported_and_isolated() {
    trace(|| {
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = processed.clone();
        let config = Config::new(3, 1).unwrap();
        let mut dispatcher = Dispatcher::new(config, AtomicUsize::new(0), move |_: &AtomicUsize, chunk: ChunkRange| {
            if chunk.contains(13) {
                panic!("bad entity {}", 13);
            }
            counter.fetch_add(chunk.len(), Ordering::Relaxed);
        })
        .unwrap();

        // 100 items over 4 threads: index 13 lands in the first worker chunk.
        let Err(DispatchError::WorkerPanicked(failures)) = dispatcher.dispatch_count(100) else {
            panic!("expected a worker failure");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].slot, 0);
        assert_eq!(failures[0].chunk, ChunkRange::new(0, 25));
        assert_eq!(failures[0].message, "bad entity 13");
        assert_eq!(processed.load(Ordering::Relaxed), 75);

        // The pool is still usable, and the failure is not reported twice.
        processed.store(0, Ordering::Relaxed);
        let partition = dispatcher.dispatch_count(12).unwrap();
        assert_eq!(partition.count(), 12);
        assert_eq!(processed.load(Ordering::Relaxed), 12);
    });
}

#[test]
fn local_panic_propagates_after_workers_finish() {
    let processed = Arc::new(AtomicUsize::new(0));
    let counter = processed.clone();
    let config = Config::new(2, 1).unwrap();
    let mut dispatcher = Dispatcher::new(config, AtomicUsize::new(0), move |_: &AtomicUsize, chunk: ChunkRange| {
        // The local chunk is the last one.
        if chunk.to() == 90 {
            panic!("local chunk failed");
        }
        thread::sleep(Duration::from_millis(5));
        counter.fetch_add(chunk.len(), Ordering::Relaxed);
    })
    .unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch_count(90)));
    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"local chunk failed"));

    // Both worker chunks were complete before the panic reached us.
    assert_eq!(processed.load(Ordering::Relaxed), 60);

    processed.store(0, Ordering::Relaxed);
    dispatcher.dispatch_count(30).unwrap();
    assert_eq!(processed.load(Ordering::Relaxed), 30);
}

#[test]
fn worker_failure_does_not_outlive_a_local_panic() {
    trace(|| {
        let config = Config::new(1, 1).unwrap();
        let failing = Arc::new(AtomicBool::new(true));
        let flag = failing.clone();
        let mut dispatcher = Dispatcher::new(config, AtomicUsize::new(0), move |_: &AtomicUsize, chunk: ChunkRange| {
            if flag.load(Ordering::Relaxed) {
                panic!("bad chunk {chunk:?}");
            }
        })
        .unwrap();

        // 90 items over 2 threads: the worker takes [0, 45) and the calling
        // thread [45, 90). Both panic, and the local panic wins.
        let result = catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch_count(90)));
        assert!(result.is_err());

        // The worker failure belonged to the tick that panicked.
        failing.store(false, Ordering::Relaxed);
        let partition = dispatcher.dispatch_count(60).unwrap();
        assert_eq!(partition.worker_chunks(), 1);
    });
}

#[test]
fn dispatch_after_teardown_fails() {
    let world = World::new(10);
    let mut dispatcher = world_dispatcher(2, 1, &world);
    dispatcher.dispatch().unwrap();

    dispatcher.teardown();
    assert!(dispatcher.is_torn_down());
    assert!(matches!(dispatcher.dispatch(), Err(DispatchError::TornDown)));
    assert!(matches!(dispatcher.dispatch_count(0), Err(DispatchError::TornDown)));

    // Teardown is idempotent.
    dispatcher.teardown();
}

#[test]
fn teardown_detaches_threads_that_miss_the_deadline() {
    trace(|| {
        let world = World::new(64);
        let config = Config::builder()
            .thread_count(4)
            .min_job_size(1)
            .join_timeout(Duration::ZERO)
            .build()
            .unwrap();
        let callback: WorldCallback = |world, chunk| world.visit(chunk);
        let mut dispatcher = Dispatcher::new(config, world.clone(), callback).unwrap();
        dispatcher.dispatch().unwrap();

        dispatcher.teardown();
        assert!(dispatcher.is_torn_down());
        assert!(matches!(dispatcher.dispatch(), Err(DispatchError::TornDown)));
        assert!(world.visit_counts().iter().all(|&v| v == 1));
    });
}

#[test]
fn teardown_releases_captured_state() {
    // Workers each hold a reference to the shared state; once teardown has
    // joined them, the dispatcher holds the only remaining one.
    let world = World::new(10);
    let mut dispatcher = world_dispatcher(4, 1, &world);
    dispatcher.dispatch().unwrap();
    dispatcher.teardown();
    drop(dispatcher);
    assert_eq!(Arc::strong_count(&world), 1);
}

#[test]
fn repeated_create_and_drop() {
    for round in 0..50 {
        let world = World::new(256);
        let mut dispatcher = world_dispatcher(1 + round % 4, 8, &world);
        dispatcher.dispatch().unwrap();
        drop(dispatcher);
        assert!(world.visit_counts().iter().all(|&v| v == 1));
    }
}

// -----------------------------------------------------------------------------
// Inline mode

#[test]
fn inline_mode_runs_everything_locally() {
    let world = World::new(1000);
    let config = Config::builder()
        .thread_count(8)
        .min_job_size(1)
        .execution_mode(ExecutionMode::Inline)
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(config, world.clone(), |world: &Arc<World>, chunk: ChunkRange| {
        world.visit(chunk);
    })
    .unwrap();

    assert_eq!(dispatcher.thread_count(), 0);
    assert_eq!(dispatcher.config().thread_count(), 8);

    dispatcher.dispatch().unwrap();
    assert_eq!(world.take_ranges(), [ChunkRange::new(0, 1000)]);
    assert!(world.visit_counts().iter().all(|&v| v == 1));
}

// -----------------------------------------------------------------------------
// System runner

struct Mover {
    world: Arc<World>,
    threads: usize,
    min_job_size: usize,
}

impl MultiThreadSystem for Mover {
    type Source = Arc<World>;
    type Callback = WorldCallback;

    fn source(&mut self) -> Arc<World> {
        self.world.clone()
    }

    fn callback(&mut self) -> WorldCallback {
        |world, chunk| world.visit(chunk)
    }

    fn min_job_size(&self) -> usize {
        self.min_job_size
    }

    fn thread_count(&self) -> ThreadCount {
        ThreadCount::Fixed(self.threads)
    }

    fn configure(&self, builder: tickpool::ConfigBuilder) -> tickpool::ConfigBuilder {
        builder.thread_name_prefix("mover")
    }
}

#[test]
fn system_lifecycle() {
    let world = World::new(400);
    let mut runner = SystemRunner::new(Mover {
        world: world.clone(),
        threads: 3,
        min_job_size: 10,
    });

    assert_eq!(runner.state(), SystemState::Uninitialized);
    assert!(matches!(runner.run(), Err(DispatchError::NotInitialized)));

    runner.initialize().unwrap();
    assert_eq!(runner.state(), SystemState::Running);
    assert!(matches!(runner.initialize(), Err(InitError::AlreadyInitialized)));
    assert_eq!(runner.dispatcher().unwrap().config().thread_name_prefix(), "mover");

    for _ in 0..10 {
        runner.run().unwrap();
    }
    assert!(world.visit_counts().iter().all(|&v| v == 10));
    let names = world
        .take_chunks()
        .into_iter()
        .map(|(_, name)| name)
        .collect::<BTreeSet<_>>();
    assert!(names.contains("mover-0") && names.contains("mover-2"));

    runner.teardown();
    assert_eq!(runner.state(), SystemState::TornDown);
    assert!(runner.dispatcher().is_none());
    assert!(matches!(runner.run(), Err(DispatchError::TornDown)));
    assert!(matches!(runner.initialize(), Err(InitError::AlreadyInitialized)));
}

#[test]
fn system_rejects_invalid_configuration() {
    let world = World::new(1);
    let mut runner = SystemRunner::new(Mover {
        world,
        threads: 0,
        min_job_size: 10,
    });
    assert!(matches!(
        runner.initialize(),
        Err(InitError::Config(ConfigError::ZeroThreadCount))
    ));
    assert_eq!(runner.state(), SystemState::Uninitialized);

    runner.system_mut().threads = 2;
    runner.system_mut().min_job_size = 0;
    assert!(matches!(
        runner.initialize(),
        Err(InitError::Config(ConfigError::ZeroMinJobSize))
    ));
}
