use std::thread;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use gz_features::{zeroed_features, BoardFeatures};

use crate::engine::AnyEngine;
use crate::factory::Factory;
use crate::fake::FakeEngine;

fn tagged(tag: f32, n: usize) -> Vec<BoardFeatures> {
    let mut f = zeroed_features();
    f[0] = tag;
    vec![f; n]
}

fn wait_for(factory: &Factory, what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {what}; stats: {:?}",
            factory.scheduler_stats()
        );
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn single_client_dispatches_immediately() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::uniform(8)));
    let client = factory.new_client();

    let out = client.run(tagged(1.0, 3));
    assert_eq!(out.policies.len(), 3);
    assert_eq!(out.values.len(), 3);
    assert_eq!(out.model, "fake");

    let stats = factory.scheduler_stats();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.queue_sum, 3);
    assert_eq!(stats.run_sum, 3);
    assert_eq!(stats.queued_requests, 0);
}

#[test]
fn full_batch_dispatches_regardless_of_census() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::uniform(4)));
    let _idle = factory.new_client();
    let client = factory.new_client();

    // An exactly-B submission never waits, even with an idle counted peer.
    let out = client.run(tagged(1.0, 4));
    assert_eq!(out.values.len(), 4);
    assert_eq!(factory.scheduler_stats().runs, 1);
}

#[test]
fn census_counts_only_counted_clients() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::uniform(4)));
    assert_eq!(factory.scheduler_stats().clients, 0);

    let counted = factory.new_client();
    assert_eq!(factory.scheduler_stats().clients, 1);

    let weak = factory.new_weak_client();
    assert_eq!(factory.scheduler_stats().clients, 1);

    drop(weak);
    assert_eq!(factory.scheduler_stats().clients, 1);
    drop(counted);
    assert_eq!(factory.scheduler_stats().clients, 0);
}

#[test]
fn two_clients_share_one_batch() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::echo(4)));
    let first = factory.new_client();
    let second = factory.new_client();

    thread::scope(|s| {
        s.spawn(move || {
            let out = first.run(tagged(1.0, 2));
            assert_eq!(out.values, vec![1.0, 1.0]);
            assert_eq!(out.policies.len(), 2);
            assert_eq!(out.policies[0][0], 1.0);
        });
        s.spawn(move || {
            let out = second.run(tagged(2.0, 2));
            assert_eq!(out.values, vec![2.0, 2.0]);
            assert_eq!(out.policies[0][0], 2.0);
        });
    });

    // Both submissions rode in a single full batch.
    let stats = factory.scheduler_stats();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.run_sum, 4);
}

#[test]
fn census_holds_partial_batch_until_peer_departs() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::echo(4)));
    let first = factory.new_client();
    let second = factory.new_client();
    let idle = factory.new_client();

    thread::scope(|s| {
        let a = s.spawn(move || first.run(tagged(5.0, 1)));
        let b = s.spawn(move || second.run(tagged(6.0, 1)));

        wait_for(&factory, "both submissions queued", || {
            factory.scheduler_stats().queue_sum == 2
        });
        thread::sleep(Duration::from_millis(50));
        // Two features are waiting but the third counted client might still
        // submit, so nothing may launch yet.
        assert_eq!(factory.scheduler_stats().runs, 0);

        drop(idle);

        let a = a.join().unwrap();
        let b = b.join().unwrap();
        assert_eq!(a.values, vec![5.0]);
        assert_eq!(b.values, vec![6.0]);
    });

    let stats = factory.scheduler_stats();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.run_sum, 2);
}

#[test]
fn weak_submission_dispatches_despite_idle_counted_peer() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::echo(4)));
    let _idle = factory.new_client();
    let weak = factory.new_weak_client();

    // The weak client's own request makes the queue as long as the census.
    let out = weak.run(tagged(3.0, 2));
    assert_eq!(out.values, vec![3.0, 3.0]);
    assert_eq!(factory.scheduler_stats().runs, 1);
}

#[test]
fn batches_preserve_fifo_order_and_offsets() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::slot_index(8)));
    let first = factory.new_client();
    let second = factory.new_client();
    let idle = factory.new_client();

    thread::scope(|s| {
        let a = s.spawn(move || first.run(tagged(0.0, 3)));
        wait_for(&factory, "first submission queued", || {
            factory.scheduler_stats().queue_sum == 3
        });
        let b = s.spawn(move || second.run(tagged(0.0, 2)));
        wait_for(&factory, "second submission queued", || {
            factory.scheduler_stats().queue_sum == 5
        });
        assert_eq!(factory.scheduler_stats().runs, 0);

        drop(idle);

        // Slot indices prove assembly order: the earlier submission owns the
        // batch's first slots, the later one the next, with nothing
        // interleaved or shifted.
        let a = a.join().unwrap();
        let b = b.join().unwrap();
        assert_eq!(a.values, vec![0.0, 1.0, 2.0]);
        assert_eq!(b.values, vec![3.0, 4.0]);
    });

    assert_eq!(factory.scheduler_stats().runs, 1);
}

#[test]
#[should_panic(expected = "exceeds the batch size")]
fn oversize_submission_panics() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::uniform(2)));
    let client = factory.new_client();
    let _ = client.run(tagged(0.0, 3));
}

#[test]
#[should_panic(expected = "empty feature batch")]
fn empty_submission_panics() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::uniform(2)));
    let client = factory.new_client();
    let _ = client.run(Vec::new());
}

#[test]
fn padding_is_never_delivered() {
    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::echo(8)));
    let client = factory.new_client();

    // The batch runs with five zeroed padding slots; an echo of 0.0 leaking
    // into the result would show up immediately.
    let out = client.run(tagged(9.0, 3));
    assert_eq!(out.values, vec![9.0, 9.0, 9.0]);
}

#[test]
fn concurrent_clients_get_isolated_results() {
    const BATCH: usize = 16;
    const THREADS: usize = 4;
    const ITERS: usize = 25;

    let factory = Factory::with_engine(AnyEngine::Fake(FakeEngine::echo(BATCH)));
    let clients: Vec<_> = (0..THREADS).map(|_| factory.new_client()).collect();

    thread::scope(|s| {
        for (t, client) in clients.into_iter().enumerate() {
            s.spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE + t as u64);
                for i in 0..ITERS {
                    let n = rng.gen_range(1..=BATCH);
                    let tag = (t * 1000 + i + 1) as f32;
                    let out = client.run(tagged(tag, n));
                    assert_eq!(out.policies.len(), n);
                    assert_eq!(out.values.len(), n);
                    // Every slot must carry this submission's tag: one
                    // foreign or padded entry would break the equality.
                    assert!(out.values.iter().all(|&v| v == tag));
                }
            });
        }
    });

    let stats = factory.scheduler_stats();
    assert_eq!(stats.queued_requests, 0);
    assert_eq!(stats.queue_sum, stats.run_sum);
    assert!(stats.runs >= 1);
    // Padding may add engine inputs but never drop client features.
    assert!(stats.runs * BATCH as u64 >= stats.run_sum);
}
