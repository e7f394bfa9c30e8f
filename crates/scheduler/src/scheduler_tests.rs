// SPDX-License-Identifier: MIT

use super::*;
use svcrt_core::FakeClock;
use svcrt_pool::ThreadPool;

fn fake_scheduler() -> (Arc<Scheduler>, FakeClock) {
    let clock = FakeClock::new();
    let pool = ThreadPool::alloc(2, 0, None);
    pool.start();
    let scheduler = Scheduler::alloc_with_clock(None, None, None, pool, clock.clone());
    scheduler.start();
    (scheduler, clock)
}

#[test]
fn fires_after_start_delay() {
    let (scheduler, clock) = fake_scheduler();
    let (tx, rx) = std::sync::mpsc::channel();
    let _schedule = scheduler.schedule_create(
        move || tx.send(()).unwrap(),
        Duration::from_secs(10),
        Duration::from_millis(50),
        1,
        None,
        None,
    );

    assert!(rx.try_recv().is_err(), "should not fire before the start delay");
    clock.advance(Duration::from_millis(60));
    rx.recv_timeout(Duration::from_secs(1)).unwrap();
    scheduler.free();
}

#[test]
fn repeat_count_is_exact_then_auto_retires() {
    let (scheduler, clock) = fake_scheduler();
    let count = Arc::new(AtomicU64::new(0));
    let c = count.clone();
    let schedule = scheduler.schedule_create(
        move || {
            c.fetch_add(1, Ordering::SeqCst);
        },
        Duration::from_millis(10),
        Duration::from_millis(0),
        3,
        None,
        None,
    );

    for _ in 0..5 {
        clock.advance(Duration::from_millis(15));
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(!scheduler.schedule_add(&schedule), "already retired, not re-addable without explicit add");
    scheduler.free();
}

#[test]
fn remove_then_add_resumes_firing() {
    let (scheduler, clock) = fake_scheduler();
    let count = Arc::new(AtomicU64::new(0));
    let c = count.clone();
    let schedule = scheduler.schedule_create(
        move || {
            c.fetch_add(1, Ordering::SeqCst);
        },
        Duration::from_millis(10),
        Duration::from_millis(0),
        0,
        None,
        None,
    );

    clock.advance(Duration::from_millis(15));
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert!(scheduler.schedule_remove(&schedule));

    let before = count.load(Ordering::SeqCst);
    clock.advance(Duration::from_secs(1));
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), before, "removed schedule should not fire");

    assert!(scheduler.schedule_add(&schedule));
    clock.advance(Duration::from_millis(15));
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert!(count.load(Ordering::SeqCst) > before);

    scheduler.free();
}

#[test]
fn drops_firing_when_target_pool_is_saturated() {
    let clock = FakeClock::new();
    let pool = ThreadPool::alloc(1, 1, None); // not started: every try_work beyond capacity 1 fails
    let scheduler = Scheduler::alloc_with_clock(None, None, None, pool, clock.clone());
    scheduler.start();

    let schedule = scheduler.schedule_create(|| (), Duration::from_millis(10), Duration::from_millis(0), 0, None, None);
    // Occupy the pool's single queue slot so the scheduler's own try_work fails.
    scheduler.thread_pool().try_work(svcrt_pool::Job::new(|| {
        std::thread::sleep(std::time::Duration::from_millis(200));
    }));

    clock.advance(Duration::from_millis(15));
    std::thread::sleep(std::time::Duration::from_millis(30));

    assert!(schedule.dropped() >= 1);
    scheduler.free();
}
