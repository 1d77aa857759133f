use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crpt_client::{AdmissionController, AdmissionError};
use futures_util::future::join_all;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_c_plus_one_concurrent_callers() {
    let c = Arc::new(AdmissionController::try_new(Duration::from_millis(500), 5).unwrap());
    let start = Instant::now();

    let mut waits = join_all((0..6).map(|_| {
        let c = c.clone();
        async move {
            c.acquire().await.unwrap();
            start.elapsed()
        }
    }))
    .await;

    waits.sort();
    assert!(waits[..5].iter().all(|w| *w == Duration::ZERO), "{:?}", waits);
    assert!(waits[5] >= Duration::from_millis(100), "{:?}", waits);
    assert!(waits[5] < Duration::from_millis(200), "{:?}", waits);
}

#[tokio::test(start_paused = true)]
async fn test_ten_per_minute_scenario() {
    let c = Arc::new(AdmissionController::try_new(Duration::from_secs(60), 10).unwrap());
    let start = Instant::now();

    for _ in 0..10 {
        assert!(c.try_acquire(), "first ten calls must not block");
    }

    let eleventh = {
        let c = c.clone();
        tokio::spawn(async move {
            c.acquire().await.unwrap();
            start.elapsed()
        })
    };

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!eleventh.is_finished());

    let waited = eleventh.await.unwrap();
    assert!(waited >= Duration::from_secs(6), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_long_idle_does_not_accumulate() {
    let window = Duration::from_millis(400);
    let c = AdmissionController::try_new(window, 4).unwrap();

    c.acquire().await.unwrap();
    tokio::time::sleep(window * 10).await;
    assert_eq!(c.available_permits(), 4);

    // The burst is capped at capacity
    for _ in 0..4 {
        assert!(c.try_acquire());
    }
    assert!(!c.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_waiter_does_not_corrupt_pool() {
    let c = Arc::new(AdmissionController::try_new(Duration::from_secs(1), 1).unwrap());

    // First caller holds the only permit
    c.acquire().await.unwrap();
    assert_eq!(c.available_permits(), 0);

    // Second caller blocks, then is cancelled before the tick
    let second = {
        let c = c.clone();
        tokio::spawn(async move { c.acquire().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    second.abort();
    assert!(second.await.unwrap_err().is_cancelled());
    assert_eq!(c.available_permits(), 0);

    // The tick raises the pool to exactly one
    tokio::time::sleep(Duration::from_millis(850)).await;
    assert_eq!(c.available_permits(), 1);

    // and a third caller is admitted with it
    c.acquire_timeout(Duration::from_millis(10)).await.unwrap();
    assert_eq!(c.available_permits(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_dropped_after_ticks_does_not_overfill_pool() {
    let c = AdmissionController::try_new(Duration::from_secs(1), 1).unwrap();
    c.acquire().await.unwrap();

    // Register as a waiter, then stop polling
    let mut waiter = Box::pin(c.acquire());
    assert!(futures_util::poll!(waiter.as_mut()).is_pending());

    // Two ticks pass while the waiter sits unpolled
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    drop(waiter);

    assert_eq!(c.available_permits(), 1);
    assert!(c.try_acquire());
    assert!(!c.try_acquire());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timed_out_waiters_do_not_overfill_pool() {
    let capacity = 2;
    let c = Arc::new(AdmissionController::try_new(Duration::from_millis(20), capacity).unwrap());
    while c.try_acquire() {}

    // Waiters keep giving up right around the ticks that wake them
    let churn: Vec<_> = (0..16)
        .map(|i| {
            let c = c.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    let _ = c.acquire_timeout(Duration::from_millis(1 + i % 12)).await;
                    assert!(c.available_permits() <= capacity as usize);
                }
            })
        })
        .collect();

    for task in join_all(churn).await {
        task.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(c.available_permits(), capacity as usize);
}

#[tokio::test]
async fn test_missed_ticks_are_not_coalesced() {
    // current_thread runtime: blocking it starves the replenisher
    let c = AdmissionController::try_new(Duration::from_millis(400), 4).unwrap();
    for _ in 0..4 {
        assert!(c.try_acquire());
    }

    // Five ticks' worth of time pass without the replenisher running
    std::thread::sleep(Duration::from_millis(550));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(c.available_permits(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_stays_within_bounds_under_contention() {
    let capacity = 8;
    let c = Arc::new(AdmissionController::try_new(Duration::from_millis(80), capacity).unwrap());
    let done = Arc::new(AtomicBool::new(false));
    let violations = Arc::new(AtomicUsize::new(0));

    let sampler = {
        let c = c.clone();
        let done = done.clone();
        let violations = violations.clone();
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                if c.available_permits() > capacity as usize {
                    violations.fetch_add(1, Ordering::SeqCst);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    let admitted = Arc::new(AtomicUsize::new(0));
    let callers: Vec<_> = (0..24)
        .map(|_| {
            let c = c.clone();
            let admitted = admitted.clone();
            tokio::spawn(async move {
                c.acquire().await.unwrap();
                admitted.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for caller in join_all(callers).await {
        caller.unwrap();
    }
    done.store(true, Ordering::SeqCst);
    sampler.await.unwrap();

    assert_eq!(admitted.load(Ordering::SeqCst), 24);
    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(c.available_permits() <= capacity as usize);
}

#[tokio::test]
async fn test_rejects_invalid_configuration() {
    for (window, capacity) in [
        (Duration::from_secs(60), 0),
        (Duration::from_secs(60), -1),
        (Duration::ZERO, 10),
        (Duration::ZERO, 0),
    ] {
        let err = AdmissionController::try_new(window, capacity).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidConfiguration(_)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_submit_does_not_send_after_shutdown() {
    let c = AdmissionController::try_new(Duration::from_secs(1), 3).unwrap();
    c.shutdown().await;

    let sent = AtomicUsize::new(0);
    let result: Result<(), AdmissionError> = c
        .submit(|| async {
            sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert_eq!(result, Err(AdmissionError::Shutdown));
    assert_eq!(sent.load(Ordering::SeqCst), 0);
}

#[derive(Debug, PartialEq)]
enum SendError {
    Admission(AdmissionError),
    Remote(&'static str),
}

impl From<AdmissionError> for SendError {
    fn from(e: AdmissionError) -> Self {
        SendError::Admission(e)
    }
}

#[tokio::test(start_paused = true)]
async fn test_submit_propagates_send_error_unchanged() {
    let c = AdmissionController::try_new(Duration::from_secs(1), 3).unwrap();

    let result: Result<(), SendError> = c.submit(|| async { Err(SendError::Remote("502")) }).await;

    assert_eq!(result, Err(SendError::Remote("502")));
    assert_eq!(c.available_permits(), 2);
}
