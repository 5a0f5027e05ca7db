// tests/ratelimiter/concurrency_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::test_clock::TestClock;
    use crate::fixtures::timing::{assert_elapsed_near, measure};
    use pace_limiter::{
        Composite, FixedDelay, FixedWindow, RateLimiter, RateLimiterConfig, Synchronized,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    // Launches `threads` simultaneous try_acquire calls and counts the grants
    fn simultaneous_acquires<L: RateLimiter + 'static>(limiter: Arc<L>, threads: usize) -> usize {
        let start = Arc::new(Barrier::new(threads));
        let granted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let start = Arc::clone(&start);
                let granted = Arc::clone(&granted);
                thread::spawn(move || {
                    start.wait();
                    if limiter.try_acquire() {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        granted.load(Ordering::SeqCst)
    }

    #[test]
    fn hundred_threads_one_grant() {
        let clock = TestClock::new(0);
        let limiter = Arc::new(Synchronized::new(
            FixedDelay::with_clock(Duration::from_millis(50), clock).unwrap(),
        ));
        assert_eq!(simultaneous_acquires(limiter, 100), 1);
    }

    #[test]
    fn synchronized_composite_grants_once_per_delay() {
        let clock = TestClock::new(0);
        let delay = FixedDelay::with_clock(Duration::from_millis(1), clock.clone()).unwrap();
        let window = FixedWindow::with_clock(10, Duration::from_secs(1), clock.clone()).unwrap();
        let limiter = Arc::new(Synchronized::new(Composite::pair(delay, window)));

        // frozen clock: the delay allows a single grant
        assert_eq!(simultaneous_acquires(Arc::clone(&limiter), 50), 1);
        clock.advance(1);
        assert_eq!(simultaneous_acquires(limiter, 50), 1);
    }

    #[test]
    fn builder_thread_safety_flag() {
        let clock = TestClock::new(0);
        let limiter = RateLimiterConfig::new()
            .window_size(Duration::from_secs(1))
            .max_quota(8)
            .enforce_thread_safety(true)
            .clock(clock)
            .build()
            .unwrap();
        assert_eq!(simultaneous_acquires(Arc::new(limiter), 64), 8);
    }

    #[test]
    fn concurrent_blocking_waits_are_spaced() {
        let threads = 8;
        let limiter = Arc::new(Synchronized::new(FixedDelay::new(Duration::from_millis(50)).unwrap()));
        let start = Arc::new(Barrier::new(threads));

        let ((), elapsed) = measure(|| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let limiter = Arc::clone(&limiter);
                    let start = Arc::clone(&start);
                    thread::spawn(move || {
                        start.wait();
                        limiter.block_until_allowed();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });

        assert_elapsed_near(elapsed, 50 * (threads as u64 - 1), 1_000);
    }
}
