// tests/ratelimiter/error_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::test_clock::TestClock;
    use pace_limiter::{
        BoxedRateLimiter, CancellationToken, Composite, FixedDelay, FixedWindow, RateLimiterError,
        RateLimiterMap, SlidingWindow, Unlimited, WorkerPool, wait_cancellable,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn strategy_constructors_reject_bad_parameters() {
        match FixedDelay::new(Duration::from_micros(999)).unwrap_err() {
            RateLimiterError::InvalidDelay => {} // Expected
            other => panic!("Expected InvalidDelay, got: {:?}", other),
        }

        match FixedWindow::new(1, Duration::from_secs(1)).unwrap_err() {
            RateLimiterError::InvalidQuota(1) => {} // Expected
            other => panic!("Expected InvalidQuota(1), got: {:?}", other),
        }

        match SlidingWindow::new(0, Duration::from_secs(1)).unwrap_err() {
            RateLimiterError::InvalidQuota(0) => {} // Expected
            other => panic!("Expected InvalidQuota(0), got: {:?}", other),
        }

        match SlidingWindow::new(5, Duration::ZERO).unwrap_err() {
            RateLimiterError::InvalidWindowSize => {} // Expected
            other => panic!("Expected InvalidWindowSize, got: {:?}", other),
        }
    }

    #[test]
    fn composite_needs_two_children() {
        let only: BoxedRateLimiter = Box::new(Unlimited);
        let result = Composite::new(vec![only]);
        assert!(matches!(result, Err(RateLimiterError::InvalidComposite(1))));

        let result = Composite::new(Vec::new());
        assert!(matches!(result, Err(RateLimiterError::InvalidComposite(0))));
    }

    #[test]
    fn worker_pool_needs_a_thread() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(RateLimiterError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn cancelled_wait_reports_cancellation() {
        let limiter = FixedDelay::new(Duration::from_secs(60)).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        match wait_cancellable(&limiter, &token).unwrap_err() {
            RateLimiterError::Cancelled => {} // Expected
            other => panic!("Expected Cancelled, got: {:?}", other),
        }
    }

    #[test]
    fn factory_error_propagates_and_stores_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let map: RateLimiterMap<&str, FixedDelay<TestClock>, TestClock> = RateLimiterMap::with_clock(
            move || {
                counted.fetch_add(1, Ordering::SeqCst);
                FixedDelay::with_clock(Duration::ZERO, TestClock::new(0))
            },
            TestClock::new(0),
        );

        assert!(matches!(map.get("client1"), Err(RateLimiterError::InvalidDelay)));
        assert!(map.is_empty());

        // the factory is retried on the next access
        assert!(map.get("client1").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn io_errors_convert_into_spawn_errors() {
        let io = std::io::Error::other("no threads left");
        let err: RateLimiterError = io.into();
        assert!(matches!(err, RateLimiterError::Spawn(_)));
        assert!(err.to_string().contains("no threads left"));
    }

    #[test]
    fn error_messages_name_the_problem() {
        assert_eq!(
            RateLimiterError::InvalidQuota(1).to_string(),
            "max quota must be greater than 1, got 1"
        );
        assert_eq!(
            RateLimiterError::InvalidComposite(1).to_string(),
            "composite limiter needs at least 2 children, got 1"
        );
        assert_eq!(
            RateLimiterError::Rejected.to_string(),
            "executor has been shut down, task rejected"
        );
        assert_eq!(
            RateLimiterError::Cancelled.to_string(),
            "wait for a grant was cancelled"
        );
    }
}
