// tests/ratelimiter/composite_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::test_clock::TestClock;
    use pace_limiter::{BoxedRateLimiter, Composite, FixedDelay, FixedWindow, RateLimiter, SlidingWindow};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn and_law_holds_across_a_run() {
        let clock = TestClock::new(0);
        let delay = Arc::new(FixedDelay::with_clock(Duration::from_millis(30), clock.clone()).unwrap());
        let window =
            Arc::new(SlidingWindow::with_clock(4, Duration::from_millis(200), clock.clone()).unwrap());
        let composite = Composite::pair(Arc::clone(&delay), Arc::clone(&window));

        for at in (0..2_000).step_by(11) {
            clock.set_time(at);
            assert_eq!(
                composite.is_allowed(),
                delay.is_allowed() && window.is_allowed(),
                "AND law broken at {at}"
            );
            assert_eq!(
                composite.time_until_next_millis(),
                delay.time_until_next_millis().max(window.time_until_next_millis())
            );
            let _ = composite.try_acquire();
        }
    }

    #[test]
    fn delay_then_window_quota() {
        let clock = TestClock::new(0);
        let composite = Composite::pair(
            FixedDelay::with_clock(Duration::from_millis(50), clock.clone()).unwrap(),
            FixedWindow::with_clock(5, Duration::from_millis(500), clock.clone()).unwrap(),
        );

        for _ in 0..5 {
            assert!(composite.try_acquire());
            assert!(!composite.try_acquire());
            clock.advance(50);
        }

        // quota spent at 0..200, window closes at 500
        assert!(!composite.try_acquire());
        assert_eq!(composite.time_until_next_millis(), 250);
        clock.set_time(500);
        assert!(composite.try_acquire());
    }

    #[test]
    fn accepts_more_than_two_children() {
        let clock = TestClock::new(0);
        let children: Vec<BoxedRateLimiter> = vec![
            Box::new(FixedDelay::with_clock(Duration::from_millis(10), clock.clone()).unwrap()),
            Box::new(FixedWindow::with_clock(3, Duration::from_millis(100), clock.clone()).unwrap()),
            Box::new(SlidingWindow::with_clock(2, Duration::from_millis(100), clock.clone()).unwrap()),
        ];
        let composite = Composite::new(children).unwrap();
        assert_eq!(composite.children().len(), 3);

        assert!(composite.try_acquire());
        clock.advance(10);
        assert!(composite.try_acquire());
        clock.advance(10);
        // sliding window is the tightest child here
        assert!(!composite.try_acquire());
        assert_eq!(composite.time_until_next_millis(), 80);
    }
}
