// tests/ratelimiter/fixed_delay_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::test_clock::TestClock;
    use pace_limiter::{FixedDelay, RateLimiter};
    use std::time::Duration;

    #[test]
    fn first_request_always_allowed() {
        let clock = TestClock::new(12_345);
        let limiter = FixedDelay::with_clock(Duration::from_millis(100), clock).unwrap();
        assert!(limiter.try_acquire());
    }

    #[test]
    fn requests_inside_the_delay_are_denied() {
        let clock = TestClock::new(0);
        let limiter = FixedDelay::with_clock(Duration::from_millis(100), clock.clone()).unwrap();

        // Grant at t=1000
        clock.set_time(1_000);
        assert!(limiter.try_acquire());

        // Anything before t=1100 is denied
        for at in [1_000, 1_001, 1_050, 1_099] {
            clock.set_time(at);
            assert!(!limiter.try_acquire(), "granted at {at}");
            assert_eq!(limiter.time_until_next_millis(), 1_100 - at);
        }

        // Exactly at t=1100 it is allowed again
        clock.set_time(1_100);
        assert!(limiter.is_allowed());
        assert!(limiter.try_acquire());
        assert_eq!(limiter.next_allowed_millis(), 1_200);
    }

    #[test]
    fn long_idle_period_does_not_bank_grants() {
        let clock = TestClock::new(0);
        let limiter = FixedDelay::with_clock(Duration::from_millis(100), clock.clone()).unwrap();
        assert!(limiter.try_acquire());

        clock.advance(10_000);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(clock.time_millis(), 10_000);
    }

    #[test]
    fn reset_behaves_like_new() {
        let clock = TestClock::new(500);
        let limiter = FixedDelay::with_clock(Duration::from_millis(100), clock.clone()).unwrap();
        let fresh = FixedDelay::with_clock(Duration::from_millis(100), clock.clone()).unwrap();
        assert!(limiter.try_acquire());

        limiter.reset();
        assert_eq!(limiter.next_allowed_millis(), fresh.next_allowed_millis());
        assert_eq!(limiter.time_until_next_millis(), fresh.time_until_next_millis());
        assert_eq!(limiter.try_acquire(), fresh.try_acquire());
        assert_eq!(limiter.try_acquire(), fresh.try_acquire());
    }

    #[test]
    fn accessors_report_configuration() {
        let limiter = FixedDelay::new(Duration::from_millis(250)).unwrap();
        assert_eq!(limiter.delay(), Duration::from_millis(250));
        assert_eq!(limiter.next_allowed_millis(), 0);
    }
}
