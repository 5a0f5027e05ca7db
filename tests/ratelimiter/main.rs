// tests/ratelimiter/main.rs

// test modules
mod fixtures;
mod composite_tests;
mod concurrency_tests;
mod error_tests;
mod fixed_delay_tests;

// Re-export common test utilities
pub use fixtures::test_clock::TestClock;
