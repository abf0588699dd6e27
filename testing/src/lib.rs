//! # Farecast Testing
//!
//! Testing utilities and helpers for the Farecast reducer architecture.
//!
//! This crate provides:
//! - A deterministic [`Clock`] implementation
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effects, including cancellation ids
//!
//! ## Example
//!
//! ```ignore
//! use farecast_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(RideStatusReducer)
//!     .with_env(test_environment())
//!     .given_state(RideStatusState::default())
//!     .when_action(RideStatusAction::Open)
//!     .then_state(|state| assert_eq!(state.stage, Some(RideStage::Booked)))
//!     .then_effects(|effects| assertions::assert_runs_under(effects, &RIDE_TIMELINE))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use farecast_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use farecast_testing::mocks::FixedClock;
    /// use farecast_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    /// Route `tracing` output to the test harness
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "farecast=debug,farecast_runtime=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn tracing_can_be_initialised_twice() {
        init_test_tracing();
        init_test_tracing();
    }
}
