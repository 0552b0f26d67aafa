//! Test suite for GlovedBot
//! This module contains the integration tests and their shared utilities

pub mod common;
pub mod integration;

// Re-export commonly used testing utilities
pub use assert_matches::assert_matches;
pub use pretty_assertions::assert_eq;

/// Common test setup and utilities
pub mod test_utils {
    use std::sync::Once;
    use tracing::Level;

    static INIT: Once = Once::new();

    /// Initialize tracing for tests
    pub fn init() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(Level::DEBUG)
                .with_test_writer()
                .init();
        });
    }
}
