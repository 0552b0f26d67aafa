//! This module aggregates various utility submodules used throughout the application.

/// Replies that delete themselves after a delay.
pub mod transient;
