//! Crate-internal test suites and shared fixtures.

pub mod helpers;

mod session;
