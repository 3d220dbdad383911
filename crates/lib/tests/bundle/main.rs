//! Library integration tests for the packaging pipeline.

mod common;
mod property_tests;
mod scenario_tests;
