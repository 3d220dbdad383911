//! CLI integration tests.

mod bundle_tests;
mod common;
mod layer_tests;
mod plan_tests;
