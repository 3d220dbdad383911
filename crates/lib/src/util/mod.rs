//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, lexical path
//! helpers and test helpers.

pub mod hash;
pub mod paths;

#[cfg(test)]
pub mod testutil;
