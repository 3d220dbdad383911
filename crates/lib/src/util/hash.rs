//! Hashing utilities for content-addressed archives.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 digest
//! - `BuildHasher`: The rolling hash folded over every staged file

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA256 hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Rolling hash accumulated over a build's output in processing order.
///
/// Each staged file contributes its path and its content, both
/// length-prefixed so adjacent segments cannot run together. Filesystem
/// metadata is never folded in.
#[derive(Clone, Default)]
pub struct BuildHasher {
  hasher: Sha256,
  segments: usize,
}

impl BuildHasher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fold one emitted byte sequence into the digest.
  pub fn update(&mut self, bytes: &[u8]) {
    self.hasher.update(bytes);
    self.segments += 1;
  }

  /// Fold one staged file: its path relative to the archive root, then its
  /// content.
  pub fn update_entry(&mut self, path: &str, content: &[u8]) {
    self.update_framed(path.as_bytes());
    self.update_framed(content);
  }

  fn update_framed(&mut self, bytes: &[u8]) {
    self.hasher.update((bytes.len() as u64).to_le_bytes());
    self.update(bytes);
  }

  /// Number of byte sequences folded in so far.
  pub fn segments(&self) -> usize {
    self.segments
  }

  pub fn finalize(self) -> ContentHash {
    ContentHash(hex::encode(self.hasher.finalize()))
  }
}
