//! Lexical path helpers.
//!
//! None of these functions touch the filesystem.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push("..");
        }
      }
      Component::CurDir => {}
      _ => normalized.push(component),
    }
  }
  normalized
}

/// Relative path from directory `from` to `to`.
///
/// Both paths are expected to be normalized and of the same kind (both
/// absolute or both relative). Returns `.` when they are equal.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
  let from_components: Vec<_> = from.components().collect();
  let to_components: Vec<_> = to.components().collect();

  let common_len = from_components
    .iter()
    .zip(to_components.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut relative = PathBuf::new();
  for _ in common_len..from_components.len() {
    relative.push("..");
  }
  for component in to_components.iter().skip(common_len) {
    relative.push(component);
  }

  if relative.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    relative
  }
}

/// True if the relative path climbs out of its base.
pub fn escapes(relative: &Path) -> bool {
  matches!(relative.components().next(), Some(Component::ParentDir))
}

/// Render a relative path with forward slashes regardless of host.
pub fn to_slash(path: &Path) -> String {
  path
    .components()
    .filter_map(|c| match c {
      Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
      Component::ParentDir => Some("..".to_string()),
      Component::CurDir => Some(".".to_string()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}
