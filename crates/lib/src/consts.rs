//! Crate-wide constants.

/// File name of the package descriptor written next to the deployed sources.
pub const MANIFEST_FILE: &str = "package.json";

/// Directory under the staging root holding content-addressed archives.
pub const VERSIONS_DIR: &str = "versions";

/// Namespace for files that live outside the build's root directory.
pub const PARENT_NAMESPACE: &str = "parent";

/// Directory the dependency installer materializes packages into.
pub const NODE_MODULES_DIR: &str = "node_modules";

/// Extension of produced archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Modification time stamped on every archive entry: 2023-11-11T19:18:00.
pub const ARCHIVE_TIMESTAMP: (u16, u8, u8, u8, u8, u8) = (2023, 11, 11, 19, 18, 0);

/// Version declared for every generated package descriptor.
pub const BUNDLE_VERSION: &str = "1.0.0";

pub const BUNDLE_DESCRIPTION: &str = "Serverless function bundle";

/// Module system marker declared in the descriptor.
pub const MODULE_TYPE: &str = "module";

/// Minimum runtime version declared in the descriptor's `engines` table.
pub const MIN_NODE_VERSION: &str = ">=18.0.0";

/// Environment variable replacing the dependency installer command line.
pub const INSTALL_CMD_ENV: &str = "FNPACK_INSTALL_CMD";

/// Environment variable overriding the shell used to run the installer.
pub const SHELL_ENV: &str = "FNPACK_SHELL";
