//! Dependency installation.
//!
//! Production dependencies are materialized into the staged package
//! directory by running the package manager for the fixed deployment
//! target. The command runs through a shell so it can be replaced wholesale
//! through [`INSTALL_CMD_ENV`].

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{INSTALL_CMD_ENV, SHELL_ENV};
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("failed to spawn '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("'{command}' exited with {}:\n{stderr}{stdout}", code.map_or("a signal".to_string(), |c| format!("status {c}")))]
  Failed {
    command: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },
}

/// Materializes third-party dependencies into a directory.
pub trait DependencyInstaller {
  fn install(&self, dir: &Path, platform: Platform) -> Result<(), InstallError>;
}

/// Installer settings, read once from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallConfig {
  /// Replaces the generated install command line.
  pub command: Option<String>,
  /// Shell used to run the command.
  pub shell: Option<String>,
}

impl InstallConfig {
  pub fn from_env() -> Self {
    let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    Self {
      command: read(INSTALL_CMD_ENV),
      shell: read(SHELL_ENV),
    }
  }
}

/// Runs `npm install` for production dependencies only.
#[derive(Debug, Clone, Default)]
pub struct NpmInstaller {
  config: InstallConfig,
}

impl NpmInstaller {
  pub fn new(config: InstallConfig) -> Self {
    Self { config }
  }

  pub fn from_env() -> Self {
    Self::new(InstallConfig::from_env())
  }

  /// The command line run for `platform`.
  pub fn command_line(&self, platform: Platform) -> String {
    match &self.config.command {
      Some(command) => command.clone(),
      None => format!(
        "npm install --omit=dev --omit=peer --os={} --cpu={} --no-audit --no-fund",
        platform.os.npm_os(),
        platform.arch.npm_cpu()
      ),
    }
  }
}

impl DependencyInstaller for NpmInstaller {
  fn install(&self, dir: &Path, platform: Platform) -> Result<(), InstallError> {
    let command = self.command_line(platform);
    info!(cmd = %command, dir = %dir.display(), "installing dependencies");

    let (shell, shell_args) = get_shell(self.config.shell.as_deref());
    debug!(shell = %shell, "spawning installer");
    let output = Command::new(&shell)
      .args(&shell_args)
      .arg(&command)
      .current_dir(dir)
      .output()
      .map_err(|source| InstallError::Spawn {
        command: command.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
      return Err(InstallError::Failed {
        command,
        code: output.status.code(),
        stdout,
        stderr,
      });
    }

    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "installer output");
    }
    Ok(())
  }
}

/// Shell and arguments used to run a command line.
///
/// Defaults to `/bin/sh -c` (Unix) or PowerShell (Windows) rather than the
/// user's login shell, which may source profile files.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
