//! Cache archives built with the system `tar`
//!
//! Paths are archived relative to the workspace; absolute paths are kept
//! as-is (`-P`). zstd is used whenever the binary is installed.

use crate::error::{ActionError, ActionResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Compression applied to the archive; part of the cache version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    Gzip,
}

impl Compression {
    /// Pick zstd if the `zstd` binary is on PATH
    pub async fn detect() -> Self {
        let zstd = Command::new("zstd")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);

        if zstd {
            Self::Zstd
        } else {
            debug!("zstd not found, falling back to gzip");
            Self::Gzip
        }
    }

    /// Name used in the cache version
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
        }
    }

    /// Archive file name
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Zstd => "cache.tzst",
            Self::Gzip => "cache.tgz",
        }
    }

    fn create_flags(&self) -> &'static [&'static str] {
        match self {
            Self::Zstd => &["--use-compress-program", "zstdmt"],
            Self::Gzip => &["-z"],
        }
    }

    fn extract_flags(&self) -> &'static [&'static str] {
        match self {
            Self::Zstd => &["--use-compress-program", "unzstd"],
            Self::Gzip => &["-z"],
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}

/// `tar` arguments that pack `paths` into `archive`
pub fn create_args(
    paths: &[String],
    workspace: &Path,
    archive: &Path,
    compression: Compression,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--posix".into(),
        "-cf".into(),
        archive.display().to_string(),
        "-P".into(),
        "-C".into(),
        workspace.display().to_string(),
    ];
    args.extend(compression.create_flags().iter().map(|s| s.to_string()));
    args.push("--".into());
    args.extend(paths.iter().map(|p| expand_path(p)));
    args
}

/// `tar` arguments that unpack `archive` in place
pub fn extract_args(workspace: &Path, archive: &Path, compression: Compression) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-xf".into(),
        archive.display().to_string(),
        "-P".into(),
        "-C".into(),
        workspace.display().to_string(),
    ];
    args.extend(compression.extract_flags().iter().map(|s| s.to_string()));
    args
}

/// Pack `paths` into `archive`
pub async fn create(
    paths: &[String],
    workspace: &Path,
    archive: &Path,
    compression: Compression,
) -> ActionResult<()> {
    tar(&create_args(paths, workspace, archive, compression)).await
}

/// Unpack `archive` relative to `workspace`
pub async fn extract(workspace: &Path, archive: &Path, compression: Compression) -> ActionResult<()> {
    tar(&extract_args(workspace, archive, compression)).await
}

async fn tar(args: &[String]) -> ActionResult<()> {
    debug!("Executing: tar {:?}", args);

    let output = Command::new("tar")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ActionError::command_failed(format!("tar {:?}", args), e))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ActionError::command_exec(
            format!("tar {}", args.join(" ")),
            stderr.trim(),
        ))
    }
}
