//! Environment variables shared with later workflow steps

use crate::error::{ActionError, ActionResult};
use crate::logging::{escape_data, escape_property};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Whether the success marker has been set by an earlier step.
///
/// Only presence counts; `""` and `"0"` still mean success.
pub fn marker_present(name: &str) -> bool {
    std::env::var_os(name).is_some()
}

/// Build the `GITHUB_ENV` entry for one variable
pub fn file_command_entry(name: &str, value: &str, delimiter: &str) -> ActionResult<String> {
    if name.contains(delimiter) || value.contains(delimiter) {
        return Err(ActionError::EnvExport {
            name: name.to_string(),
            reason: format!("name or value contains the delimiter {}", delimiter),
        });
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Reject pairs the OS cannot hold as an environment variable
fn check_exportable(name: &str, value: &str) -> ActionResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('=') {
        "name contains '='"
    } else if name.contains('\0') || value.contains('\0') {
        "name or value contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(ActionError::EnvExport {
        name: name.escape_debug().to_string(),
        reason: reason.to_string(),
    })
}

/// Exports variables to this process and to subsequent steps
pub struct EnvExporter {
    env_file: Option<PathBuf>,
}

impl EnvExporter {
    /// `env_file` is the runner's `GITHUB_ENV` file, if any
    pub fn new(env_file: Option<PathBuf>) -> Self {
        Self { env_file }
    }

    /// Export `name=value`
    pub async fn export(&self, name: &str, value: &str) -> ActionResult<()> {
        check_exportable(name, value)?;
        std::env::set_var(name, value);

        match &self.env_file {
            Some(path) => {
                let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
                let entry = file_command_entry(name, value, &delimiter)?;
                self.append(&entry).await.map_err(|e| ActionError::EnvExport {
                    name: name.to_string(),
                    reason: format!("writing {}: {}", path.display(), e),
                })?;
            }
            None => {
                println!(
                    "::set-env name={}::{}",
                    escape_property(name),
                    escape_data(value)
                );
            }
        }

        debug!("Exported {}", name);
        Ok(())
    }

    async fn append(&self, entry: &str) -> std::io::Result<()> {
        let Some(path) = &self.env_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn entry_uses_heredoc_syntax() {
        let entry = file_command_entry("NAME", "multi\nline", "EOF_X").unwrap();
        assert_eq!(entry, "NAME<<EOF_X\nmulti\nline\nEOF_X\n");
    }

    #[test]
    fn entry_rejects_delimiter_in_value() {
        assert!(file_command_entry("NAME", "a EOF_X b", "EOF_X").is_err());
    }

    #[tokio::test]
    #[serial]
    async fn export_writes_env_file_and_process_env() {
        let temp = TempDir::new().unwrap();
        let env_file = temp.path().join("github_env");
        let exporter = EnvExporter::new(Some(env_file.clone()));

        exporter.export("PUBLISHER_TEST_EXPORT_A", "one").await.unwrap();
        exporter.export("PUBLISHER_TEST_EXPORT_B", "two").await.unwrap();

        assert_eq!(std::env::var("PUBLISHER_TEST_EXPORT_A").unwrap(), "one");

        let content = std::fs::read_to_string(&env_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("PUBLISHER_TEST_EXPORT_A<<ghadelimiter_"));
        assert_eq!(lines[1], "one");
        assert_eq!(lines[2], lines[0].trim_start_matches("PUBLISHER_TEST_EXPORT_A<<"));
        assert_eq!(lines[4], "two");

        std::env::remove_var("PUBLISHER_TEST_EXPORT_A");
        std::env::remove_var("PUBLISHER_TEST_EXPORT_B");
    }

    #[tokio::test]
    #[serial]
    async fn export_without_env_file_sets_process_env() {
        let exporter = EnvExporter::new(None);
        exporter.export("PUBLISHER_TEST_EXPORT_C", "three").await.unwrap();
        assert_eq!(std::env::var("PUBLISHER_TEST_EXPORT_C").unwrap(), "three");
        std::env::remove_var("PUBLISHER_TEST_EXPORT_C");
    }

    #[tokio::test]
    #[serial]
    async fn unwritable_env_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let exporter = EnvExporter::new(Some(temp.path().join("missing").join("env")));

        let err = exporter.export("PUBLISHER_TEST_EXPORT_D", "x").await.unwrap_err();
        assert!(matches!(err, ActionError::EnvExport { .. }));
        std::env::remove_var("PUBLISHER_TEST_EXPORT_D");
    }

    #[tokio::test]
    #[serial]
    async fn nul_byte_is_rejected_before_setting() {
        let temp = TempDir::new().unwrap();
        let env_file = temp.path().join("github_env");
        let exporter = EnvExporter::new(Some(env_file.clone()));

        let err = exporter
            .export("PUBLISHER_TEST_EXPORT_NUL", "a\0b")
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::EnvExport { .. }));
        assert!(err.to_string().contains("NUL"));
        assert!(std::env::var_os("PUBLISHER_TEST_EXPORT_NUL").is_none());
        assert!(!env_file.exists());
    }

    #[test]
    fn unusable_names_are_rejected() {
        assert!(check_exportable("", "x").is_err());
        assert!(check_exportable("A=B", "x").is_err());
        assert!(check_exportable("A\0", "x").is_err());
        assert!(check_exportable("A", "multi\nline").is_ok());
    }

    #[test]
    #[serial]
    fn marker_presence_ignores_value() {
        let name = "PUBLISHER_TEST_MARKER";
        std::env::remove_var(name);
        assert!(!marker_present(name));

        std::env::set_var(name, "");
        assert!(marker_present(name));

        std::env::set_var(name, "0");
        assert!(marker_present(name));

        std::env::remove_var(name);
    }
}
