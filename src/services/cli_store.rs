use crate::config::ConnectionParams;
use crate::error::StoreError;
use crate::models::UploadRecord;
use crate::services::snapshot::parse_listing;
use crate::services::store::UploadStore;
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;

/// Store backed by the `aws` command line. Each operation spawns one
/// `aws s3api` process and reads its JSON output.
pub struct CliUploadStore {
    program: String,
    connection: ConnectionParams,
}

impl CliUploadStore {
    pub fn new(program: impl Into<String>, connection: ConnectionParams) -> Self {
        Self {
            program: program.into(),
            connection,
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<Output, StoreError> {
        tracing::debug!("Running {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| StoreError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(StoreError::Command {
                status: output.status.to_string(),
                output: combined_output(&output),
            })
        }
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl UploadStore for CliUploadStore {
    async fn list_uploads(&self, key_prefix: &str) -> Result<Vec<UploadRecord>, StoreError> {
        let output = self.run(self.connection.list_args(key_prefix)).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_listing(&stdout)?)
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError> {
        self.run(self.connection.abort_args(key, upload_id)).await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-aws");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_list_parses_cli_json() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_script(
            dir.path(),
            r#"echo '{"Uploads": [{"Key": "a/b", "UploadId": "u1"}, {"Key": "a/bc", "UploadId": "u2"}]}'"#,
        );
        let store = CliUploadStore::new(program, ConnectionParams::new("bucket"));

        let uploads = store.list_uploads("a/b").await.unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].upload_id, "u1");
    }

    #[tokio::test]
    async fn test_list_without_uploads_field_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_script(dir.path(), "true");
        let store = CliUploadStore::new(program, ConnectionParams::new("bucket"));

        assert!(store.list_uploads("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_captures_status_and_combined_output() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_script(
            dir.path(),
            "echo partial\necho 'An error occurred (NoSuchUpload)' >&2\nexit 254",
        );
        let store = CliUploadStore::new(program, ConnectionParams::new("bucket"));

        match store.abort_upload("a", "u1").await {
            Err(StoreError::Command { status, output }) => {
                assert!(status.contains("254"));
                assert!(output.contains("partial"));
                assert!(output.contains("NoSuchUpload"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let store = CliUploadStore::new(
            "/nonexistent/aws-cli-binary",
            ConnectionParams::new("bucket"),
        );
        assert!(matches!(
            store.list_uploads("a").await,
            Err(StoreError::Spawn { .. })
        ));
    }
}
