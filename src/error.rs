use thiserror::Error;

/// Fatal problems with the snapshot document. Any of these stops the run
/// before the store is contacted.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Snapshot has no top-level `Uploads` collection")]
    MissingUploads,

    #[error("Snapshot `Uploads` is not a list")]
    UploadsNotList,

    #[error("Upload record #{index} is malformed: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Upload record #{index} has an empty `Key`")]
    EmptyKey { index: usize },

    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by an upload store backend.
///
/// The engine never propagates these past a single record: verification,
/// resolution and abort each degrade them into an outcome.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store command ran and exited unsuccessfully. `output` holds stdout
    /// and stderr combined.
    #[error("command exited with {status}: {output}")]
    Command { status: String, output: String },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("S3 {operation} failed: {message}")]
    Sdk { operation: &'static str, message: String },

    #[error("unreadable store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Configuration that cannot be used to reach the store.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Bucket is not set (use --bucket or REAPER_BUCKET)")]
    MissingBucket,

    #[error("Unknown store backend `{0}` (expected `sdk` or `cli`)")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_carries_status_and_output() {
        let err = StoreError::Command {
            status: "exit status: 254".to_string(),
            output: "An error occurred (NoSuchUpload)".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("254"));
        assert!(text.contains("NoSuchUpload"));
    }
}
