use crate::error::ConfigError;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which client talks to the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process AWS SDK client
    Sdk,
    /// `aws s3api` child processes
    Cli,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sdk" => Ok(StoreBackend::Sdk),
            "cli" => Ok(StoreBackend::Cli),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sdk => write!(f, "sdk"),
            StoreBackend::Cli => write!(f, "cli"),
        }
    }
}

/// Connection parameters shared by every store call in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub bucket: String,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
}

impl ConnectionParams {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            profile: None,
            endpoint_url: None,
            region: None,
        }
    }

    /// Trailing `aws` CLI flags selecting profile, endpoint and region.
    pub fn cli_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if let Some(profile) = &self.profile {
            flags.push("--profile".to_string());
            flags.push(profile.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            flags.push("--endpoint-url".to_string());
            flags.push(endpoint.clone());
        }
        if let Some(region) = &self.region {
            flags.push("--region".to_string());
            flags.push(region.clone());
        }
        flags
    }

    /// Argument vector for `aws` that aborts one upload.
    pub fn abort_args(&self, key: &str, upload_id: &str) -> Vec<String> {
        let mut args = vec![
            "s3api".to_string(),
            "abort-multipart-upload".to_string(),
            "--bucket".to_string(),
            self.bucket.clone(),
            "--key".to_string(),
            key.to_string(),
            "--upload-id".to_string(),
            upload_id.to_string(),
        ];
        args.extend(self.cli_flags());
        args
    }

    /// Argument vector for `aws` that lists open uploads under a prefix.
    pub fn list_args(&self, key_prefix: &str) -> Vec<String> {
        let mut args = vec![
            "s3api".to_string(),
            "list-multipart-uploads".to_string(),
            "--bucket".to_string(),
            self.bucket.clone(),
            "--prefix".to_string(),
            key_prefix.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        args.extend(self.cli_flags());
        args
    }

    /// Human-readable abort command, shell-quoted where needed.
    pub fn abort_command(&self, program: &str, key: &str, upload_id: &str) -> String {
        std::iter::once(program.to_string())
            .chain(self.abort_args(key, upload_id))
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Runtime configuration for the reaper
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Target bucket (required)
    pub bucket: String,

    /// Named credentials profile
    pub profile: Option<String>,

    /// Custom S3-compatible endpoint, e.g. MinIO
    pub endpoint_url: Option<String>,

    /// Region (default: "us-east-1")
    pub region: String,

    /// Store client (default: sdk)
    pub backend: StoreBackend,

    /// Path or name of the `aws` executable (default: "aws")
    pub aws_cli: String,

    /// Static access key, used together with `secret_key`
    pub access_key: Option<String>,

    /// Static secret key
    pub secret_key: Option<String>,

    /// Delay before the single abort retry (default: 2000 ms)
    pub abort_retry_delay: Duration,

    /// Pause between snapshot records (default: 500 ms)
    pub record_pause: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            profile: None,
            endpoint_url: None,
            region: "us-east-1".to_string(),
            backend: StoreBackend::Sdk,
            aws_cli: "aws".to_string(),
            access_key: None,
            secret_key: None,
            abort_retry_delay: Duration::from_millis(2000),
            record_pause: Duration::from_millis(500),
        }
    }
}

impl ReaperConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        Ok(Self {
            bucket: env::var("REAPER_BUCKET").unwrap_or(default.bucket),

            profile: env::var("REAPER_PROFILE").ok().filter(|v| !v.is_empty()),

            endpoint_url: env::var("REAPER_ENDPOINT_URL")
                .ok()
                .filter(|v| !v.is_empty()),

            region: env::var("REAPER_REGION").unwrap_or(default.region),

            backend: match env::var("REAPER_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => default.backend,
            },

            aws_cli: env::var("REAPER_AWS_CLI").unwrap_or(default.aws_cli),

            access_key: env::var("REAPER_ACCESS_KEY").ok(),
            secret_key: env::var("REAPER_SECRET_KEY").ok(),

            abort_retry_delay: env::var("REAPER_ABORT_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.abort_retry_delay),

            record_pause: env::var("REAPER_RECORD_PAUSE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.record_pause),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        Ok(())
    }

    pub fn connection(&self) -> ConnectionParams {
        ConnectionParams {
            bucket: self.bucket.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
            region: Some(self.region.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaperConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.backend, StoreBackend::Sdk);
        assert_eq!(config.abort_retry_delay, Duration::from_secs(2));
        assert_eq!(config.record_pause, Duration::from_millis(500));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("CLI".parse::<StoreBackend>().unwrap(), StoreBackend::Cli);
        assert_eq!(" sdk ".parse::<StoreBackend>().unwrap(), StoreBackend::Sdk);
        assert!("rest".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_abort_command_rendering() {
        let mut params = ConnectionParams::new("backups");
        params.profile = Some("ops".to_string());
        params.endpoint_url = Some("https://s3.example.com".to_string());

        let command = params.abort_command("aws", "logs/day 1.tar", "abc123");
        assert_eq!(
            command,
            "aws s3api abort-multipart-upload --bucket backups --key 'logs/day 1.tar' \
             --upload-id abc123 --profile ops --endpoint-url https://s3.example.com"
        );
    }

    #[test]
    fn test_list_args_use_prefix_not_upload_id() {
        let params = ConnectionParams::new("backups");
        let args = params.list_args("logs/a");
        assert!(args.windows(2).any(|w| w[0] == "--prefix" && w[1] == "logs/a"));
        assert!(!args.iter().any(|a| a == "--upload-id-marker"));
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
