use crate::config::{ReaperConfig, StoreBackend};
use crate::services::cli_store::CliUploadStore;
use crate::services::store::{S3UploadStore, UploadStore};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_store(config: &ReaperConfig) -> Arc<dyn UploadStore> {
    match config.backend {
        StoreBackend::Cli => {
            info!(
                "☁️  Store: `{}` command line (Bucket: {})",
                config.aws_cli, config.bucket
            );
            Arc::new(CliUploadStore::new(
                config.aws_cli.clone(),
                config.connection(),
            ))
        }
        StoreBackend::Sdk => {
            info!(
                "☁️  Store: S3 SDK {} (Bucket: {})",
                config.endpoint_url.as_deref().unwrap_or("default endpoint"),
                config.bucket
            );
            Arc::new(S3UploadStore::new(
                build_s3_client(config).await,
                config.bucket.clone(),
            ))
        }
    }
}

async fn build_s3_client(config: &ReaperConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    // Custom endpoints are usually MinIO-style and need path addressing.
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
