use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenvy::dotenv;
use multipart_reaper::config::{ReaperConfig, StoreBackend};
use multipart_reaper::infrastructure::storage;
use multipart_reaper::services::snapshot::{load_snapshot, render_snapshot};
use multipart_reaper::{ReconcileSettings, Reconciler, RunMode, SkipReason, Summary, preview};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Abort stale multipart uploads that are still open", long_about = None)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct ConnectionArgs {
    /// Bucket holding the uploads (overrides REAPER_BUCKET)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Credentials profile (overrides REAPER_PROFILE)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// S3-compatible endpoint URL (overrides REAPER_ENDPOINT_URL)
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Region (overrides REAPER_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Store client: sdk or cli (overrides REAPER_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify and abort the uploads listed in a snapshot
    Reap {
        /// Snapshot file (output of `aws s3api list-multipart-uploads`)
        snapshot: PathBuf,

        /// Print the abort commands without contacting the store
        #[arg(long, conflicts_with = "test")]
        dry_run: bool,

        /// Process only the first record
        #[arg(long)]
        test: bool,

        /// Print the summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Write the uploads currently open in the bucket as a snapshot
    Snapshot {
        /// Only uploads whose key starts with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(args: &ConnectionArgs) -> anyhow::Result<ReaperConfig> {
    let mut config = ReaperConfig::from_env()?;
    if let Some(bucket) = &args.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(profile) = &args.profile {
        config.profile = Some(profile.clone());
    }
    if let Some(endpoint) = &args.endpoint_url {
        config.endpoint_url = Some(endpoint.clone());
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    if let Some(backend) = &args.backend {
        config.backend = backend.parse::<StoreBackend>()?;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multipart_reaper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args.connection)?;
    info!(
        "🧹 Multipart reaper: bucket={}, backend={}, retry delay={:?}, record pause={:?}",
        config.bucket, config.backend, config.abort_retry_delay, config.record_pause
    );

    match args.command {
        Command::Reap {
            snapshot,
            dry_run,
            test,
            json,
        } => {
            let mode = if dry_run {
                RunMode::Preview
            } else if test {
                RunMode::Test
            } else {
                RunMode::Full
            };

            // Parse before building a client so a bad snapshot never reaches the store.
            let records = load_snapshot(&snapshot).await?;
            info!(
                "📄 Loaded {} record(s) from {}",
                records.len(),
                snapshot.display()
            );

            // A preview never builds a client, so it needs no credentials or profile files.
            let summary = if mode == RunMode::Preview {
                preview(&records, &config.connection(), &config.aws_cli)
            } else {
                let store = storage::setup_store(&config).await;
                let reconciler =
                    Reconciler::new(store, config.connection(), ReconcileSettings::from(&config));
                reconciler.run(&records, mode).await
            };

            report(&summary);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }

            if summary.has_failures() {
                error!("❌ {} abort(s) failed", summary.failed);
                std::process::exit(1);
            }
        }
        Command::Snapshot { prefix, output } => {
            let store = storage::setup_store(&config).await;
            let uploads = store
                .list_uploads(&prefix)
                .await
                .context("Failed to list multipart uploads")?;
            let document = render_snapshot(&uploads)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, document)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(
                        "💾 Wrote {} open upload(s) to {}",
                        uploads.len(),
                        path.display()
                    );
                }
                None => println!("{}", document),
            }
        }
    }

    Ok(())
}

fn report(summary: &Summary) {
    info!("📊 Mode: {}", summary.mode);
    info!("📊 Total input entries: {}", summary.total_input_entries);
    info!("📊 Records processed: {}", summary.records_processed);
    if summary.mode == RunMode::Preview {
        info!("📊 Would abort: {}", summary.aborted);
    } else {
        info!(
            "📊 Active uploads aborted: {}",
            summary.actual_active_uploads_aborted()
        );
    }
    info!(
        "📊 Skipped: {} (stale: {}, raced away: {})",
        summary.skipped,
        summary.skipped_for(SkipReason::Stale),
        summary.skipped_for(SkipReason::RacedAway)
    );
    info!("📊 Failed: {}", summary.failed);
    for failure in &summary.failures {
        warn!(
            "   {} ({}): {}",
            failure.key, failure.upload_id, failure.error
        );
    }
}
