//! `club-sync`: run the federation sync once, or on an interval.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use core_runtime::config::CoreConfigBuilder;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::CoreService;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "club-sync", version, about = "Synchronize club data from the federation API")]
struct Args {
    /// Path to the SQLite database
    #[arg(long, env = "CLUB_SYNC_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Federation number of the tracked club
    #[arg(long, env = "CLUB_SYNC_CLUB_NUMBER")]
    club: Option<i64>,

    /// Season applied when payloads omit one
    #[arg(long, env = "CLUB_SYNC_SEASON")]
    season: Option<i64>,

    /// Federation API root
    #[arg(long, env = "CLUB_SYNC_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Repeat the sync every N seconds instead of running once
    #[arg(long, value_name = "SECS")]
    every: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CLUB_SYNC_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Log format (pretty, json, compact)
    #[arg(long, env = "CLUB_SYNC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Raw tracing filter, overrides --log-level
    #[arg(long, env = "CLUB_SYNC_LOG_FILTER")]
    log_filter: Option<String>,
}

impl Args {
    fn logging(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default().with_level(self.log_level);
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if let Some(filter) = &self.log_filter {
            config = config.with_filter(filter.clone());
        }
        config
    }

    fn builder(&self) -> anyhow::Result<CoreConfigBuilder> {
        let mut builder = CoreConfigBuilder::from_vars(|key| std::env::var(key).ok())?;
        if let Some(path) = &self.database {
            builder = builder.database_path(path);
        }
        if let Some(club) = self.club {
            builder = builder.club_number(club);
        }
        if let Some(season) = self.season {
            builder = builder.current_season(season);
        }
        if let Some(url) = &self.api_base_url {
            builder = builder.api_base_url(url.clone());
        }
        Ok(builder)
    }
}

/// One run; `Ok(false)` when the run finished unsuccessfully
async fn sync_once(service: &CoreService) -> anyhow::Result<bool> {
    let summary = service.run_sync().await?;
    if summary.success {
        info!(
            records = summary.records_processed(),
            warnings = summary.warnings.len(),
            "Sync completed"
        );
    } else {
        error!(errors = ?summary.errors, "Sync failed");
    }
    Ok(summary.success)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.logging()).context("failed to initialise logging")?;

    let config = args.builder()?.build().context("invalid configuration")?;
    if !config.sync.enabled {
        warn!("Sync disabled by configuration, nothing to do");
        return Ok(());
    }

    let service = CoreService::bootstrap(config)
        .await
        .context("failed to start club sync service")?;

    let Some(every) = args.every else {
        if !sync_once(&service).await? {
            bail!("sync run failed");
        }
        return Ok(());
    };

    let mut interval = tokio::time::interval(Duration::from_secs(every.max(1)));
    info!(every_secs = every, "Running sync on an interval");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = sync_once(&service).await {
                    error!(error = %e, "Sync run aborted");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}
