//! Create/validate phase orchestration for the session harness.
//!
//! Two sequential phases, each internally parallel. Tasks run through a
//! bounded worker pool (semaphore width = `concurrency`) with a fixed
//! throttle delay before each launch; a phase ends only once every task
//! it launched has been joined. The validate phase reads whatever the
//! cookie files currently hold -- freshness is intentionally undefined,
//! so a validate-only run exercises cookies from an earlier run.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::ProtocolConfig;
use crate::cookies::{self, CookieSink};
use crate::profile::{DeviceCategory, ProfileRegistry};
use crate::session::{self, ServiceClient};

/// Everything a `sessions` run needs, assembled from the CLI.
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub iterations: u32,
    pub create: bool,
    pub validate: bool,
    pub mobile: bool,
    pub desktop: bool,
    pub host: String,
    pub email_template: String,
    pub xsrf: String,
    pub password: String,
    pub mobile_file: PathBuf,
    pub desktop_file: PathBuf,
    pub throttle: Duration,
    pub concurrency: usize,
    pub protocol: ProtocolConfig,
}

/// Per-category selection counts after a run.
#[derive(Debug, Clone, Copy)]
pub struct HarnessSummary {
    pub mobile: u64,
    pub desktop: u64,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no device categories enabled; pass --mobile and/or --desktop")]
    NoCategoriesEnabled,
    #[error("email template {0:?} must contain exactly one {{}} placeholder")]
    InvalidEmailTemplate(String),
    #[error("failed to open cookie file {0}: {1}")]
    CookieFile(PathBuf, io::Error),
}

/// Run the enabled phases and return the selection counts.
pub async fn run(opts: HarnessOptions) -> Result<HarnessSummary, HarnessError> {
    if !opts.mobile && !opts.desktop {
        return Err(HarnessError::NoCategoriesEnabled);
    }
    if opts.create && !session::template_is_valid(&opts.email_template) {
        return Err(HarnessError::InvalidEmailTemplate(opts.email_template.clone()));
    }

    let registry = Arc::new(ProfileRegistry::new(opts.mobile, opts.desktop));
    let client = Arc::new(ServiceClient::new(
        opts.host.clone(),
        opts.protocol.clone(),
        opts.xsrf.clone(),
        opts.password.clone(),
    ));

    if opts.create {
        create_phase(&opts, &registry, &client).await?;
    }
    if opts.validate {
        validate_phase(&opts, &client).await;
    }

    let (mobile, desktop) = registry.counts();
    Ok(HarnessSummary { mobile, desktop })
}

/// Truncate both cookie files, then launch one creator task per iteration.
///
/// Both files are truncated even when a category is disabled, so after a
/// create run the files only ever hold cookies from that run.
async fn create_phase(
    opts: &HarnessOptions,
    registry: &Arc<ProfileRegistry>,
    client: &Arc<ServiceClient>,
) -> Result<(), HarnessError> {
    let (mobile_sink, mobile_writer) = CookieSink::spawn(&opts.mobile_file)
        .await
        .map_err(|e| HarnessError::CookieFile(opts.mobile_file.clone(), e))?;
    let (desktop_sink, desktop_writer) = CookieSink::spawn(&opts.desktop_file)
        .await
        .map_err(|e| HarnessError::CookieFile(opts.desktop_file.clone(), e))?;

    tracing::info!(iterations = opts.iterations, "create phase starting");

    let semaphore = Arc::new(Semaphore::new(opts.concurrency));
    let mut tasks = JoinSet::new();
    for _ in 0..opts.iterations {
        tokio::time::sleep(opts.throttle).await;
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break, // semaphore closed; cannot happen while we hold it
        };
        let registry = registry.clone();
        let client = client.clone();
        let template = opts.email_template.clone();
        let mobile_sink = mobile_sink.clone();
        let desktop_sink = desktop_sink.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let profile = registry.select();
            let username = session::random_username(&template);
            if let Some(cookie) = client.create_session(&username, profile.user_agent).await {
                match profile.category {
                    DeviceCategory::Mobile => mobile_sink.push(cookie).await,
                    DeviceCategory::Desktop => desktop_sink.push(cookie).await,
                }
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::warn!(error = %e, "creator task panicked");
        }
    }

    // Close the sinks and wait for the writers so every harvested cookie
    // is on disk before the validate phase reads the files back.
    drop(mobile_sink);
    drop(desktop_sink);
    if let Err(e) = mobile_writer.await {
        tracing::warn!(error = %e, "mobile cookie writer panicked");
    }
    if let Err(e) = desktop_writer.await {
        tracing::warn!(error = %e, "desktop cookie writer panicked");
    }

    Ok(())
}

/// Read each enabled category's cookie file and validate every cookie once.
async fn validate_phase(opts: &HarnessOptions, client: &Arc<ServiceClient>) {
    let files = [
        (DeviceCategory::Mobile, &opts.mobile_file, opts.mobile),
        (DeviceCategory::Desktop, &opts.desktop_file, opts.desktop),
    ];
    for (category, path, enabled) in files {
        if !enabled {
            continue;
        }
        tracing::info!(
            category = category.label(),
            file = %path.display(),
            "validating sessions"
        );
        let cookies = match cookies::read_cookies(path).await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to read cookie file");
                continue;
            }
        };

        let semaphore = Arc::new(Semaphore::new(opts.concurrency));
        let mut tasks = JoinSet::new();
        for cookie in cookies {
            tokio::time::sleep(opts.throttle).await;
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let client = client.clone();
            tasks.spawn(async move {
                let _permit = permit;
                client.validate_session(&cookie).await;
            });
        }
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                tracing::warn!(error = %e, "validator task panicked");
            }
        }
    }
}
