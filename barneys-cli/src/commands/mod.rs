//! CLI command implementations

pub mod codes;
pub mod configure;
pub mod session;

use std::path::Path;

use anyhow::{Context, Result};
use barneys_lib::{HttpProcessorClient, ProcessorClient, ProcessorConfig, RetryPolicy};

/// Flags shared by the network commands.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Skip TLS verification for this run
    pub insecure: bool,
    /// Extra attempts after a transient failure
    pub retries: u32,
    /// Verbose output
    pub verbose: bool,
}

impl RunOptions {
    /// Retry policy for these options.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.retries.saturating_add(1))
    }
}

/// Load the processor configuration.
///
/// Uses the saved `processor.json` when present, otherwise the
/// `BARNEYS_*` environment variables.
pub fn load_config(storage_dir: &Path) -> Result<ProcessorConfig> {
    match configure::load(storage_dir)? {
        Some(config) => Ok(config),
        None => ProcessorConfig::from_env().context(
            "No processor configured. Run 'barneys-pay configure' or set BARNEYS_API_URL and BARNEYS_DEFAULT_SECRET",
        ),
    }
}

/// Build an HTTP client for the configured processor.
pub fn build_client(storage_dir: &Path, options: &RunOptions) -> Result<HttpProcessorClient> {
    let mut config = load_config(storage_dir)?;
    if options.insecure {
        config = config.with_verify_tls(false);
    }
    ProcessorClient::new(config).context("Failed to create processor client")
}
