//! Processor configuration commands
//!
//! Settings are stored as `processor.json` in the storage directory.

use std::path::Path;

use anyhow::{Context, Result};
use barneys_lib::ProcessorConfig;

use crate::ui;

const CONFIG_FILE: &str = "processor.json";

/// Load the saved configuration, if any.
pub fn load(storage_dir: &Path) -> Result<Option<ProcessorConfig>> {
    let config_path = storage_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&config_path)
        .context("Failed to read processor configuration")?;
    let config: ProcessorConfig =
        serde_json::from_str(&contents).context("Failed to parse processor configuration")?;
    Ok(Some(config))
}

/// Save `config` to the storage directory.
pub fn save(storage_dir: &Path, config: &ProcessorConfig) -> Result<()> {
    std::fs::create_dir_all(storage_dir)?;
    let config_path = storage_dir.join(CONFIG_FILE);
    let contents =
        serde_json::to_string_pretty(config).context("Failed to serialize processor config")?;
    std::fs::write(&config_path, contents)
        .context("Failed to write processor configuration")?;
    Ok(())
}

/// Validate and save processor settings.
pub fn run(
    storage_dir: &Path,
    url: &str,
    default_secret: &str,
    timeout_ms: Option<u64>,
    verify_tls: bool,
    session_ttl: Option<u64>,
) -> Result<()> {
    ui::header("Configure Processor");

    let mut config = load(storage_dir)?
        .map(|mut existing| {
            existing.base_url = url.to_string();
            existing.default_secret = barneys_lib::DefaultSecret::new(default_secret);
            existing
        })
        .unwrap_or_else(|| ProcessorConfig::new(url, default_secret));

    if let Some(timeout_ms) = timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    config = config.with_verify_tls(verify_tls);
    config.session_pool_ttl_secs = session_ttl;

    config.validate().context("Invalid processor settings")?;

    // The secret must decode before it is worth saving.
    barneys_lib::totp::decode_secret(config.default_secret.expose())
        .context("Default secret is not valid Base32")?;

    save(storage_dir, &config)?;

    ui::success("Processor configuration saved");
    print_config(&config);
    if !config.transport.verify_tls {
        ui::warning("TLS certificate verification is disabled");
    }
    Ok(())
}

/// Show the saved settings.
pub fn status(storage_dir: &Path) -> Result<()> {
    ui::header("Processor Status");

    match load(storage_dir)? {
        Some(config) => {
            print_config(&config);
            ui::key_value("Config file", &storage_dir.join(CONFIG_FILE).display().to_string());
        }
        None => {
            ui::info("No processor configured");
            ui::info("Run 'barneys-pay configure --default-secret <SECRET>' to set one up");
        }
    }
    Ok(())
}

fn print_config(config: &ProcessorConfig) {
    ui::key_value("Base URL", &config.base_url);
    ui::key_value("Login", &config.login_url());
    ui::key_value("Transactions", &config.transaction_url());
    ui::key_value("GCash cash-in", &config.gcash_cash_in_url());
    ui::key_value(
        "TOTP",
        &format!(
            "{}s / {} digits / {}",
            config.totp.period,
            config.totp.digits,
            config.totp.algorithm.as_str()
        ),
    );
    ui::key_value("Timeout", &format!("{}ms", config.transport.timeout_ms));
    ui::key_value(
        "Verify TLS",
        if config.transport.verify_tls { "yes" } else { "no" },
    );
    ui::key_value(
        "Session pooling",
        &config
            .session_pool_ttl_secs
            .map(|secs| format!("{}s", secs))
            .unwrap_or_else(|| "off".to_string()),
    );
}
