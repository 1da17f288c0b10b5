//! Offline code and envelope tools

use std::path::Path;

use anyhow::{Context, Result};
use barneys_lib::envelope;
use barneys_lib::totp::{self, Clock, SystemClock, TotpParams};
use chrono::{DateTime, Utc};

use crate::ui;

/// Print the code for `secret` (or the configured default secret).
pub fn totp(storage_dir: &Path, secret: Option<&str>, at: Option<u64>) -> Result<()> {
    let (secret, params) = match secret {
        Some(secret) => {
            let params = super::configure::load(storage_dir)?
                .map(|config| config.totp)
                .unwrap_or_default();
            (secret.to_string(), params)
        }
        None => {
            let config = super::load_config(storage_dir)?;
            (config.default_secret.expose().to_string(), config.totp)
        }
    };

    let now = at.unwrap_or_else(|| SystemClock.unix_time());
    let code = totp::generate(&secret, &params, now).context("Failed to generate code")?;

    println!("{}", code.as_str());
    print_window(&params, now);
    Ok(())
}

fn print_window(params: &TotpParams, now: u64) {
    let remaining = params.remaining_secs(now);
    let expires = i64::try_from(now.saturating_add(remaining))
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    match expires {
        Some(expires) => eprintln!(
            "valid for {}s (until {})",
            remaining,
            expires.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => eprintln!("valid for {}s", remaining),
    }
}

/// Print an envelope of `plaintext` under `password`.
pub fn encrypt(password: &str, plaintext: &str) {
    println!("{}", envelope::encrypt(plaintext.as_bytes(), password));
}

/// Print the plaintext of `sealed`.
pub fn decrypt(password: &str, sealed: &str) -> Result<()> {
    match envelope::decrypt_to_string(sealed, password) {
        Ok(plaintext) => {
            println!("{}", plaintext);
            Ok(())
        }
        Err(e) => {
            ui::error("Could not open envelope (wrong password or corrupted data)");
            Err(e.into())
        }
    }
}
