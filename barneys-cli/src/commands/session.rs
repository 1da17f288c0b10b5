//! Commands that talk to the processor

use std::path::Path;

use anyhow::{Context, Result};
use barneys_lib::{
    retry_with_backoff, CashInDetail, Credential, PaymentAttempt, Session, SessionCache,
    Submission, SubmissionOutcome,
};

use super::{build_client, RunOptions};
use crate::ui;

/// Log in and print the session.
pub async fn login(storage_dir: &Path, credential: &Credential, options: &RunOptions) -> Result<()> {
    ui::header("Processor Login");

    let client = build_client(storage_dir, options)?;
    ui::info(&format!("Logging in as {} at {}", credential.username, client.config().base_url));

    let session = retry_with_backoff(&options.retry_policy(), || client.authenticate(credential))
        .await
        .context("Login failed")?;

    ui::success("Logged in");
    print_session(&session, options.verbose);
    Ok(())
}

/// Look up `reference` and print the processor's answer.
pub async fn transaction(
    storage_dir: &Path,
    credential: &Credential,
    reference: &str,
    options: &RunOptions,
) -> Result<()> {
    ui::header("Transaction Details");
    let outcome = run_attempt(storage_dir, credential, Submission::transaction(reference), options)
        .await
        .context("Transaction lookup failed")?;

    if let SubmissionOutcome::Transaction(result) = outcome {
        ui::success("Transaction found");
        ui::key_value("Reference", reference);
        ui::key_value("Status", result.status.as_deref().unwrap_or("unknown"));
        ui::separator();
        ui::json(&serde_json::to_value(&result)?);
    }
    Ok(())
}

/// Start a GCash cash-in from a JSON file of transaction details.
pub async fn cash_in(
    storage_dir: &Path,
    credential: &Credential,
    details_path: &str,
    options: &RunOptions,
) -> Result<()> {
    ui::header("GCash Cash-In");

    let contents = std::fs::read_to_string(details_path)
        .with_context(|| format!("Failed to read {}", details_path))?;
    let details: Vec<CashInDetail> =
        serde_json::from_str(&contents).context("Failed to parse transaction details")?;
    if details.is_empty() {
        anyhow::bail!("{} contains no transaction details", details_path);
    }

    let total: f64 = details.iter().map(|d| d.amount).sum();
    ui::info(&format!("{} line(s), total {:.2}", details.len(), total));

    let outcome = run_attempt(storage_dir, credential, Submission::GcashCashIn(details), options)
        .await
        .context("Cash-in failed")?;

    if let Some(url) = outcome.redirect_url() {
        ui::success("Cash-in started");
        ui::key_value("Pay at", url);
    }
    Ok(())
}

async fn run_attempt(
    storage_dir: &Path,
    credential: &Credential,
    submission: Submission,
    options: &RunOptions,
) -> Result<SubmissionOutcome> {
    let client = build_client(storage_dir, options)?;
    let cache = SessionCache::from_config(client.config());
    let client = &client;
    let cache = cache.as_ref();

    let outcome = retry_with_backoff(&options.retry_policy(), || {
        let submission = submission.clone();
        async move {
            let mut attempt = PaymentAttempt::new();
            let result = attempt.run(client, credential, submission, cache).await;
            tracing::debug!(history = ?attempt.history(), "payment attempt finished");
            result
        }
    })
    .await?;
    Ok(outcome)
}

fn print_session(session: &Session, verbose: bool) {
    let token = session.access_token();
    let shown = if verbose {
        token.to_string()
    } else {
        ui::mask(token)
    };
    ui::key_value("Access token", &shown);
    ui::key_value("Session secret", "(hidden)");
    if let Some(person) = session.person_code() {
        ui::key_value("Person code", person);
    }
    if let Some(wallet) = session.wallet_code() {
        ui::key_value("Wallet code", wallet);
    }
    ui::key_value(
        "Obtained at",
        &chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
}
