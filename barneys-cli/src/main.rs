//! Barneys Pay CLI
//!
//! Command-line interface for configuring and exercising the Barneys
//! payment-processor client.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "barneys-pay")]
#[command(about = "Barneys Pay CLI - Talk to the Barneys e-wallet payment processor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory
    #[arg(long, global = true, env = "BARNEYS_PAY_DIR")]
    storage_dir: Option<String>,

    /// Skip TLS certificate verification for this run (SIT only)
    #[arg(long, global = true)]
    insecure: bool,

    /// Retry transient failures this many times
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,
}

/// Merchant API credential.
#[derive(Args, Debug)]
struct CredentialArgs {
    /// API username
    #[arg(long, env = "BARNEYS_API_USERNAME")]
    username: String,

    /// API key
    #[arg(long, env = "BARNEYS_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Application identifier
    #[arg(long, default_value_t = 1)]
    application_id: u32,
}

impl CredentialArgs {
    fn credential(&self) -> barneys_lib::Credential {
        barneys_lib::Credential::new(&self.username, &self.api_key)
            .with_application_id(self.application_id)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Save processor settings to the storage directory
    Configure {
        /// Processor base URL
        #[arg(long, default_value = barneys_lib::config::SIT_BASE_URL)]
        url: String,

        /// Base32 default secret
        #[arg(long, env = "BARNEYS_DEFAULT_SECRET", hide_env_values = true)]
        default_secret: String,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Disable TLS certificate verification
        #[arg(long)]
        no_verify_tls: bool,

        /// Reuse sessions for this many seconds
        #[arg(long)]
        session_ttl: Option<u64>,
    },

    /// Show the saved processor settings
    Status,

    /// Generate a one-time code
    Totp {
        /// Base32 secret (defaults to the configured default secret)
        #[arg(long)]
        secret: Option<String>,

        /// Unix time to generate the code for (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Encrypt a payload into an envelope
    Encrypt {
        /// Envelope password (usually a one-time code)
        #[arg(short, long)]
        password: String,

        /// Plaintext to encrypt
        plaintext: String,
    },

    /// Decrypt an envelope
    Decrypt {
        /// Envelope password
        #[arg(short, long)]
        password: String,

        /// Base64 envelope
        envelope: String,
    },

    /// Log in and show the session
    Login {
        #[command(flatten)]
        credential: CredentialArgs,
    },

    /// Look up a transaction by reference number
    Transaction {
        #[command(flatten)]
        credential: CredentialArgs,

        /// Processor reference number
        #[arg(short, long)]
        reference: String,
    },

    /// Start a GCash cash-in
    CashIn {
        #[command(flatten)]
        credential: CredentialArgs,

        /// JSON file with an array of transaction details
        #[arg(short, long)]
        details: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("barneys_cli=debug,barneys_lib=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("barneys_cli=info,barneys_lib=warn")
            .init();
    }

    // Setup storage directory
    let storage_dir = if let Some(dir) = cli.storage_dir {
        std::path::PathBuf::from(dir)
    } else {
        dirs::data_local_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("barneys-pay")
    };

    let options = commands::RunOptions {
        insecure: cli.insecure,
        retries: cli.retries,
        verbose: cli.verbose,
    };

    // Dispatch commands
    match cli.command {
        Commands::Configure {
            url,
            default_secret,
            timeout_ms,
            no_verify_tls,
            session_ttl,
        } => {
            commands::configure::run(
                &storage_dir,
                &url,
                &default_secret,
                timeout_ms,
                !no_verify_tls,
                session_ttl,
            )?;
        }
        Commands::Status => {
            commands::configure::status(&storage_dir)?;
        }
        Commands::Totp { secret, at } => {
            commands::codes::totp(&storage_dir, secret.as_deref(), at)?;
        }
        Commands::Encrypt {
            password,
            plaintext,
        } => {
            commands::codes::encrypt(&password, &plaintext);
        }
        Commands::Decrypt { password, envelope } => {
            commands::codes::decrypt(&password, &envelope)?;
        }
        Commands::Login { credential } => {
            commands::session::login(&storage_dir, &credential.credential(), &options).await?;
        }
        Commands::Transaction {
            credential,
            reference,
        } => {
            commands::session::transaction(
                &storage_dir,
                &credential.credential(),
                &reference,
                &options,
            )
            .await?;
        }
        Commands::CashIn {
            credential,
            details,
        } => {
            commands::session::cash_in(&storage_dir, &credential.credential(), &details, &options)
                .await?;
        }
    }

    Ok(())
}
