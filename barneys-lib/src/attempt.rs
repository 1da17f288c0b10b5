//! Payment attempt lifecycle.
//!
//! One attempt is one login followed by one submission, strictly in order:
//!
//! ```text
//! Start -> Authenticating -> Authenticated -> Submitting -> Completed
//!               |                                 |
//!               +-------------> Failed <----------+
//! ```
//!
//! `Completed` and `Failed` are terminal. Any other transition is rejected
//! with [`BarneysError::InvalidState`].

use crate::auth::Session;
use crate::client::ProcessorClient;
use crate::protocol::{CashInDetail, CashInResult, Credential, TransactionRequest, TransactionResult};
use crate::session_cache::SessionCache;
use crate::totp::CodeGenerator;
use crate::transport::Transport;
use crate::{BarneysError, Result};

/// Where a payment attempt is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptState {
    /// Nothing sent yet.
    Start,
    /// Login in flight.
    Authenticating,
    /// Session obtained.
    Authenticated,
    /// Submission in flight.
    Submitting,
    /// Submission accepted.
    Completed,
    /// Login or submission failed.
    Failed,
}

impl AttemptState {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Start, Authenticating)
                | (Authenticating, Authenticated)
                | (Authenticating, Failed)
                | (Authenticated, Submitting)
                | (Submitting, Completed)
                | (Submitting, Failed)
        )
    }
}

/// What to send once logged in.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    /// Look up a transaction by reference number.
    TransactionDetails {
        /// Processor reference number
        reference_number: String,
    },
    /// Start a GCash cash-in.
    GcashCashIn(Vec<CashInDetail>),
}

impl Submission {
    /// Transaction details lookup.
    pub fn transaction(reference_number: impl Into<String>) -> Self {
        Self::TransactionDetails {
            reference_number: reference_number.into(),
        }
    }
}

/// Result of a completed submission.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    /// Transaction details.
    Transaction(TransactionResult),
    /// Cash-in started.
    CashIn(CashInResult),
}

impl SubmissionOutcome {
    /// Payer redirect, for cash-ins.
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::CashIn(result) => Some(&result.url),
            Self::Transaction(_) => None,
        }
    }
}

/// A single login-then-submit flow.
#[derive(Clone, Debug)]
pub struct PaymentAttempt {
    state: AttemptState,
    history: Vec<AttemptState>,
}

impl Default for PaymentAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentAttempt {
    /// Fresh attempt in [`AttemptState::Start`].
    pub fn new() -> Self {
        Self {
            state: AttemptState::Start,
            history: vec![AttemptState::Start],
        }
    }

    /// Current state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[AttemptState] {
        &self.history
    }

    /// Move to `next`.
    pub fn transition(&mut self, next: AttemptState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BarneysError::InvalidState {
                from: self.state,
                to: next,
            });
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(from = ?self.state, to = ?next, "payment attempt transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Log in (or reuse a cached session) and send `submission`.
    ///
    /// With a cache, a fresh session is stored after login and a submission
    /// rejected with HTTP 401 or 403 evicts it.
    pub async fn run<T, G>(
        &mut self,
        client: &ProcessorClient<T, G>,
        credential: &Credential,
        submission: Submission,
        cache: Option<&SessionCache>,
    ) -> Result<SubmissionOutcome>
    where
        T: Transport,
        G: CodeGenerator,
    {
        self.transition(AttemptState::Authenticating)?;

        let session = match self.session(client, credential, cache).await {
            Ok(session) => session,
            Err(e) => {
                self.transition(AttemptState::Failed)?;
                return Err(e);
            }
        };

        self.transition(AttemptState::Authenticated)?;
        self.transition(AttemptState::Submitting)?;

        match send(client, &session, submission).await {
            Ok(outcome) => {
                self.transition(AttemptState::Completed)?;
                Ok(outcome)
            }
            Err(e) => {
                if let Some(cache) = cache {
                    if matches!(e.remote_status(), Some(401) | Some(403)) {
                        cache.invalidate(credential);
                    }
                }
                self.transition(AttemptState::Failed)?;
                Err(e)
            }
        }
    }

    async fn session<T, G>(
        &self,
        client: &ProcessorClient<T, G>,
        credential: &Credential,
        cache: Option<&SessionCache>,
    ) -> Result<Session>
    where
        T: Transport,
        G: CodeGenerator,
    {
        if let Some(session) = cache.and_then(|c| c.get(credential)) {
            return Ok(session);
        }
        let session = client.authenticate(credential).await?;
        if let Some(cache) = cache {
            cache.insert(credential, session.clone());
        }
        Ok(session)
    }
}

async fn send<T, G>(
    client: &ProcessorClient<T, G>,
    session: &Session,
    submission: Submission,
) -> Result<SubmissionOutcome>
where
    T: Transport,
    G: CodeGenerator,
{
    match submission {
        Submission::TransactionDetails { reference_number } => client
            .submit(session, &TransactionRequest::new(reference_number))
            .await
            .map(SubmissionOutcome::Transaction),
        Submission::GcashCashIn(details) => client
            .cash_in_gcash(session, details)
            .await
            .map(SubmissionOutcome::CashIn),
    }
}
