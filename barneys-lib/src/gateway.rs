//! Commerce host integration.
//!
//! The host (a storefront) owns orders, settings persistence and order
//! status bookkeeping. It plugs in through [`CommerceHost`]; the crate
//! answers with a [`PaymentOutcome`] the host can turn into its own
//! checkout response.

use async_trait::async_trait;

use crate::attempt::{PaymentAttempt, Submission};
use crate::client::ProcessorClient;
use crate::config::GatewaySettings;
use crate::protocol::Credential;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::session_cache::SessionCache;
use crate::totp::CodeGenerator;
use crate::transport::Transport;
use crate::{BarneysError, Result};

/// What the gateway needs from the storefront.
#[async_trait]
pub trait CommerceHost: Send + Sync {
    /// Host order handle.
    type Order: Send + Sync;

    /// Order total in pesos.
    async fn order_total(&self, order: &Self::Order) -> Result<f64>;

    /// Mark the order as paid.
    async fn mark_order_paid(&self, order: &Self::Order) -> Result<()>;

    /// Merchant API credential from the gateway settings.
    async fn payment_method_config(&self) -> Result<Credential>;

    /// What to submit to the processor for this order.
    async fn payment_request(&self, order: &Self::Order) -> Result<Submission>;
}

/// Checkout result status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Payment accepted or started.
    Success,
    /// Payment could not be processed.
    Failed,
}

/// Result of [`PaymentGateway::process_payment`].
#[derive(Debug)]
pub struct PaymentOutcome {
    /// Overall status.
    pub status: PaymentStatus,
    /// Where to send the shopper next, if the processor gave a URL.
    pub redirect_url: Option<String>,
    /// Why the payment failed.
    pub failure: Option<BarneysError>,
}

impl PaymentOutcome {
    fn success(redirect_url: Option<String>) -> Self {
        Self {
            status: PaymentStatus::Success,
            redirect_url,
            failure: None,
        }
    }

    fn failed(error: BarneysError) -> Self {
        Self {
            status: PaymentStatus::Failed,
            redirect_url: None,
            failure: Some(error),
        }
    }

    /// Whether the payment succeeded.
    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

/// Payment gateway exposed to the commerce host.
pub struct PaymentGateway<H, T, G> {
    host: H,
    client: ProcessorClient<T, G>,
    settings: GatewaySettings,
    cache: Option<SessionCache>,
    retry: RetryPolicy,
}

impl<H, T, G> PaymentGateway<H, T, G>
where
    H: CommerceHost,
    T: Transport,
    G: CodeGenerator,
{
    /// Gateway with default settings, no retries and pooling as configured
    /// on the client.
    pub fn new(host: H, client: ProcessorClient<T, G>) -> Self {
        let cache = SessionCache::from_config(client.config());
        Self {
            host,
            client,
            settings: GatewaySettings::default(),
            cache,
            retry: RetryPolicy::none(),
        }
    }

    /// Use custom shopper-facing texts.
    pub fn with_settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Retry transient failures with `policy`.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// The commerce host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The processor client.
    pub fn client(&self) -> &ProcessorClient<T, G> {
        &self.client
    }

    /// Shopper-facing texts.
    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Take payment for `order`.
    ///
    /// Orders with a zero total are marked paid without contacting the
    /// processor. Otherwise one payment attempt runs (repeated per the retry
    /// policy) and a cash-in's redirect URL is returned to the host. Order
    /// status after a processor payment is left to the host.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn process_payment(&self, order: &H::Order) -> PaymentOutcome {
        match self.try_process(order).await {
            Ok(redirect_url) => PaymentOutcome::success(redirect_url),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, code = ?e.code(), "payment failed");
                PaymentOutcome::failed(e)
            }
        }
    }

    async fn try_process(&self, order: &H::Order) -> Result<Option<String>> {
        let total = self.host.order_total(order).await?;
        if !total.is_finite() {
            return Err(BarneysError::Host(format!("invalid order total {}", total)));
        }
        if total <= 0.0 {
            #[cfg(feature = "tracing")]
            tracing::info!("zero-total order, marking paid");
            self.host.mark_order_paid(order).await?;
            return Ok(None);
        }

        let credential = self.host.payment_method_config().await?;
        let submission = self.host.payment_request(order).await?;

        let client = &self.client;
        let cache = self.cache.as_ref();
        let credential = &credential;
        let outcome = retry_with_backoff(&self.retry, || {
            let submission = submission.clone();
            async move {
                PaymentAttempt::new()
                    .run(client, credential, submission, cache)
                    .await
            }
        })
        .await?;

        Ok(outcome.redirect_url().map(str::to_string))
    }

    /// Instructions for the order-received page, as HTML paragraphs.
    ///
    /// Empty when no instructions are configured.
    pub fn render_thank_you_instructions(&self) -> String {
        render_paragraphs(&self.settings.instructions)
    }

    /// Instructions for the customer's order email.
    ///
    /// `None` for emails sent to the shop admin or when no instructions are
    /// configured.
    pub fn email_instructions(&self, sent_to_admin: bool, plain_text: bool) -> Option<String> {
        let instructions = self.settings.instructions.trim();
        if sent_to_admin || instructions.is_empty() {
            return None;
        }
        if plain_text {
            Some(format!("{}\n", instructions))
        } else {
            Some(format!("{}\n", render_paragraphs(instructions)))
        }
    }
}

/// Escape `text` and wrap blank-line separated blocks in `<p>` tags.
fn render_paragraphs(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            let lines: Vec<String> = block.lines().map(|l| escape_html(l.trim())).collect();
            format!("<p>{}</p>", lines.join("<br />\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;

    use super::*;
    use crate::test_utils::{fixtures, MockTransport, RecordingCodeGenerator};
    use crate::transport::TransportError;

    struct Order {
        id: u32,
        total: f64,
    }

    #[derive(Default)]
    struct Shop {
        paid: RwLock<Vec<u32>>,
        gcash: bool,
    }

    #[async_trait]
    impl CommerceHost for Shop {
        type Order = Order;

        async fn order_total(&self, order: &Order) -> Result<f64> {
            Ok(order.total)
        }

        async fn mark_order_paid(&self, order: &Order) -> Result<()> {
            self.paid.write().unwrap().push(order.id);
            Ok(())
        }

        async fn payment_method_config(&self) -> Result<Credential> {
            Ok(fixtures::credential())
        }

        async fn payment_request(&self, order: &Order) -> Result<Submission> {
            if self.gcash {
                Ok(Submission::GcashCashIn(vec![fixtures::cash_in_detail(order.total)]))
            } else {
                Ok(Submission::transaction(format!("ORDER-{}", order.id)))
            }
        }
    }

    fn gateway(
        shop: Shop,
        transport: MockTransport,
    ) -> PaymentGateway<Shop, MockTransport, RecordingCodeGenerator> {
        let client = ProcessorClient::with_parts(
            fixtures::config("https://processor.test"),
            transport,
            RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
        );
        PaymentGateway::new(shop, client)
    }

    fn wallet_login() -> serde_json::Value {
        serde_json::json!({"data": {
            "accessToken": "tok1",
            "secretKey": "SECKEY",
            "personCode": "P1",
            "walletCode": "W1"
        }})
    }

    #[tokio::test]
    async fn test_zero_total_is_marked_paid_offline() {
        let gateway = gateway(Shop::default(), MockTransport::new());
        let outcome = gateway.process_payment(&Order { id: 7, total: 0.0 }).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.redirect_url, None);
        assert_eq!(*gateway.host().paid.read().unwrap(), vec![7]);
        assert!(gateway.client().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_gcash_returns_redirect() {
        let transport = MockTransport::new();
        transport.push_json(200, wallet_login());
        transport.push_json(200, serde_json::json!({"data": {"url": "https://pay.test/r/9"}}));
        let shop = Shop {
            gcash: true,
            ..Shop::default()
        };
        let gateway = gateway(shop, transport);

        let outcome = gateway.process_payment(&Order { id: 9, total: 150.0 }).await;
        assert_eq!(outcome.status, PaymentStatus::Success);
        assert_eq!(outcome.redirect_url.as_deref(), Some("https://pay.test/r/9"));
        assert!(gateway.host().paid.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_processor_failure_is_reported() {
        let transport = MockTransport::new();
        transport.push_response(503, "maintenance");
        let gateway = gateway(Shop::default(), transport);

        let outcome = gateway.process_payment(&Order { id: 1, total: 10.0 }).await;
        assert_eq!(outcome.status, PaymentStatus::Failed);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.remote_status(), Some(503));
        assert!(matches!(failure, BarneysError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_retry_runs_fresh_attempt() {
        let transport = MockTransport::new();
        transport.push_error(TransportError::Timeout {
            target: "https://processor.test".into(),
            timeout_ms: 1,
        });
        transport.push_json(200, fixtures::login_response("tok1", "SECKEY"));
        transport.push_json(200, serde_json::json!({"data": {"status": "ok"}}));
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(1),
            backoff_multiplier: 1.0,
        };
        let gateway = gateway(Shop::default(), transport).with_retry(policy);

        let outcome = gateway.process_payment(&Order { id: 2, total: 5.0 }).await;
        assert!(outcome.is_success());
        assert_eq!(gateway.client().transport().requests().len(), 3);
    }

    fn quick_retries() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(1),
            backoff_multiplier: 1.0,
        }
    }

    fn cash_in_posts(gateway: &PaymentGateway<Shop, MockTransport, RecordingCodeGenerator>) -> usize {
        gateway
            .client()
            .transport()
            .requests()
            .iter()
            .filter(|r| r.url.ends_with("/cash-in/gcash"))
            .count()
    }

    #[tokio::test]
    async fn test_cash_in_timeout_is_not_resent() {
        let transport = MockTransport::new();
        transport.push_json(200, wallet_login());
        transport.push_error(TransportError::Timeout {
            target: "https://processor.test/api/v1/transactions/external/funds/cash-in/gcash".into(),
            timeout_ms: 1,
        });
        transport.push_json(200, wallet_login());
        transport.push_json(200, serde_json::json!({"data": {"url": "https://pay.test/r/3"}}));
        let shop = Shop {
            gcash: true,
            ..Shop::default()
        };
        let gateway = gateway(shop, transport).with_retry(quick_retries());

        let outcome = gateway.process_payment(&Order { id: 3, total: 20.0 }).await;
        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert!(matches!(
            outcome.failure,
            Some(BarneysError::Submit {
                cause: crate::errors::Cause::Transport(TransportError::Timeout { .. }),
                ..
            })
        ));
        assert_eq!(cash_in_posts(&gateway), 1);
        assert_eq!(gateway.client().transport().pending(), 2);
    }

    #[tokio::test]
    async fn test_cash_in_retried_when_connection_failed() {
        let transport = MockTransport::new();
        transport.push_json(200, wallet_login());
        transport.push_error(TransportError::Connect {
            target: "https://processor.test".into(),
            reason: "connection refused".into(),
        });
        transport.push_json(200, wallet_login());
        transport.push_json(200, serde_json::json!({"data": {"url": "https://pay.test/r/4"}}));
        let shop = Shop {
            gcash: true,
            ..Shop::default()
        };
        let gateway = gateway(shop, transport).with_retry(quick_retries());

        let outcome = gateway.process_payment(&Order { id: 4, total: 20.0 }).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.redirect_url.as_deref(), Some("https://pay.test/r/4"));
        assert_eq!(cash_in_posts(&gateway), 2);
    }

    #[tokio::test]
    async fn test_non_finite_total_is_rejected() {
        let gateway = gateway(Shop::default(), MockTransport::new());

        for total in [f64::NAN, f64::INFINITY] {
            let outcome = gateway.process_payment(&Order { id: 5, total }).await;
            assert!(matches!(outcome.failure, Some(BarneysError::Host(_))));
        }
        assert!(gateway.host().paid.read().unwrap().is_empty());
        assert!(gateway.client().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_host_error_is_reported() {
        struct Broken;

        #[async_trait]
        impl CommerceHost for Broken {
            type Order = ();

            async fn order_total(&self, _: &()) -> Result<f64> {
                Err(BarneysError::Host("order not found".into()))
            }

            async fn mark_order_paid(&self, _: &()) -> Result<()> {
                Ok(())
            }

            async fn payment_method_config(&self) -> Result<Credential> {
                Ok(fixtures::credential())
            }

            async fn payment_request(&self, _: &()) -> Result<Submission> {
                Ok(Submission::transaction("R1"))
            }
        }

        let client = ProcessorClient::with_parts(
            fixtures::config("https://processor.test"),
            MockTransport::new(),
            RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
        );
        let outcome = PaymentGateway::new(Broken, client).process_payment(&()).await;
        assert!(matches!(outcome.failure, Some(BarneysError::Host(_))));
    }

    #[tokio::test]
    async fn test_pooling_from_config() {
        let transport = MockTransport::new();
        transport.push_json(200, fixtures::login_response("tok1", "SECKEY"));
        transport.push_json(200, serde_json::json!({"data": {"status": "ok"}}));
        transport.push_json(200, serde_json::json!({"data": {"status": "ok"}}));
        let client = ProcessorClient::with_parts(
            fixtures::config("https://processor.test").with_session_pool_ttl(600),
            transport,
            RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
        );
        let gateway = PaymentGateway::new(Shop::default(), client);

        for id in 0..2 {
            assert!(gateway.process_payment(&Order { id, total: 1.0 }).await.is_success());
        }
        assert_eq!(
            gateway.client().codes().secrets(),
            vec![fixtures::DEFAULT_SECRET, "SECKEY", "SECKEY"]
        );
    }

    #[test]
    fn test_thank_you_instructions() {
        let gateway = gateway(Shop::default(), MockTransport::new());
        assert_eq!(gateway.render_thank_you_instructions(), "<p>Pay with E-wallet.</p>");

        let gateway = gateway.with_settings(GatewaySettings {
            instructions: "Scan the QR code.\nKeep your receipt.\n\nQuestions? Email <help@shop.ph>".into(),
            ..GatewaySettings::default()
        });
        assert_eq!(
            gateway.render_thank_you_instructions(),
            "<p>Scan the QR code.<br />\nKeep your receipt.</p>\n<p>Questions? Email &lt;help@shop.ph&gt;</p>"
        );
    }

    #[test]
    fn test_email_instructions() {
        let gateway = gateway(Shop::default(), MockTransport::new());
        assert_eq!(gateway.email_instructions(true, false), None);
        assert_eq!(
            gateway.email_instructions(false, true).as_deref(),
            Some("Pay with E-wallet.\n")
        );
        assert_eq!(
            gateway.email_instructions(false, false).as_deref(),
            Some("<p>Pay with E-wallet.</p>\n")
        );

        let gateway = gateway.with_settings(GatewaySettings {
            instructions: String::new(),
            ..GatewaySettings::default()
        });
        assert_eq!(gateway.render_thank_you_instructions(), "");
        assert_eq!(gateway.email_instructions(false, false), None);
    }
}
