//! Test utilities for processor flows.
//!
//! - [`MockTransport`] replays scripted responses and records requests
//! - [`RecordingCodeGenerator`] pins the clock and records which secrets
//!   were used
//! - [`fixtures`] holds known secrets, codes and envelopes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barneys_lib::test_utils::{fixtures, MockTransport, RecordingCodeGenerator};
//! use barneys_lib::ProcessorClient;
//!
//! let transport = MockTransport::new();
//! transport.push_json(200, fixtures::login_response("tok1", "SECKEY"));
//!
//! let client = ProcessorClient::with_parts(
//!     fixtures::config("https://processor.test"),
//!     transport,
//!     RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
//! );
//! let session = client.authenticate(&fixtures::credential()).await?;
//! assert_eq!(client.codes().secrets(), vec![fixtures::DEFAULT_SECRET]);
//! ```

pub mod fixtures;
mod mock_transport;

pub use mock_transport::{MockTransport, RecordingCodeGenerator};
