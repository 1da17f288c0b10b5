//! Time-based one-time codes.
//!
//! The processor keys every encrypted payload with a TOTP code derived from
//! a Base32 shared secret. Login payloads use the merchant's default secret;
//! everything after login uses the rotating secret returned by the login
//! call.
//!
//! # Parameters
//!
//! The processor validates codes with a 43200 second (12 hour) period,
//! HMAC-SHA1 and 6 digits. That period is far longer than the usual 30
//! seconds but it is what the server accepts, so [`TotpParams::default`]
//! keeps it.
//!
//! # Example
//!
//! ```
//! use barneys_lib::totp::{generate, TotpParams};
//!
//! let params = TotpParams::default();
//! let code = generate("ZJGAXJIPORDSMGQE", &params, 0).unwrap();
//! assert_eq!(code.as_str(), "259150");
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::Specification;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};

/// Processor period in seconds.
pub const PROCESSOR_PERIOD_SECS: u64 = 43_200;

/// Processor code length.
pub const PROCESSOR_DIGITS: u32 = 6;

const BASE32_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors produced while generating a code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TotpError {
    #[error("invalid TOTP secret: {0}")]
    InvalidSecret(String),
    #[error("invalid TOTP parameters: {0}")]
    InvalidParameters(String),
}

/// HMAC digest used for the one-time code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// HMAC-SHA1 (processor default).
    #[default]
    Sha1,
    /// HMAC-SHA256.
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl HashAlgorithm {
    /// Name as used in `otpauth://` URIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    fn mac(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, TotpError> {
        fn run<M: Mac + hmac::digest::KeyInit>(
            key: &[u8],
            message: &[u8],
        ) -> Result<Vec<u8>, TotpError> {
            let mut mac = <M as Mac>::new_from_slice(key)
                .map_err(|e| TotpError::InvalidSecret(e.to_string()))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        match self {
            Self::Sha1 => run::<Hmac<sha1::Sha1>>(key, message),
            Self::Sha256 => run::<Hmac<sha2::Sha256>>(key, message),
            Self::Sha512 => run::<Hmac<sha2::Sha512>>(key, message),
        }
    }
}

/// Code generation parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpParams {
    /// Time step in seconds.
    #[serde(default = "default_period")]
    pub period: u64,
    /// Number of decimal digits in the code.
    #[serde(default = "default_digits")]
    pub digits: u32,
    /// HMAC digest.
    #[serde(default)]
    pub algorithm: HashAlgorithm,
}

fn default_period() -> u64 {
    PROCESSOR_PERIOD_SECS
}

fn default_digits() -> u32 {
    PROCESSOR_DIGITS
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            period: default_period(),
            digits: default_digits(),
            algorithm: HashAlgorithm::default(),
        }
    }
}

impl TotpParams {
    /// Create parameters with an explicit period, digit count and digest.
    pub fn new(period: u64, digits: u32, algorithm: HashAlgorithm) -> Self {
        Self {
            period,
            digits,
            algorithm,
        }
    }

    /// Check the parameters can produce a code.
    pub fn validate(&self) -> Result<(), TotpError> {
        if self.period == 0 {
            return Err(TotpError::InvalidParameters(
                "period must be greater than zero".to_string(),
            ));
        }
        if !(1..=10).contains(&self.digits) {
            return Err(TotpError::InvalidParameters(format!(
                "digits must be between 1 and 10, got {}",
                self.digits
            )));
        }
        Ok(())
    }

    /// Counter (time step index) for a unix timestamp.
    pub fn counter_at(&self, unix_time: u64) -> u64 {
        unix_time / self.period
    }

    /// Seconds left in the window containing `unix_time`.
    pub fn remaining_secs(&self, unix_time: u64) -> u64 {
        self.period - unix_time % self.period
    }
}

/// A generated one-time code.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpCode(String);

impl TotpCode {
    /// The code as a string; this is the envelope password.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TotpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TotpCode(******)")
    }
}

impl AsRef<str> for TotpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of the current unix time.
pub trait Clock: Send + Sync {
    /// Seconds since the unix epoch.
    fn unix_time(&self) -> u64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Clock pinned to a fixed timestamp.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_time(&self) -> u64 {
        self.0
    }
}

/// Anything that turns a shared secret into the current code.
///
/// The processor client only sees this trait, which lets tests observe the
/// exact sequence of secrets a flow uses.
pub trait CodeGenerator: Send + Sync {
    /// Generate the current code for `secret`.
    fn generate(&self, secret: &str) -> Result<TotpCode, TotpError>;
}

/// TOTP generator bound to a parameter set and a clock.
#[derive(Clone, Debug)]
pub struct Totp<C = SystemClock> {
    params: TotpParams,
    clock: C,
}

impl Totp<SystemClock> {
    /// Generator using the wall clock.
    pub fn new(params: TotpParams) -> Self {
        Self::with_clock(params, SystemClock)
    }
}

impl<C: Clock> Totp<C> {
    /// Generator using a custom clock.
    pub fn with_clock(params: TotpParams, clock: C) -> Self {
        Self { params, clock }
    }

    /// The parameters in use.
    pub fn params(&self) -> &TotpParams {
        &self.params
    }

    /// Current unix time according to the clock.
    pub fn now(&self) -> u64 {
        self.clock.unix_time()
    }
}

impl<C: Clock> CodeGenerator for Totp<C> {
    fn generate(&self, secret: &str) -> Result<TotpCode, TotpError> {
        generate(secret, &self.params, self.clock.unix_time())
    }
}

/// Generate the code for `secret` at `unix_time`.
pub fn generate(secret: &str, params: &TotpParams, unix_time: u64) -> Result<TotpCode, TotpError> {
    params.validate()?;
    let key = decode_secret(secret)?;
    hotp(&key, params.counter_at(unix_time), params)
}

/// RFC 4226 HOTP with dynamic truncation.
fn hotp(key: &[u8], counter: u64, params: &TotpParams) -> Result<TotpCode, TotpError> {
    let digest = params.algorithm.mac(key, &counter.to_be_bytes())?;

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    let modulus = 10u64.pow(params.digits);
    let value = u64::from(binary) % modulus;

    Ok(TotpCode(format!(
        "{:0width$}",
        value,
        width = params.digits as usize
    )))
}

/// Decode a Base32 secret the way authenticator apps do.
///
/// Case-insensitive; whitespace, dashes and `=` padding are ignored, and a
/// trailing group that does not fill a whole byte is dropped.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let mut normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // Unpadded Base32 only has whole-byte groups at these lengths mod 8.
    let keep = match normalized.len() % 8 {
        1 => normalized.len() - 1,
        3 => normalized.len() - 1,
        6 => normalized.len() - 1,
        _ => normalized.len(),
    };
    normalized.truncate(keep);

    if normalized.is_empty() {
        return Err(TotpError::InvalidSecret("secret is empty".to_string()));
    }

    let mut spec = Specification::new();
    spec.symbols.push_str(BASE32_SYMBOLS);
    spec.check_trailing_bits = false;
    let encoding = spec
        .encoding()
        .map_err(|e| TotpError::InvalidSecret(e.to_string()))?;

    let key = encoding
        .decode(normalized.as_bytes())
        .map_err(|e| TotpError::InvalidSecret(e.to_string()))?;

    if key.is_empty() {
        return Err(TotpError::InvalidSecret("secret decodes to no bytes".to_string()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // "12345678901234567890" in Base32 (RFC 6238 appendix B seed).
    const RFC_SEED: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn rfc_params(algorithm: HashAlgorithm) -> TotpParams {
        TotpParams::new(30, 8, algorithm)
    }

    #[test]
    fn test_rfc6238_sha1_vectors() {
        let params = rfc_params(HashAlgorithm::Sha1);
        let cases = [
            (59, "94287082"),
            (1_111_111_109, "07081804"),
            (1_111_111_111, "14050471"),
            (1_234_567_890, "89005924"),
            (2_000_000_000, "69279037"),
        ];
        for (time, expected) in cases {
            assert_eq!(generate(RFC_SEED, &params, time).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_rfc6238_sha2_vectors() {
        // 32 and 64 byte seeds from the RFC, Base32 encoded.
        let seed_256 = data_encoding::BASE32.encode(b"12345678901234567890123456789012");
        let seed_512 = data_encoding::BASE32.encode(
            b"1234567890123456789012345678901234567890123456789012345678901234",
        );

        let code = generate(&seed_256, &rfc_params(HashAlgorithm::Sha256), 59).unwrap();
        assert_eq!(code.as_str(), "46119246");

        let code = generate(&seed_512, &rfc_params(HashAlgorithm::Sha512), 59).unwrap();
        assert_eq!(code.as_str(), "90693936");
    }

    #[test]
    fn test_six_digit_truncation() {
        let params = TotpParams::new(30, 6, HashAlgorithm::Sha1);
        assert_eq!(generate(RFC_SEED, &params, 59).unwrap().as_str(), "287082");
        // Leading zero must be kept.
        assert_eq!(
            generate(RFC_SEED, &params, 1_234_567_890).unwrap().as_str(),
            "005924"
        );
    }

    #[test]
    fn test_processor_window_is_stable() {
        let params = TotpParams::default();
        let first = generate("ZJGAXJIPORDSMGQE", &params, 0).unwrap();
        let last = generate("ZJGAXJIPORDSMGQE", &params, 43_199).unwrap();
        assert_eq!(first, last);
        assert_eq!(first.as_str(), "259150");
    }

    #[test]
    fn test_processor_window_boundary_changes_code() {
        let params = TotpParams::default();
        let before = generate("ZJGAXJIPORDSMGQE", &params, 1_717_675_199).unwrap();
        let after = generate("ZJGAXJIPORDSMGQE", &params, 1_717_675_200).unwrap();
        assert_eq!(before.as_str(), "455742");
        assert_eq!(after.as_str(), "360120");
    }

    #[test]
    fn test_secret_normalization() {
        let params = TotpParams::default();
        let canonical = generate("ZJGAXJIPORDSMGQE", &params, 100).unwrap();
        let lower = generate("zjga xjip ords mgqe", &params, 100).unwrap();
        let padded = generate("ZJGAXJIPORDSMGQE====", &params, 100).unwrap();
        assert_eq!(canonical, lower);
        assert_eq!(canonical, padded);
    }

    #[test]
    fn test_short_secret_drops_partial_bits() {
        // 6 symbols carry 30 bits: three whole bytes, same as the first 5.
        assert_eq!(decode_secret("SECKEY").unwrap(), decode_secret("SECKE").unwrap());
        assert_eq!(decode_secret("SECKEY").unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_secret() {
        let params = TotpParams::default();
        assert!(matches!(
            generate("not-base32!", &params, 0),
            Err(TotpError::InvalidSecret(_))
        ));
        assert!(matches!(
            generate("", &params, 0),
            Err(TotpError::InvalidSecret(_))
        ));
        assert!(matches!(
            generate("A", &params, 0),
            Err(TotpError::InvalidSecret(_))
        ));
        assert!(matches!(
            generate("ABC1", &params, 0),
            Err(TotpError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let zero_period = TotpParams::new(0, 6, HashAlgorithm::Sha1);
        assert!(matches!(
            generate(RFC_SEED, &zero_period, 0),
            Err(TotpError::InvalidParameters(_))
        ));

        let too_many_digits = TotpParams::new(30, 11, HashAlgorithm::Sha1);
        assert!(matches!(
            generate(RFC_SEED, &too_many_digits, 0),
            Err(TotpError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_generator_uses_clock() {
        let totp = Totp::with_clock(TotpParams::default(), FixedClock(43_200));
        assert_eq!(totp.now(), 43_200);
        let code = totp.generate("ZJGAXJIPORDSMGQE").unwrap();
        assert_eq!(code.as_str(), "203003");
    }

    #[test]
    fn test_remaining_secs() {
        let params = TotpParams::default();
        assert_eq!(params.remaining_secs(0), 43_200);
        assert_eq!(params.remaining_secs(43_199), 1);
        assert_eq!(params.counter_at(86_400), 2);
    }

    #[test]
    fn test_code_debug_is_redacted() {
        let code = generate(RFC_SEED, &TotpParams::default(), 0).unwrap();
        assert!(!format!("{:?}", code).contains(code.as_str()));
    }
}
