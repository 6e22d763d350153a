//! Inbound Vapi webhook signature verification.
//!
//! With a shared secret the signed payload is the raw `x-vapi-timestamp`
//! value followed by the raw body, HMAC-SHA256, hex encoded. The header may
//! carry a `sha256=` prefix. Without a secret only header presence is
//! checked.

use std::time::Duration;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::SignatureError;

pub const SIGNATURE_HEADER: &str = "x-vapi-signature";
pub const TIMESTAMP_HEADER: &str = "x-vapi-timestamp";

type HmacSha256 = Hmac<Sha256>;

/// Timestamps above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: Option<SecretString>,
    tolerance: Duration,
}

impl SignatureVerifier {
    pub fn new(secret: Option<SecretString>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Header-presence checking only.
    pub fn presence_only() -> Self {
        Self::new(None, Duration::from_secs(300))
    }

    pub fn is_hmac(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(headers, body, Utc::now())
    }

    pub fn is_valid(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        self.verify(headers, body).is_ok()
    }

    pub fn verify_at(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let signature = header_value(headers, SIGNATURE_HEADER)?;
        let timestamp = header_value(headers, TIMESTAMP_HEADER)?;

        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let sent_at = parse_timestamp(timestamp)?;
        let skew = (now.timestamp() - sent_at).abs();
        if skew > self.tolerance.as_secs() as i64 {
            return Err(SignatureError::Expired { skew_secs: skew });
        }

        let provided = decode_signature(signature)?;
        let expected = compute(secret.expose_secret().as_bytes(), timestamp, body);
        if expected.ct_eq(&provided).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Produce the `x-vapi-signature` value for a delivery.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    hex::encode(compute(secret.as_bytes(), timestamp, body))
}

fn compute(secret: &[u8], timestamp: &str, body: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SignatureError::MissingHeader(name))
}

fn parse_timestamp(raw: &str) -> Result<i64, SignatureError> {
    let value: i64 = raw.parse().map_err(|_| SignatureError::InvalidTimestamp)?;
    if value <= 0 {
        return Err(SignatureError::InvalidTimestamp);
    }
    Ok(if value > MILLIS_THRESHOLD {
        value / 1000
    } else {
        value
    })
}

fn decode_signature(raw: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_part = raw.strip_prefix("sha256=").unwrap_or(raw);
    hex::decode(hex_part.to_ascii_lowercase()).map_err(|_| SignatureError::Malformed)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"type":"call.started","call":{"id":"call_1"}}"#;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid time")
    }

    fn headers(signature: Option<&str>, timestamp: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(sig) = signature {
            headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(sig).unwrap());
        }
        if let Some(ts) = timestamp {
            headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(ts).unwrap());
        }
        headers
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Some(SecretString::from(SECRET)), Duration::from_secs(300))
    }

    #[test]
    fn presence_mode_requires_both_headers() {
        let verifier = SignatureVerifier::presence_only();
        assert_eq!(
            verifier.verify_at(&headers(None, Some("1")), BODY, now()),
            Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
        );
        assert_eq!(
            verifier.verify_at(&headers(Some("abc"), None), BODY, now()),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert!(
            verifier
                .verify_at(&headers(Some("anything"), Some("whenever")), BODY, now())
                .is_ok()
        );
    }

    #[test]
    fn accepts_valid_signature_with_or_without_prefix() {
        let ts = "1700000000";
        let sig = sign(SECRET, ts, BODY);
        assert!(verifier().verify_at(&headers(Some(&sig), Some(ts)), BODY, now()).is_ok());

        let prefixed = format!("sha256={}", sig.to_uppercase());
        assert!(
            verifier()
                .verify_at(&headers(Some(&prefixed), Some(ts)), BODY, now())
                .is_ok()
        );
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let ts = "1700000000";
        let sig = sign(SECRET, ts, BODY);
        assert_eq!(
            verifier().verify_at(&headers(Some(&sig), Some(ts)), b"{}", now()),
            Err(SignatureError::Mismatch)
        );

        let forged = sign("other", ts, BODY);
        assert_eq!(
            verifier().verify_at(&headers(Some(&forged), Some(ts)), BODY, now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_timestamps_outside_window() {
        let stale = "1699999000";
        let sig = sign(SECRET, stale, BODY);
        assert_eq!(
            verifier().verify_at(&headers(Some(&sig), Some(stale)), BODY, now()),
            Err(SignatureError::Expired { skew_secs: 1000 })
        );

        let edge = "1700000300";
        let sig = sign(SECRET, edge, BODY);
        assert!(verifier().verify_at(&headers(Some(&sig), Some(edge)), BODY, now()).is_ok());
    }

    #[test]
    fn accepts_millisecond_timestamps() {
        let ts = "1700000000123";
        let sig = sign(SECRET, ts, BODY);
        assert!(verifier().verify_at(&headers(Some(&sig), Some(ts)), BODY, now()).is_ok());
    }

    #[test]
    fn rejects_garbage_timestamp_and_signature() {
        assert_eq!(
            verifier().verify_at(&headers(Some("abcd"), Some("yesterday")), BODY, now()),
            Err(SignatureError::InvalidTimestamp)
        );
        assert_eq!(
            verifier().verify_at(&headers(Some("not-hex"), Some("1700000000")), BODY, now()),
            Err(SignatureError::Malformed)
        );
    }
}
