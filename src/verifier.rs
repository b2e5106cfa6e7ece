use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::dangerous;
use jsonwebtoken::decode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Validation;
use reqwest::Client;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::malformed_token_error;
use crate::error::Error;
use crate::error::Result;
use crate::key_cache::KeyCache;
use crate::key_cache::SigningKey;
use crate::token::Token;

/// Trait for token verification
#[async_trait]
pub trait VerifyToken {
    /// Verify a compact JWT and return the validated [`Token`]
    async fn verify(&self, jwt: &str) -> Result<Token>;
}

/// Local JWT verifier backed by the cached remote key set.
///
/// Verification never calls the remote service beyond the one lazy key-set
/// fetch; repeated calls with different tokens reuse the cached keys.
pub struct TokenVerifier {
    key_cache: KeyCache,
    clock_skew: Duration,
}

impl TokenVerifier {
    /// Create a verifier from the given configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = config.http_client.clone().unwrap_or_default();
        Self::with_client(config, client)
    }

    pub(crate) fn with_client(config: &ClientConfig, client: Client) -> Self {
        Self {
            key_cache: KeyCache::new(&config.base_url, &config.project_id, client),
            clock_skew: config.clock_skew,
        }
    }

    /// Drop the cached key set so the next verification fetches a fresh one.
    ///
    /// No verification flow calls this; it is for callers that know the
    /// remote keys rotated.
    pub async fn reset_key_cache(&self) {
        self.key_cache.reset().await;
    }

    /// Expiration gate, applied before any signature work so an expired or
    /// expiration-less token reports as such regardless of its signature
    fn check_expiration(&self, payload: &Value) -> Result<()> {
        let exp = payload
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(Error::MissingExpiration)?;

        let now = Utc::now().timestamp();
        if exp < now - self.clock_skew.as_secs() as i64 {
            return Err(Error::Expired(exp));
        }

        Ok(())
    }
}

#[async_trait]
impl VerifyToken for TokenVerifier {
    async fn verify(&self, jwt: &str) -> Result<Token> {
        if jwt.trim().is_empty() {
            return Err(Error::MissingToken);
        }

        // Signature validation is disabled here as we only parse the token
        // to route on its header and expiration; the real check follows in
        // check_signature()
        let token_data =
            dangerous::insecure_decode::<Value>(jwt).map_err(malformed_token_error)?;

        self.check_expiration(&token_data.claims)?;

        let kid = token_data.header.kid.ok_or(Error::MissingKeyId)?;

        self.key_cache.ensure_loaded().await?;

        let candidates = self.key_cache.keys_for(&kid).await;
        if candidates.is_empty() {
            return Err(Error::UnknownSigningKey(kid));
        }

        let payload = check_signature(jwt, &candidates)?;

        Token::from_payload(jwt, payload)
    }
}

/// Verify the signature against each candidate key until one succeeds.
///
/// More than one key can share a kid while the remote set rotates, so a
/// signature or algorithm mismatch moves on to the next candidate.
fn check_signature(jwt: &str, candidates: &[Arc<SigningKey>]) -> Result<Value> {
    for key in candidates {
        // expiration is enforced separately, with the configured skew
        let mut validation = Validation::new(key.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        match decode::<Value>(jwt, key.decoding_key(), &validation) {
            Ok(token_data) => return Ok(token_data.claims),
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm
                ) =>
            {
                continue
            }
            Err(error) => return Err(malformed_token_error(error)),
        }
    }

    Err(Error::InvalidSignature)
}
