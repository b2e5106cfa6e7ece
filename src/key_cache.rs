use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::warn;

use crate::error::key_fetch_error;
use crate::error::Result;

/// One verification key from the remote key set
pub(crate) struct SigningKey {
    kid: String,
    algorithm: Algorithm,
    decoding_key: DecodingKey,
}

impl SigningKey {
    pub(crate) fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

type KeyMap = HashMap<String, Vec<Arc<SigningKey>>>;

/// Cache of the project's remote key set, indexed by key id.
///
/// The mapping is populated lazily by the first successful fetch and never
/// mutated again outside of [`reset`](Self::reset). A key id may map to more
/// than one key while the remote set rotates.
pub(crate) struct KeyCache {
    keys: RwLock<Option<Arc<KeyMap>>>,
    keys_url: String,
    client: Client,
}

impl KeyCache {
    pub(crate) fn new(base_url: &str, project_id: &str, client: Client) -> Self {
        Self {
            keys: RwLock::new(None),
            keys_url: format!("{base_url}/v2/keys/{project_id}"),
            client,
        }
    }

    /// Populate the cache if it is still empty.
    ///
    /// The write lock is held across the fetch, so racing callers queue here
    /// and re-check instead of fetching again: the underlying HTTP request
    /// happens at most once and readers only ever observe a complete map.
    /// A failed fetch leaves the cache empty; a later call retries.
    pub(crate) async fn ensure_loaded(&self) -> Result<()> {
        if self.keys.read().await.is_some() {
            return Ok(());
        }

        let mut slot = self.keys.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let keys = self.fetch_keys().await?;
        *slot = Some(Arc::new(keys));

        Ok(())
    }

    /// All keys registered under `kid`, empty for an unknown key id
    pub(crate) async fn keys_for(&self, kid: &str) -> Vec<Arc<SigningKey>> {
        match self.keys.read().await.as_ref() {
            Some(keys) => keys.get(kid).cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Drop the cached key set so the next verification fetches a fresh one
    pub(crate) async fn reset(&self) {
        *self.keys.write().await = None;
    }

    async fn fetch_keys(&self) -> Result<KeyMap> {
        debug!("fetching signing keys from {}", self.keys_url);

        let jwks: JwkSet = self
            .client
            .get(&self.keys_url)
            .send()
            .await
            .map_err(key_fetch_error)?
            .error_for_status()
            .map_err(key_fetch_error)?
            .json()
            .await
            .map_err(key_fetch_error)?;

        let mut keys: KeyMap = HashMap::new();
        for jwk in &jwks.keys {
            match signing_key(jwk) {
                Some(key) => keys.entry(key.kid.clone()).or_default().push(Arc::new(key)),
                None => warn!(
                    "skipping key set entry without usable RSA parameters (kid: {:?})",
                    jwk.common.key_id
                ),
            }
        }

        Ok(keys)
    }
}

/// Convert one key set entry, or `None` when it cannot back a verification
fn signing_key(jwk: &Jwk) -> Option<SigningKey> {
    let kid = jwk.common.key_id.clone()?;

    match &jwk.algorithm {
        AlgorithmParameters::RSA(params) => {
            let decoding_key = DecodingKey::from_rsa_components(&params.n, &params.e).ok()?;

            Some(SigningKey {
                kid,
                algorithm: rsa_algorithm(jwk),
                decoding_key,
            })
        }
        _ => None,
    }
}

fn rsa_algorithm(jwk: &Jwk) -> Algorithm {
    match jwk.common.key_algorithm {
        Some(KeyAlgorithm::RS384) => Algorithm::RS384,
        Some(KeyAlgorithm::RS512) => Algorithm::RS512,
        _ => Algorithm::RS256,
    }
}
