use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::error::Result;
use crate::token::Token;
use crate::verifier::TokenVerifier;
use crate::verifier::VerifyToken;

const REFRESH_PATH: &str = "/v1/auth/refresh";
const EXCHANGE_PATH: &str = "/v1/auth/accesskey/exchange";

/// Options forwarded with an access key exchange
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyLoginOptions {
    /// Custom claims to embed in the minted session JWT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_claims: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Body returned by the refresh and exchange endpoints; only the session JWT
/// matters to the client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JwtResponse {
    #[serde(default)]
    session_jwt: String,
}

/// Session lifecycle operations against the remote identity service.
///
/// Composes the local [`TokenVerifier`] with the two remote endpoints
/// (refresh and access-key exchange). Both endpoints authenticate with a
/// `Bearer {project_id}:{credential}` header, where the credential is a
/// refresh JWT or an access key.
pub struct SessionClient {
    project_id: String,
    refresh_url: String,
    exchange_url: String,
    http: Client,
    verifier: TokenVerifier,
}

impl SessionClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = config.http_client.clone().unwrap_or_default();
        let verifier = TokenVerifier::with_client(&config, http.clone());

        Self {
            refresh_url: format!("{}{REFRESH_PATH}", config.base_url),
            exchange_url: format!("{}{EXCHANGE_PATH}", config.base_url),
            project_id: config.project_id,
            http,
            verifier,
        }
    }

    /// The verifier backing this client
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Locally verify a session JWT
    pub async fn validate_session(&self, session_jwt: &str) -> Result<Token> {
        if session_jwt.trim().is_empty() {
            return Err(Error::MissingToken);
        }

        self.verifier.verify(session_jwt).await
    }

    /// Trade a refresh JWT for a freshly minted, verified session token.
    ///
    /// The returned token carries the refresh token's expiration as its
    /// [`refresh_expiration`](Token::refresh_expiration).
    pub async fn refresh_session(&self, refresh_jwt: &str) -> Result<Token> {
        if refresh_jwt.trim().is_empty() {
            return Err(Error::MissingToken);
        }

        // The remote endpoint is the source of truth for the refresh JWT;
        // the local pass only harvests its expiration for the result.
        let refresh_expiration = match self.verifier.verify(refresh_jwt).await {
            Ok(token) => Some(token.expiration()),
            Err(_) => None,
        };

        debug!("refreshing session against {}", self.refresh_url);

        let response: JwtResponse = self
            .http
            .post(&self.refresh_url)
            .header(AUTHORIZATION, self.bearer(refresh_jwt))
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.session_jwt.is_empty() {
            return Err(Error::RefreshFailed);
        }

        let token = self.verifier.verify(&response.session_jwt).await?;

        Ok(token.with_refresh_expiration(refresh_expiration))
    }

    /// Validate the session JWT, falling back to a refresh when it is
    /// missing or no longer valid.
    pub async fn validate_and_refresh_session(
        &self,
        session_jwt: &str,
        refresh_jwt: &str,
    ) -> Result<Token> {
        if session_jwt.trim().is_empty() && refresh_jwt.trim().is_empty() {
            return Err(Error::MissingTokens);
        }

        // The one place a failure is deliberately swallowed: an invalid
        // session still refreshes when a refresh JWT is present.
        if !session_jwt.trim().is_empty() {
            if let Ok(token) = self.verifier.verify(session_jwt).await {
                return Ok(token);
            }
        }

        if refresh_jwt.trim().is_empty() {
            return Err(Error::CannotRefresh);
        }

        self.refresh_session(refresh_jwt).await
    }

    /// Exchange a long-lived access key for a verified session token
    pub async fn exchange_access_key(
        &self,
        access_key: &str,
        login_options: Option<AccessKeyLoginOptions>,
    ) -> Result<Token> {
        if access_key.trim().is_empty() {
            return Err(Error::MissingToken);
        }

        debug!("exchanging access key against {}", self.exchange_url);

        let response: JwtResponse = self
            .http
            .post(&self.exchange_url)
            .header(AUTHORIZATION, self.bearer(access_key))
            .json(&json!({ "loginOptions": login_options }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.session_jwt.is_empty() {
            return Err(Error::ExchangeFailed);
        }

        self.verifier.verify(&response.session_jwt).await
    }

    fn bearer(&self, credential: &str) -> String {
        format!("Bearer {}:{}", self.project_id, credential)
    }
}
