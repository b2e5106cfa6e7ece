use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no token provided")]
    MissingToken,
    #[error("neither a session token nor a refresh token was provided")]
    MissingTokens,
    #[error("session token is invalid and no refresh token is available")]
    CannotRefresh,
    #[error("malformed JWT: {0}")]
    MalformedToken(String),
    #[error("missing 'kid' in the header of the provided JWT")]
    MissingKeyId,
    #[error("no signing key registered for kid {0:?}")]
    UnknownSigningKey(String),
    #[error("JWT signature does not match any signing key")]
    InvalidSignature,
    #[error("the provided JWT has expired. Expiration timestamp: {0}")]
    Expired(i64),
    #[error("the provided JWT carries no expiration claim")]
    MissingExpiration,
    #[error("signing key fetch failed: {0}")]
    KeyFetch(String),
    #[error("refresh endpoint returned no session token")]
    RefreshFailed,
    #[error("access key exchange returned no session token")]
    ExchangeFailed,
    #[error("Reqwest error: {0}")]
    Http(#[from] reqwest::Error),
}

pub(crate) fn key_fetch_error(error: reqwest::Error) -> Error {
    Error::KeyFetch(format!("failed to fetch signing keys: {error}"))
}

pub(crate) fn malformed_token_error(error: jsonwebtoken::errors::Error) -> Error {
    Error::MalformedToken(error.to_string())
}
