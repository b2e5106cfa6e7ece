//! # Tokenward
//!
//! A Rust library for validating session tokens issued by a remote identity
//! platform and answering authorization questions against their claims,
//! without calling the server on every request.
//!
//! Signing keys are fetched from the platform's JWKS endpoint once and
//! cached; session and refresh JWTs verify locally against them. Tokens
//! expose role and permission queries, including claims scoped to specific
//! tenants in a multi-tenant project.
//!
//! ## Features
//!
//! - JWT signature verification against the project's published key set
//! - Lazy, concurrency-safe key caching with a single underlying fetch
//! - Expiration checks with a configurable clock-skew tolerance
//! - Tenant-scoped permission and role queries
//! - Session refresh and access-key exchange, with local re-verification of
//!   every token the remote service returns
//!
//! ## Example
//!
//! ```rust,no_run
//! use tokenward::{ClientConfig, SessionClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("P2AbcDefGhiJklMno", "https://api.example.com");
//!     let client = SessionClient::new(config);
//!
//!     let session_jwt = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!     let refresh_jwt = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!
//!     // Verify the session, refreshing it if it has gone stale
//!     let token = client
//!         .validate_and_refresh_session(session_jwt, refresh_jwt)
//!         .await?;
//!
//!     println!("Subject: {}", token.subject());
//!
//!     if token.validate_permissions(&["backend.read"], Some("tenant-a")) {
//!         println!("{} may read tenant-a", token.subject());
//!     }
//!
//!     Ok(())
//! }
//! ```

mod claims;
mod config;
mod error;
mod key_cache;
mod session;
mod token;
mod verifier;

// Re-exports for public API
pub use claims::ClaimValue;
pub use config::ClientConfig;
pub use error::Error;
pub use error::Result;
pub use session::AccessKeyLoginOptions;
pub use session::SessionClient;
pub use token::Token;
pub use verifier::TokenVerifier;
pub use verifier::VerifyToken;
