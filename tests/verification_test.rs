mod common;

use chrono::Utc;
use tokenward::{ClientConfig, Error, TokenVerifier, VerifyToken};

use common::{
    mount_keys, primary_key, secondary_key, serve_keys, sign_jwt, TestClaims, PROJECT_ID,
};

fn verifier_for(base_url: &str) -> TokenVerifier {
    TokenVerifier::new(&ClientConfig::new(PROJECT_ID, base_url))
}

#[tokio::test]
async fn verify_valid_jwt_extracts_subject_and_project() {
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    let claims = TestClaims::valid(&base_url);
    let exp = claims.exp.unwrap();
    let token = sign_jwt(&claims, &key);

    let verified = verifier_for(&base_url).verify(&token).await.unwrap();

    assert_eq!(verified.subject(), "user-42");
    assert_eq!(verified.project_id(), PROJECT_ID);
    assert_eq!(verified.expiration().timestamp(), exp);
    assert_eq!(verified.refresh_expiration(), None);
    assert_eq!(verified.jwt(), token);
}

#[tokio::test]
async fn verify_keeps_all_payload_claims() {
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    let claims = TestClaims::valid(&base_url).with_roles(&["admin"]);
    let token = sign_jwt(&claims, &key);

    let verified = verifier_for(&base_url).verify(&token).await.unwrap();

    assert!(verified.claim("iat").is_some());
    assert!(verified.claim("roles").is_some());
    assert!(verified.claim("no-such-claim").is_none());
}

#[tokio::test]
async fn verify_empty_token_fails_without_network() {
    // no server at all: a blank token must fail before any I/O
    let verifier = verifier_for("http://127.0.0.1:1");

    let result = verifier.verify("").await;
    assert!(matches!(result.unwrap_err(), Error::MissingToken));

    let result = verifier.verify("   ").await;
    assert!(matches!(result.unwrap_err(), Error::MissingToken));
}

#[tokio::test]
async fn verify_malformed_token_fails() {
    let verifier = verifier_for("http://127.0.0.1:1");

    let result = verifier.verify("not-a-jwt").await;
    assert!(matches!(result.unwrap_err(), Error::MalformedToken(_)));
}

#[tokio::test]
async fn verify_expired_token_fails_regardless_of_signing_key() {
    // signed with a key the server never publishes: expiry still wins
    let unpublished = secondary_key("key-9");
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    let token = sign_jwt(&TestClaims::expired(&base_url), &unpublished);

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(matches!(result.unwrap_err(), Error::Expired(_)));
}

#[tokio::test]
async fn verify_token_without_expiration_fails() {
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    let token = sign_jwt(&TestClaims::without_expiration(&base_url), &key);

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(matches!(result.unwrap_err(), Error::MissingExpiration));
}

#[tokio::test]
async fn verify_accepts_expiry_within_clock_skew() {
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    // expired two seconds ago, within the default 5 second tolerance
    let claims = TestClaims::valid(&base_url).with_exp(Utc::now().timestamp() - 2);
    let token = sign_jwt(&claims, &key);

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn verify_unknown_kid_fails() {
    let served = primary_key("key-1");
    let unknown = secondary_key("key-9");
    let server = serve_keys(&[&served]).await;
    let base_url = server.url();

    let token = sign_jwt(&TestClaims::valid(&base_url), &unknown);

    let result = verifier_for(&base_url).verify(&token).await;
    match result.unwrap_err() {
        Error::UnknownSigningKey(kid) => assert_eq!(kid, "key-9"),
        other => panic!("expected UnknownSigningKey, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_token_without_kid_fails() {
    let key = primary_key("key-1");
    let server = serve_keys(&[&key]).await;
    let base_url = server.url();

    // encode without a kid in the header
    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    let token =
        jsonwebtoken::encode(&header, &TestClaims::valid(&base_url), &key.encoding_key).unwrap();

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(matches!(result.unwrap_err(), Error::MissingKeyId));
}

#[tokio::test]
async fn verify_signature_mismatch_fails() {
    // the served JWK and the signing key share a kid but are different keys
    let served = primary_key("key-1");
    let impostor = secondary_key("key-1");
    let server = serve_keys(&[&served]).await;
    let base_url = server.url();

    let token = sign_jwt(&TestClaims::valid(&base_url), &impostor);

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(matches!(result.unwrap_err(), Error::InvalidSignature));
}

#[tokio::test]
async fn verify_tries_every_key_sharing_a_kid() {
    // mid-rotation both keys are published under the same kid; the token is
    // signed by the one listed second
    let old = primary_key("key-1");
    let new = secondary_key("key-1");
    let server = serve_keys(&[&old, &new]).await;
    let base_url = server.url();

    let token = sign_jwt(&TestClaims::valid(&base_url), &new);

    let result = verifier_for(&base_url).verify(&token).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn reset_key_cache_forces_a_refetch() {
    let old = primary_key("key-1");
    let mut server = serve_keys(&[&old]).await;
    let base_url = server.url();

    let verifier = verifier_for(&base_url);
    let token = sign_jwt(&TestClaims::valid(&base_url), &old);
    assert!(verifier.verify(&token).await.is_ok());

    // the remote set rotates to a fresh key under the same kid
    let new = secondary_key("key-1");
    mount_keys(&mut server, &[&new]).await;
    let rotated = sign_jwt(&TestClaims::valid(&base_url), &new);

    // still served from the stale cache
    let result = verifier.verify(&rotated).await;
    assert!(matches!(result.unwrap_err(), Error::InvalidSignature));

    verifier.reset_key_cache().await;
    assert!(verifier.verify(&rotated).await.is_ok());
}
