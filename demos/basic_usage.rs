use std::time::Duration;

use tokenward::ClientConfig;
use tokenward::SessionClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example 1: Validate a session token locally
    println!("=== Example 1: Validate a Session ===");
    let config = ClientConfig::new("P2AbcDefGhiJklMno", "https://api.example.com");
    let client = SessionClient::new(config);

    // Example JWTs (placeholders - use real tokens in practice)
    let session_jwt = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
    let refresh_jwt = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";

    match client.validate_session(session_jwt).await {
        Ok(token) => {
            println!("✓ Session verified!");
            println!("  Subject: {}", token.subject());
            println!("  Project: {}", token.project_id());
            println!("  Expires: {}", token.expiration());
        }
        Err(e) => {
            eprintln!("✗ Session validation failed: {e}");
        }
    }

    println!();

    // Example 2: Validate with automatic fallback to a refresh
    println!("=== Example 2: Validate and Refresh ===");
    match client
        .validate_and_refresh_session(session_jwt, refresh_jwt)
        .await
    {
        Ok(token) => {
            println!("✓ Session is good (possibly refreshed)!");
            if let Some(refresh_expiration) = token.refresh_expiration() {
                println!("  Refreshable until: {refresh_expiration}");
            }

            // Authorization queries resolve against the token's claims,
            // optionally scoped to one tenant
            println!("  Tenants: {:?}", token.tenants());
            if token.validate_permissions(&["backend.read"], Some("tenant-a")) {
                println!("  {} may read tenant-a", token.subject());
            }
        }
        Err(e) => {
            eprintln!("✗ Session could not be validated or refreshed: {e}");
        }
    }

    println!();

    // Example 3: Custom HTTP client and clock-skew tolerance
    println!("=== Example 3: Custom Configuration ===");
    let custom_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let config = ClientConfig::new("P2AbcDefGhiJklMno", "https://api.example.com")
        .with_clock_skew(Duration::from_secs(2))
        .with_http_client(custom_client);

    let client = SessionClient::new(config);

    match client.exchange_access_key("my-access-key", None).await {
        Ok(token) => {
            println!("✓ Access key exchanged!");
            println!("  Subject: {}", token.subject());
        }
        Err(e) => {
            eprintln!("✗ Access key exchange failed: {e}");
        }
    }

    Ok(())
}
