//! OAuth session lifecycle.
//!
//! The agent never runs an interactive consent flow itself; it works from a
//! cached refresh token and exchanges it at the provider token endpoint
//! when the access token is stale. Signing out deletes the cache.

use crate::config;
use crate::types::{Credentials, TokenCache, TokenResponse};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::debug;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Refresh slack: treat tokens expiring within this window as stale.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub fn tokens_need_refresh(tokens: &TokenCache) -> bool {
    match tokens.expires_at {
        Some(expires_at) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at,
        // No recorded expiry: assume stale and let the refresh decide.
        None => true,
    }
}

/// Get a usable access token, refreshing and re-caching when needed.
pub async fn get_valid_access_token() -> Result<String> {
    let mut tokens = config::load_tokens()?;

    if tokens_need_refresh(&tokens) {
        debug!("access token stale, refreshing");
        let creds = config::load_credentials()?;
        tokens = refresh_tokens(&creds, &tokens).await?;
        config::save_tokens(&tokens)?;
    }

    Ok(tokens.access_token)
}

/// Whether a usable session exists: an unexpired cached token, or a cached
/// refresh token we could exchange.
pub fn is_authenticated() -> bool {
    match config::load_tokens() {
        Ok(tokens) => !tokens_need_refresh(&tokens) || !tokens.refresh_token.is_empty(),
        Err(_) => false,
    }
}

/// Establish a session eagerly. Fails with setup guidance when credentials
/// or tokens are missing.
pub async fn sign_in() -> Result<()> {
    let creds = config::load_credentials()?;
    let tokens = config::load_tokens()?;

    let refreshed = refresh_tokens(&creds, &tokens).await?;
    config::save_tokens(&refreshed)?;

    Ok(())
}

/// Drop the cached session.
pub fn sign_out() -> Result<()> {
    config::delete_tokens()
}

pub async fn refresh_tokens(creds: &Credentials, tokens: &TokenCache) -> Result<TokenCache> {
    if tokens.refresh_token.is_empty() {
        anyhow::bail!("No refresh token cached. Re-run the consent flow to obtain one.");
    }

    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", tokens.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .context("Token refresh request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        anyhow::bail!("Token refresh rejected: {}", status);
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    let expires_at = token_response
        .expires_in
        .map(|seconds| Utc::now() + Duration::seconds(seconds));

    // The provider typically omits the refresh token on refresh grants.
    let refresh_token = token_response
        .refresh_token
        .unwrap_or_else(|| tokens.refresh_token.clone());

    Ok(TokenCache {
        access_token: token_response.access_token,
        refresh_token,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_need_refresh_near_expiry() {
        let fresh = TokenCache {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        };
        assert!(!tokens_need_refresh(&fresh));

        let expiring = TokenCache {
            expires_at: Some(Utc::now() + Duration::seconds(30)),
            ..fresh.clone()
        };
        assert!(tokens_need_refresh(&expiring));

        let unknown = TokenCache {
            expires_at: None,
            ..fresh
        };
        assert!(tokens_need_refresh(&unknown));
    }
}
