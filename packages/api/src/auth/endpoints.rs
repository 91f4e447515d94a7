//! Calls to the hosted auth service (`/auth/v1`).

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use store::{AuthUser, Session};

use super::session::TokenResponse;
use crate::config::SupabaseConfig;
use crate::error::{ensure_success, SupabaseError};

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Thin wrapper over the auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: Client,
    config: SupabaseConfig,
}

impl AuthApi {
    pub fn new(http: Client, config: SupabaseConfig) -> Self {
        Self { http, config }
    }

    /// Email a one-time sign-in link, creating the user on first use.
    pub async fn send_magic_link(&self, email: &str) -> Result<(), SupabaseError> {
        let mut request = self
            .http
            .post(self.config.auth_url("otp"))
            .header("apikey", &self.config.anon_key)
            .json(&OtpRequest { email, create_user: true });
        if let Some(redirect_to) = &self.config.redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        ensure_success(request.send().await?).await?;
        tracing::info!("magic link requested");
        Ok(())
    }

    /// The user an access token belongs to.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let response = self
            .http
            .get(self.config.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// Trade a refresh token for a fresh session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, SupabaseError> {
        let response = self
            .http
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let token: TokenResponse = ensure_success(response).await?.json().await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Revoke the session's refresh tokens on the server.
    pub async fn logout(&self, access_token: &str) -> Result<(), SupabaseError> {
        let response = self
            .http
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
