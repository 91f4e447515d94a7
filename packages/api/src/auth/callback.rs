//! Parsing the redirect that completes a magic-link sign-in.
//!
//! After the user clicks the emailed link the auth server redirects back to
//! the app with the tokens in the URL fragment:
//!
//! ```text
//! #access_token=...&expires_at=1700000000&expires_in=3600&refresh_token=...&token_type=bearer&type=magiclink
//! ```
//!
//! or, when the link is stale, with `error`, `error_code` and
//! `error_description` instead.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::error::SupabaseError;

/// Tokens carried by a successful redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: Option<i64>,
}

/// Parse a redirect fragment (with or without the leading `#`).
///
/// Returns `Ok(None)` when the fragment is not an auth redirect at all.
pub fn parse_callback(fragment: &str, now: DateTime<Utc>) -> Result<Option<CallbackTokens>, SupabaseError> {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        return Ok(None);
    }
    let url = Url::parse(&format!("http://callback/?{fragment}"))
        .map_err(|e| SupabaseError::Callback(e.to_string()))?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(description) = params.get("error_description").or(params.get("error")) {
        return Err(SupabaseError::Callback(description.clone()));
    }

    let (Some(access_token), Some(refresh_token)) =
        (params.get("access_token"), params.get("refresh_token"))
    else {
        return Ok(None);
    };

    let expires_at = params
        .get("expires_at")
        .and_then(|v| v.parse::<i64>().ok())
        .or_else(|| {
            params
                .get("expires_in")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|secs| now.timestamp() + secs)
        });

    Ok(Some(CallbackTokens {
        access_token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        token_type: params
            .get("token_type")
            .cloned()
            .unwrap_or_else(|| "bearer".to_string()),
        expires_at,
    }))
}
