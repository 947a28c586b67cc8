//! Download service credentials.
//!
//! An [`ApiSession`] holds a signed bearer token with a bounded validity
//! window. It is passed explicitly to whoever talks to the download service;
//! callers refresh it when it is about to expire.

use crate::bundler::error::{Error, ErrorExt, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE, HeaderMap, HeaderValue};
use serde::Deserialize;
use sha2::Sha256;
use std::path::Path;

/// Default token lifetime in seconds.
pub const DEFAULT_VALIDITY_SECS: i64 = 9000;

/// Key file downloaded from the management console.
#[derive(Deserialize)]
struct KeyFile {
    key: String,
    secret: String,
    domain: String,
    #[serde(rename = "customerId")]
    customer_id: String,
}

/// Authenticated session against the download service.
#[derive(Clone)]
pub struct ApiSession {
    base_url: String,
    key: String,
    secret: String,
    validity: Duration,
    authorization: String,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession")
            .field("base_url", &self.base_url)
            .field("key", &self.key)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl ApiSession {
    /// Creates a session for an explicit base URL.
    pub fn new(
        base_url: &str,
        key: impl Into<String>,
        secret: impl Into<String>,
        validity: Duration,
    ) -> Result<Self> {
        let parsed = url::Url::parse(base_url).map_err(|e| {
            Error::fetch("create session", base_url, format!("invalid base URL: {e}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(Error::fetch("create session", base_url, "URL cannot be a base"));
        }

        let key = key.into();
        let secret = secret.into();
        if key.is_empty() || secret.is_empty() {
            return Err(Error::fetch("create session", base_url, "API key and secret are required"));
        }

        let now = Utc::now();
        let expires_at = now + validity;
        let authorization = format!(
            "Bearer {}",
            sign_token(&key, &secret, expires_at.timestamp())?
        );

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            secret,
            validity,
            authorization,
            expires_at,
        })
    }

    /// Loads credentials from a key file (`{key, secret, domain, customerId}`).
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading API key file", path)?;
        let file: KeyFile = serde_json::from_str(&text).map_err(|e| {
            Error::fetch(
                "load credentials",
                path.display().to_string(),
                format!("invalid key file: {e}"),
            )
        })?;
        if file.domain.is_empty() || file.customer_id.is_empty() {
            return Err(Error::fetch(
                "load credentials",
                path.display().to_string(),
                "domain and customerId are required",
            ));
        }

        let base_url = format!(
            "https://{}.uptycs.io/public/api/customers/{}",
            file.domain, file.customer_id
        );
        Self::new(
            &base_url,
            file.key,
            file.secret,
            Duration::seconds(DEFAULT_VALIDITY_SECS),
        )
    }

    /// Base URL all endpoint paths are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// When the current token stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Re-signs the token if it expires within `margin`.
    ///
    /// Returns true when a new token was issued.
    pub fn refresh_if_expiring(&mut self, margin: Duration) -> Result<bool> {
        if Utc::now() + margin < self.expires_at {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Issues a new token for a full validity window.
    pub fn refresh(&mut self) -> Result<()> {
        let expires_at = Utc::now() + self.validity;
        self.authorization = format!(
            "Bearer {}",
            sign_token(&self.key, &self.secret, expires_at.timestamp())?
        );
        self.expires_at = expires_at;
        log::debug!("Refreshed download service token, valid until {}", expires_at);
        Ok(())
    }

    /// Request headers for one call.
    ///
    /// Fails if the token has expired; the caller must refresh first.
    pub fn headers(&self) -> Result<HeaderMap> {
        if self.is_expired() {
            return Err(Error::fetch(
                "authorize request",
                &self.base_url,
                format!("session expired at {}", self.expires_at),
            ));
        }

        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            Error::fetch("authorize request", &self.base_url, e)
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.authorization).map_err(invalid)?,
        );
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert(DATE, HeaderValue::from_str(&date).map_err(invalid)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

/// Signs an HS256 JWT with claims `{iss, exp}`.
fn sign_token(key: &str, secret: &str, exp: i64) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({ "iss": key, "exp": exp });
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{header}.{payload}");

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::GenericError(format!("invalid signing key: {e}")))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_three_segments_and_claims() {
        let token = sign_token("my-key", "my-secret", 1_700_000_000).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(claims["iss"], "my-key");
        assert_eq!(claims["exp"], 1_700_000_000);
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = sign_token("k", "secret-a", 1).unwrap();
        let b = sign_token("k", "secret-b", 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_session_refuses_headers_until_refreshed() {
        let mut session =
            ApiSession::new("http://localhost:1", "k", "s", Duration::seconds(-1)).unwrap();
        assert!(session.is_expired());
        assert!(matches!(session.headers(), Err(Error::Fetch { .. })));

        session.validity = Duration::seconds(60);
        assert!(session.refresh_if_expiring(Duration::seconds(5)).unwrap());
        let headers = session.headers().unwrap();
        assert!(headers[AUTHORIZATION].to_str().unwrap().starts_with("Bearer "));
    }

    #[test]
    fn fresh_session_is_not_refreshed() {
        let mut session =
            ApiSession::new("http://localhost:1/", "k", "s", Duration::seconds(3600)).unwrap();
        assert_eq!(session.base_url(), "http://localhost:1");
        assert!(!session.refresh_if_expiring(Duration::seconds(60)).unwrap());
    }
}
