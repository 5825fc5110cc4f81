//! One-shot authentication flow: login, with a single auto-registration
//! fallback, then device identity lookup. Runs once before the link starts.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request rejected with status {0}")]
    TokenRequestFailed(u16),
    #[error("registration rejected with status {0}")]
    RegisterFailed(u16),
    #[error("login still rejected after successful registration")]
    LoginFailedAfterRegister,
    #[error("device lookup failed with status {0}")]
    DeviceLookupFailed(u16),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Login identity derived once at startup from the hardware identifier.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub friendly_name: String,
}

impl Credentials {
    /// Derive credentials from a stable hardware id (MAC address hex).
    /// The server treats the pair as a machine account; registration is
    /// idempotent on its side.
    pub fn from_hardware_id(hardware_id: &str) -> Self {
        let tail = if hardware_id.len() > 4 {
            &hardware_id[hardware_id.len() - 4..]
        } else {
            hardware_id
        };
        Self {
            username: format!("ptt-{}", hardware_id),
            password: format!("{}-{}", hardware_id, tail),
            friendly_name: format!("PTT {}", tail),
        }
    }
}

/// Result of a successful authentication. Lives for the whole process,
/// the token is never refreshed.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub device_id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DeviceResponse {
    #[serde(rename = "deviceId")]
    device_id: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(rename = "friendlyName")]
    friendly_name: &'a str,
}

enum TokenOutcome {
    Token(String),
    Unauthorized,
    Rejected(u16),
}

/// Authenticate against the server and resolve the device identity.
///
/// On a 401 the flow registers the account once and retries the token
/// request exactly once; any failure of that retry is final.
pub async fn authenticate(
    client: &Client,
    base_url: &str,
    creds: &Credentials,
) -> Result<Session, AuthError> {
    let token = match request_token(client, base_url, creds).await? {
        TokenOutcome::Token(token) => token,
        TokenOutcome::Rejected(status) => return Err(AuthError::TokenRequestFailed(status)),
        TokenOutcome::Unauthorized => {
            log::info!("login rejected, attempting one-time registration");
            register(client, base_url, creds).await?;
            match request_token(client, base_url, creds).await? {
                TokenOutcome::Token(token) => token,
                _ => return Err(AuthError::LoginFailedAfterRegister),
            }
        }
    };

    let device_id = lookup_device(client, base_url, &token).await?;
    Ok(Session { token, device_id })
}

async fn request_token(
    client: &Client,
    base_url: &str,
    creds: &Credentials,
) -> Result<TokenOutcome, AuthError> {
    let resp = client
        .post(format!("{}/token", base_url))
        .form(&[
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
        ])
        .send()
        .await?;

    let status = resp.status().as_u16();
    match status {
        200 => {
            let body: TokenResponse = resp.json().await?;
            Ok(TokenOutcome::Token(body.access_token))
        }
        401 => Ok(TokenOutcome::Unauthorized),
        other => Ok(TokenOutcome::Rejected(other)),
    }
}

async fn register(client: &Client, base_url: &str, creds: &Credentials) -> Result<(), AuthError> {
    let resp = client
        .post(format!("{}/register", base_url))
        .json(&RegisterRequest {
            username: &creds.username,
            password: &creds.password,
            friendly_name: &creds.friendly_name,
        })
        .send()
        .await?;

    let status = resp.status().as_u16();
    if status == 200 || status == 201 {
        Ok(())
    } else {
        Err(AuthError::RegisterFailed(status))
    }
}

async fn lookup_device(client: &Client, base_url: &str, token: &str) -> Result<String, AuthError> {
    let resp = client
        .get(format!("{}/devices/me", base_url))
        .bearer_auth(token)
        .send()
        .await?;

    let status = resp.status().as_u16();
    if status != 200 {
        return Err(AuthError::DeviceLookupFailed(status));
    }
    let body: DeviceResponse = resp
        .json()
        .await
        .map_err(|_| AuthError::DeviceLookupFailed(status))?;
    Ok(body.device_id)
}
