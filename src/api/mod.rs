//! HTTP transport for the CINE NEST API. One function per remote endpoint,
//! with a shared `reqwest::Client`, a normalized base URL, and a uniform
//! mapping from status codes to the `AppError` taxonomy: 401 on the admin
//! surface becomes `Unauthorized`, a 401 on a login endpoint is a tagged
//! rejection (not an error), and everything else non-2xx is transport-class.

use crate::{
    content::ContentPage,
    errors::AppError,
    APP_USER_AGENT,
};
use anyhow::anyhow;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Outcome of one login attempt against one realm endpoint.
///
/// A rejection is a definitive answer from the server and is distinct from a
/// transport failure, which surfaces as `Err(AppError::Transport)`.
#[derive(Debug)]
pub enum LoginOutcome {
    Granted {
        access_token: SecretString,
        username: Option<String>,
    },
    Rejected,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<String>,
}

/// Normalize and validate the API base URL, filling in the default port.
///
/// # Errors
/// Returns an error if `url` cannot be parsed, has no host, or uses an
/// unsupported scheme.
pub fn base_url(url: &str) -> Result<String, AppError> {
    let url = Url::parse(url).map_err(|err| AppError::transport(anyhow!("invalid API URL: {err}")))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| AppError::transport(anyhow!("invalid API URL: no host specified")))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => {
                return Err(AppError::transport(anyhow!(
                    "invalid API URL: unsupported scheme {scheme}"
                )))
            }
        },
    };

    let base = format!("{scheme}://{host}:{port}");

    debug!("API base URL: {}", base);

    Ok(base)
}

/// Typed access to the remote API. Cheap to clone; the inner client pools
/// connections.
#[derive(Debug, Clone)]
pub struct Api {
    client: Client,
    base_url: String,
}

impl Api {
    /// Build a client for the API at `url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// constructed.
    pub fn new(url: &str) -> Result<Self, AppError> {
        let base_url = base_url(url)?;
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attempt an admin-realm login with the raw credential.
    ///
    /// # Errors
    /// Returns `Transport` on network failure, a malformed response, or any
    /// status other than 2xx/401.
    pub async fn admin_login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AppError> {
        self.login("/admin/login", username, password).await
    }

    /// Attempt a user-realm login with the raw credential.
    ///
    /// # Errors
    /// Returns `Transport` on network failure, a malformed response, or any
    /// status other than 2xx/401.
    pub async fn user_login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AppError> {
        self.login("/auth/login", username, password).await
    }

    async fn login(
        &self,
        path: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AppError> {
        let url = self.endpoint(path);

        // Both login endpoints take the credential form-encoded.
        let form = [("username", username), ("password", password.expose_secret())];

        let span = info_span!(
            "api.login",
            http.method = "POST",
            url = %url
        );
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .instrument(span)
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(LoginOutcome::Rejected),
            status if status.is_success() => {
                let payload: TokenPayload = response.json().await?;

                Ok(LoginOutcome::Granted {
                    access_token: SecretString::from(payload.access_token),
                    username: payload.username,
                })
            }
            status => Err(AppError::transport(anyhow!("{url} - {status}"))),
        }
    }

    /// Register a new user account; success yields the same token payload as
    /// a login.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` carrying the server's `detail` on a 4xx
    /// refusal, `Transport` otherwise.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<(SecretString, Option<String>), AppError> {
        let url = self.endpoint("/auth/signup");

        let payload = serde_json::json!({
            "username": username,
            "email": email,
            "password": password.expose_secret(),
        });

        let span = info_span!(
            "api.signup",
            http.method = "POST",
            url = %url
        );
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        let status = response.status();

        if status.is_success() {
            let payload: TokenPayload = response.json().await?;

            return Ok((SecretString::from(payload.access_token), payload.username));
        }

        if status.is_client_error() {
            let detail = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.detail)
                .unwrap_or_else(|| format!("signup failed ({status})"));

            return Err(AppError::InvalidCredentials(detail));
        }

        Err(AppError::transport(anyhow!("{url} - {status}")))
    }

    /// Fetch one page of the admin content list.
    ///
    /// # Errors
    /// Returns `Unauthorized` when the bearer token is missing or expired,
    /// `Transport` on any other failure.
    pub async fn content_list(
        &self,
        bearer: &str,
        query: &[(String, String)],
    ) -> Result<ContentPage, AppError> {
        let url = self.endpoint("/admin/content-list");

        let span = info_span!(
            "api.content_list",
            http.method = "GET",
            url = %url
        );
        let response = self
            .client
            .get(&url)
            .query(&query)
            .header(AUTHORIZATION, bearer)
            .send()
            .instrument(span)
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(AppError::transport(anyhow!("{url} - {status}"))),
        }
    }

    /// Delete one content item by its identifier.
    ///
    /// # Errors
    /// Returns `Unauthorized` when the bearer token is missing or expired,
    /// `Transport` on any other failure.
    pub async fn delete_content(&self, bearer: &str, id: &str) -> Result<(), AppError> {
        let url = self.endpoint(&format!("/admin/content/{id}"));

        let span = info_span!(
            "api.delete_content",
            http.method = "DELETE",
            url = %url
        );
        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, bearer)
            .send()
            .instrument(span)
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
            // 200 and 204 both count as a successful delete.
            status if status.is_success() => Ok(()),
            status => Err(AppError::transport(anyhow!("{url} - {status}"))),
        }
    }
}
