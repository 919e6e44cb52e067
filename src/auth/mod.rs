//! Dual-role credential resolution. One login form serves two account
//! realms; the server never discloses which realm (if any) a credential
//! belongs to, so the resolver probes the admin endpoint first and falls
//! through to the user endpoint only on an authorization rejection. The
//! resolver performs no persistence; callers hand the result to
//! [`SessionGuard`](crate::session::SessionGuard).

use crate::{
    api::{Api, LoginOutcome},
    errors::AppError,
    session::{Realm, Session},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Realms probed during resolution, in precedence order. A credential valid
/// in both realms always resolves to Admin; the user endpoint is only
/// contacted after an admin rejection.
const RESOLUTION_ORDER: [Realm; 2] = [Realm::Admin, Realm::User];

/// Raw credential pair as submitted by the sign-in form. The identifier may
/// be an email or a username; no format is enforced beyond non-empty.
#[derive(Debug, Clone)]
pub struct Credential {
    pub identifier: String,
    pub secret: SecretString,
}

impl Credential {
    #[must_use]
    pub fn new(identifier: impl Into<String>, secret: SecretString) -> Self {
        Self {
            identifier: identifier.into(),
            secret,
        }
    }

    /// The only pre-submission validation: both halves must be non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.secret.expose_secret().trim().is_empty()
    }
}

/// Successful resolution: which realm granted, the issued token, and the
/// identity to display.
#[derive(Debug)]
pub struct Resolved {
    pub realm: Realm,
    pub token: SecretString,
    pub identity: String,
}

impl Resolved {
    /// The session to persist for this resolution.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session::new(self.realm, self.token, self.identity)
    }
}

/// Implements the login protocol over the two realm endpoints.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    api: Api,
}

impl CredentialResolver {
    #[must_use]
    pub const fn new(api: Api) -> Self {
        Self { api }
    }

    /// Resolve `credential` against each realm in order, stopping at the
    /// first grant. Attempts are strictly sequential; iteration continues
    /// past an authorization rejection and nothing else.
    ///
    /// # Errors
    /// `InvalidCredentials` when every realm rejects, `Transport` when an
    /// attempt fails for a non-authorization reason (the failure is never
    /// masked as bad credentials).
    pub async fn resolve(&self, credential: &Credential) -> Result<Resolved, AppError> {
        if !credential.is_complete() {
            return Err(AppError::InvalidCredentials(
                "Email or username and password are required.".to_string(),
            ));
        }

        for realm in RESOLUTION_ORDER {
            match self.attempt(realm, credential).await? {
                LoginOutcome::Granted {
                    access_token,
                    username,
                } => {
                    // The admin endpoint echoes no username; fall back to the
                    // submitted identifier.
                    let identity = username.unwrap_or_else(|| credential.identifier.clone());

                    debug!(realm = %realm, identity = %identity, "credential resolved");

                    return Ok(Resolved {
                        realm,
                        token: access_token,
                        identity,
                    });
                }
                LoginOutcome::Rejected => {
                    debug!(realm = %realm, "login rejected");
                }
            }
        }

        Err(AppError::InvalidCredentials(
            "Incorrect email or password.".to_string(),
        ))
    }

    async fn attempt(&self, realm: Realm, credential: &Credential) -> Result<LoginOutcome, AppError> {
        match realm {
            Realm::Admin => {
                self.api
                    .admin_login(&credential.identifier, &credential.secret)
                    .await
            }
            Realm::User => {
                self.api
                    .user_login(&credential.identifier, &credential.secret)
                    .await
            }
        }
    }

    /// One-shot user-realm signup. The confirmation check runs before any
    /// network call and fails fast; a grant flows through the same
    /// `Resolved` shape as a login.
    ///
    /// # Errors
    /// `Mismatch` when the confirmation differs from the secret,
    /// `InvalidCredentials` carrying the server's reason on refusal,
    /// `Transport` otherwise.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        secret: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Resolved, AppError> {
        if secret.expose_secret() != confirmation.expose_secret() {
            return Err(AppError::Mismatch);
        }

        let (token, echoed) = self.api.signup(username, email, secret).await?;

        Ok(Resolved {
            realm: Realm::User,
            token,
            identity: echoed.unwrap_or_else(|| username.to_string()),
        })
    }
}
