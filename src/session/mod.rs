//! Realm-keyed session persistence. The guard is the only writer of the
//! session store; everything else reads through `current`/`authorize`. It can
//! be memory-backed (tests, embedding) or file-backed (the CLI), and the file
//! is written atomically so no reader ever observes a half-written session.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// Account namespace a credential resolves into. Determines the endpoint,
/// the token audience, and where a signed-out caller is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    Admin,
    User,
}

impl Realm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Sign-in entry point for this realm.
    #[must_use]
    pub const fn login_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/login",
            Self::User => "/login",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Persisted proof of a successful resolution for one realm: the bearer
/// token plus the identity it was issued to. At most one session per realm
/// exists at a time.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub realm: Realm,
    pub identity: String,
    pub issued_path: String,
}

impl Session {
    #[must_use]
    pub fn new(realm: Realm, token: SecretString, identity: impl Into<String>) -> Self {
        Self {
            token,
            realm,
            identity: identity.into(),
            issued_path: realm.login_path().to_string(),
        }
    }
}

/// On-disk shape of a session. Kept separate from `Session` so the secret
/// wrapper never grows a `Serialize` impl.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
    realm: Realm,
    identity: String,
    issued_path: String,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.expose_secret().to_string(),
            realm: session.realm,
            identity: session.identity.clone(),
            issued_path: session.issued_path.clone(),
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            token: SecretString::from(record.token),
            realm: record.realm,
            identity: record.identity,
            issued_path: record.issued_path,
        }
    }
}

/// Owns the bearer-token lifecycle: persistence keyed by realm, header
/// production for outgoing requests, and invalidation on server rejection.
#[derive(Debug)]
pub struct SessionGuard {
    sessions: RwLock<HashMap<Realm, Session>>,
    state_file: Option<PathBuf>,
}

impl SessionGuard {
    /// Guard with no backing file; nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            state_file: None,
        }
    }

    /// File-backed guard, hydrated from any previously persisted sessions.
    /// A missing file starts empty; an unreadable one is discarded with a
    /// warning rather than locking the user out.
    ///
    /// # Errors
    /// Returns an error only when the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let sessions = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<SessionRecord>>(&bytes) {
                Ok(records) => records
                    .into_iter()
                    .map(|record| (record.realm, Session::from(record)))
                    .collect(),
                Err(err) => {
                    warn!(path = %path.display(), "discarding unreadable session file: {err}");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading session file {}", path.display()))
            }
        };

        Ok(Self {
            sessions: RwLock::new(sessions),
            state_file: Some(path),
        })
    }

    /// Store `session` keyed by its realm, replacing any prior session for
    /// that realm. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the backing file cannot be written.
    pub fn persist(&self, session: Session) -> Result<()> {
        let mut sessions = self.write();

        debug!(realm = %session.realm, identity = %session.identity, "persisting session");
        sessions.insert(session.realm, session);

        self.save(&sessions)
    }

    /// Current session for `realm`, if any.
    #[must_use]
    pub fn current(&self, realm: Realm) -> Option<Session> {
        self.read().get(&realm).cloned()
    }

    /// `Authorization` header value for `realm`, or `None` when signed out.
    #[must_use]
    pub fn authorize(&self, realm: Realm) -> Option<String> {
        self.current(realm)
            .map(|session| format!("Bearer {}", session.token.expose_secret()))
    }

    /// Remove the stored session for `realm`. Idempotent: invalidating an
    /// absent session is a no-op.
    ///
    /// # Errors
    /// Returns an error if the backing file cannot be written.
    pub fn invalidate(&self, realm: Realm) -> Result<()> {
        let mut sessions = self.write();

        if sessions.remove(&realm).is_some() {
            debug!(realm = %realm, "session invalidated");
        }

        self.save(&sessions)
    }

    /// Entry guard for protected flows: yields the session for `realm`, or
    /// invokes `on_missing` (which performs the navigation back to the
    /// sign-in entry point) and returns `None`. An expired session that was
    /// already invalidated looks identical to never having signed in.
    pub fn require_or_redirect(&self, realm: Realm, on_missing: impl FnOnce()) -> Option<Session> {
        match self.current(realm) {
            Some(session) => Some(session),
            None => {
                on_missing();
                None
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Realm, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Realm, Session>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Write-through to the backing file: serialize to a sibling temp file,
    // then rename over the target so readers see either the old state or the
    // new one, never a torn write.
    fn save(&self, sessions: &HashMap<Realm, Session>) -> Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let records: Vec<SessionRecord> = sessions.values().map(SessionRecord::from).collect();
        let body = serde_json::to_vec_pretty(&records)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("renaming over {}", path.display()))?;

        Ok(())
    }
}
