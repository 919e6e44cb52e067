pub mod content;
pub mod login;
pub mod logout;
pub mod signup;

use crate::cli::globals::GlobalArgs;
use crate::session::{Realm, SessionGuard};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

/// Actions the CLI can perform.
#[derive(Debug)]
pub enum Action {
    Login {
        identifier: String,
        password: SecretString,
    },
    Signup {
        username: String,
        email: String,
        password: SecretString,
        confirm: SecretString,
    },
    Logout {
        realm: Option<Realm>,
    },
    ContentList(content::ListArgs),
    ContentDelete {
        id: String,
    },
}

// Sessions live in the configured state file, falling back to
// ~/.cinenest/session.json; without a home directory nothing is persisted.
pub(crate) fn guard(globals: &GlobalArgs) -> Result<SessionGuard> {
    let state_file = globals.state_file.clone().or_else(default_state_file);

    match state_file {
        Some(path) => SessionGuard::open(path),
        None => Ok(SessionGuard::in_memory()),
    }
}

fn default_state_file() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cinenest").join("session.json"))
}
