use crate::cli::globals::GlobalArgs;
use crate::session::Realm;
use anyhow::Result;

/// Handle the logout action
pub fn handle(globals: &GlobalArgs, realm: Option<Realm>) -> Result<()> {
    let guard = super::guard(globals)?;

    match realm {
        Some(realm) => {
            guard.invalidate(realm)?;
            println!("signed out of the {realm} realm");
        }
        None => {
            guard.invalidate(Realm::Admin)?;
            guard.invalidate(Realm::User)?;
            println!("signed out of all realms");
        }
    }

    Ok(())
}
