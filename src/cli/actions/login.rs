use crate::api::Api;
use crate::auth::{Credential, CredentialResolver};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

/// Handle the login action
pub async fn handle(globals: &GlobalArgs, identifier: String, password: SecretString) -> Result<()> {
    let resolver = CredentialResolver::new(Api::new(&globals.api_url)?);
    let credential = Credential::new(identifier, password);

    let resolved = resolver.resolve(&credential).await?;

    debug!(realm = %resolved.realm, "login resolved");

    let guard = super::guard(globals)?;
    let realm = resolved.realm;
    let identity = resolved.identity.clone();
    guard.persist(resolved.into_session())?;

    println!("signed in to the {realm} realm as {identity}");

    Ok(())
}
