use crate::api::Api;
use crate::auth::CredentialResolver;
use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use secrecy::SecretString;

/// Handle the signup action
pub async fn handle(
    globals: &GlobalArgs,
    username: String,
    email: String,
    password: SecretString,
    confirm: SecretString,
) -> Result<()> {
    let resolver = CredentialResolver::new(Api::new(&globals.api_url)?);

    // Registration signs the new account straight in.
    let resolved = resolver.sign_up(&username, &email, &password, &confirm).await?;

    let guard = super::guard(globals)?;
    let identity = resolved.identity.clone();
    guard.persist(resolved.into_session())?;

    println!("account created; signed in as {identity}");

    Ok(())
}
