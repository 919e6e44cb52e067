use anyhow::Result;
use cinenest::cli::{actions, actions::Action, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::Login {
            identifier,
            password,
        } => actions::login::handle(&globals, identifier, password).await?,
        Action::Signup {
            username,
            email,
            password,
            confirm,
        } => actions::signup::handle(&globals, username, email, password, confirm).await?,
        Action::Logout { realm } => actions::logout::handle(&globals, realm)?,
        Action::ContentList(args) => actions::content::list(&globals, args).await?,
        Action::ContentDelete { id } => actions::content::delete(&globals, &id).await?,
    }

    Ok(())
}
