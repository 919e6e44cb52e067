use crate::cli::{
    actions::{content::ListArgs, Action},
    globals::GlobalArgs,
};
use crate::content::SortOrder;
use crate::session::Realm;
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::path::PathBuf;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(String::to_string)
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut globals = GlobalArgs::new(required(matches, "api-url")?);
    globals.state_file = matches.get_one::<PathBuf>("state-file").cloned();

    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login {
            identifier: required(sub, "identifier")?,
            password: SecretString::from(required(sub, "password")?),
        },
        Some(("signup", sub)) => Action::Signup {
            username: required(sub, "username")?,
            email: required(sub, "email")?,
            password: SecretString::from(required(sub, "password")?),
            confirm: SecretString::from(required(sub, "confirm")?),
        },
        Some(("logout", sub)) => Action::Logout {
            realm: match sub.get_one::<String>("realm").map(String::as_str) {
                Some("admin") => Some(Realm::Admin),
                Some("user") => Some(Realm::User),
                _ => None,
            },
        },
        Some(("content", sub)) => match sub.subcommand() {
            Some(("list", list)) => Action::ContentList(ListArgs {
                type_filter: required(list, "type")?,
                platform: required(list, "platform")?,
                sort: required(list, "sort")?,
                order: match list.get_one::<String>("order").map(String::as_str) {
                    Some("asc") => SortOrder::Asc,
                    _ => SortOrder::Desc,
                },
                page: list.get_one::<u64>("page").copied().unwrap_or(1),
                limit: list.get_one::<u64>("limit").copied().unwrap_or(15),
            }),
            Some(("delete", delete)) => Action::ContentDelete {
                id: required(delete, "id")?,
            },
            _ => return Err(anyhow!("missing content subcommand")),
        },
        _ => return Err(anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}
