use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};
use std::path::PathBuf;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("cinenest")
        .about("CINE NEST catalog client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the CINE NEST API")
                .default_value("http://localhost:8000")
                .env("CINENEST_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("state-file")
                .long("state-file")
                .help("Where sessions are persisted (default: ~/.cinenest/session.json)")
                .env("CINENEST_STATE_FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("CINENEST_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in; the admin realm is tried before the user realm")
                .arg(
                    Arg::new("identifier")
                        .help("Email or username")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("CINENEST_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("signup")
                .about("Create a user account and sign in")
                .arg(Arg::new("username").help("Username").required(true))
                .arg(Arg::new("email").help("Email address").required(true))
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("CINENEST_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("confirm")
                        .short('c')
                        .long("confirm")
                        .help("Password confirmation")
                        .env("CINENEST_PASSWORD_CONFIRM")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("logout")
                .about("Discard stored sessions")
                .arg(
                    Arg::new("realm")
                        .long("realm")
                        .help("Only sign out of one realm")
                        .value_parser(["admin", "user"]),
                ),
        )
        .subcommand(
            Command::new("content")
                .about("Admin content management")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List catalog content (admin session required)")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .help("Content type filter: all, movie, series")
                                .default_value("all"),
                        )
                        .arg(
                            Arg::new("platform")
                                .long("platform")
                                .help("Platform filter, or all")
                                .default_value("all"),
                        )
                        .arg(
                            Arg::new("sort")
                                .long("sort")
                                .help("Sort key: year, title, imdb")
                                .default_value("year"),
                        )
                        .arg(
                            Arg::new("order")
                                .long("order")
                                .help("Sort order")
                                .value_parser(["asc", "desc"])
                                .default_value("desc"),
                        )
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .help("Page to show")
                                .default_value("1")
                                .value_parser(clap::value_parser!(u64).range(1..)),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .help("Items per page")
                                .default_value("15")
                                .value_parser(clap::value_parser!(u64).range(1..)),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete one content item (admin session required)")
                        .arg(Arg::new("id").help("Content identifier").required(true)),
                ),
        )
}
