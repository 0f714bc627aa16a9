//! Command-line argument parsing.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Scaffold a new bot project in `name`
    Init { name: String },
    /// Run the proxy bot server
    Serve,
    /// Ask the platform to refetch the bot's settings
    SyncSettings,
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Arguments could not be parsed
    Invalid { message: String },
}

pub const USAGE: &str = "\
Usage: poe-bot <command>

Commands:
  init <project-name>  Create a new server bot project
  serve                Run a bot that forwards queries to POE_UPSTREAM_BOT
  sync-settings        Ask Poe to refetch the bot's settings

Options:
  -V, --version        Print version
  -h, --help           Print this help";

/// Parse command-line arguments, program name first.
///
/// ```
/// use poe_bot::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["poe-bot".to_string(), "init".to_string(), "my-bot".to_string()];
/// assert_eq!(
///     parse_args(args.into_iter()),
///     CliCommand::Init { name: "my-bot".to_string() }
/// );
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1);

    let Some(first) = args.next() else {
        return CliCommand::Help;
    };

    match first.as_str() {
        "--version" | "-V" => CliCommand::Version,
        "--help" | "-h" | "help" => CliCommand::Help,
        "init" => match args.next() {
            Some(name) if !name.starts_with('-') => CliCommand::Init { name },
            _ => CliCommand::Invalid {
                message: "init requires a <project-name> argument".to_string(),
            },
        },
        "serve" => CliCommand::Serve,
        "sync-settings" => CliCommand::SyncSettings,
        other => CliCommand::Invalid {
            message: format!("unknown command '{}'", other),
        },
    }
}
