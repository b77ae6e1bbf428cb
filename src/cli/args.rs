//! Command-line argument parsing for the mentor CLI.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Chat, interactively or with a one-shot prompt
    Chat(ChatArgs),
}

/// Options of the chat command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatArgs {
    /// Ask for a single JSON reply instead of a stream
    pub no_stream: bool,
    /// Cancel a reply that takes longer than this
    pub timeout: Option<Duration>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Config file to read instead of `~/.mood-mentor/config.json`
    pub config: Option<PathBuf>,
    /// Send this text, print the reply, and exit
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown option: {0}")]
    UnknownFlag(String),
}

/// Parse command-line arguments (program name first).
///
/// Words that are not options are joined into a one-shot prompt.
///
/// # Examples
///
/// ```
/// use mood_mentor::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["mentor".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut chat = ChatArgs::default();
    let mut words = Vec::new();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--no-stream" => chat.no_stream = true,
            "--timeout" => {
                let secs: f64 = parse_value(&arg, args.next())?;
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(ArgsError::InvalidValue {
                        flag: arg,
                        value: secs.to_string(),
                    });
                }
                chat.timeout = Some(Duration::from_secs_f64(secs));
            }
            "--temperature" => chat.temperature = Some(parse_value(&arg, args.next())?),
            "--max-tokens" => chat.max_tokens = Some(parse_value(&arg, args.next())?),
            "--config" => {
                let path = args.next().ok_or_else(|| ArgsError::MissingValue(arg.clone()))?;
                chat.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownFlag(arg)),
            _ => words.push(arg),
        }
    }

    if !words.is_empty() {
        chat.prompt = Some(words.join(" "));
    }
    Ok(CliCommand::Chat(chat))
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, ArgsError> {
    let value = value.ok_or_else(|| ArgsError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| ArgsError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

pub const USAGE: &str = "\
Usage: mentor [OPTIONS] [PROMPT...]

Chat with the mood mentor. Without a prompt, starts an interactive session.

Options:
      --no-stream          Wait for the whole reply instead of streaming it
      --timeout <SECS>     Stop a reply that takes longer than SECS
      --temperature <T>    Sampling temperature (default 0.7)
      --max-tokens <N>     Reply length limit (default 512)
      --config <PATH>      Config file (default ~/.mood-mentor/config.json)
  -h, --help               Show this help
  -V, --version            Show version

Environment:
  DEEPSEEK_API_KEY, DEEPSEEK_BASE_URL, DEEPSEEK_MODEL, RUST_LOG";

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, ArgsError> {
        let mut all = vec!["mentor".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Ok(CliCommand::Chat(ChatArgs::default())));
    }

    #[test]
    fn test_parse_chat_options() {
        let command = parse(&[
            "--no-stream",
            "--timeout",
            "2.5",
            "--max-tokens",
            "256",
            "我有点焦虑",
            "怎么办",
        ])
        .unwrap();

        let CliCommand::Chat(args) = command else {
            panic!("expected chat");
        };
        assert!(args.no_stream);
        assert_eq!(args.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(args.max_tokens, Some(256));
        assert_eq!(args.prompt.as_deref(), Some("我有点焦虑 怎么办"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse(&["--timeout"]),
            Err(ArgsError::MissingValue("--timeout".to_string()))
        );
        assert_eq!(
            parse(&["--timeout", "0"]),
            Err(ArgsError::InvalidValue {
                flag: "--timeout".to_string(),
                value: "0".to_string()
            })
        );
        assert_eq!(
            parse(&["--temperature", "warm"]),
            Err(ArgsError::InvalidValue {
                flag: "--temperature".to_string(),
                value: "warm".to_string()
            })
        );
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownFlag("--unknown".to_string()))
        );
    }
}
