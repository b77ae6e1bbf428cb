//! CLI module for the mentor binary.
//!
//! - Argument parsing
//! - Version display
//! - The interactive chat loop
//!
//! # Usage
//!
//! ```ignore
//! use mood_mentor::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command).await?;
//! ```

pub mod args;
pub mod chat;
pub mod version;

pub use args::{parse_args, ArgsError, ChatArgs, CliCommand, USAGE};
pub use chat::{run_chat, ChatInput};
pub use version::{version_line, VERSION};

use color_eyre::Result;

/// Run a parsed CLI command to completion.
pub async fn run_cli_command(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Chat(args) => run_chat(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_version_command_succeeds() {
        assert!(run_cli_command(CliCommand::Version).await.is_ok());
        assert!(run_cli_command(CliCommand::Help).await.is_ok());
    }
}
