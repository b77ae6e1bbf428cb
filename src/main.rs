use color_eyre::Result;
use mood_mentor::cli::{parse_args, run_cli_command};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout carries only the conversation.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run `mentor --help` for usage.");
            std::process::exit(2);
        }
    };

    init_tracing();
    run_cli_command(command).await
}
