//! Interactive chat loop on stdin/stdout.
//!
//! Replies are printed as they stream in by polling the session: the
//! controller writes into the session, this loop only reads from it.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use super::args::ChatArgs;
use crate::adapters::ReqwestHttpClient;
use crate::completion::CompletionClient;
use crate::config::LayeredConfig;
use crate::error::{MentorError, MentorResult};
use crate::exercise::suggestions;
use crate::models::{BubbleRole, ChatOptions};
use crate::presets::{PresetCarousel, PresetDispatcher};
use crate::prompt::MoodPromptBuilder;
use crate::state::{SendOutcome, Session, SessionController, DEFAULT_GREETING};
use crate::traits::ConfigProvider;

type Controller = SessionController<ReqwestHttpClient, LayeredConfig>;

const POLL_INTERVAL: Duration = Duration::from_millis(40);

const COMMANDS: &str = "\
/presets  show suggested prompts    /more   next page of prompts
/1 /2     send a suggested prompt   /retry  resend the last message
/regen    regenerate the last reply /new    start over
/help     show this list            /quit   leave";

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Send(String),
    Preset(usize),
    ShowPresets,
    MorePresets,
    Retry,
    Regenerate,
    New,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatInput::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ChatInput::Send(line.to_string());
        };

        match command {
            "presets" | "p" => ChatInput::ShowPresets,
            "more" => ChatInput::MorePresets,
            "retry" | "r" => ChatInput::Retry,
            "regen" => ChatInput::Regenerate,
            "new" => ChatInput::New,
            "help" | "?" => ChatInput::Help,
            "quit" | "exit" | "q" => ChatInput::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => ChatInput::Preset(n - 1),
                _ => ChatInput::Unknown(line.to_string()),
            },
        }
    }
}

/// Run the chat command.
pub async fn run_chat(args: ChatArgs) -> Result<()> {
    let mut config = LayeredConfig::from_environment();
    if let Some(path) = &args.config {
        config = config.with_file(path);
    }
    // Fail early on a missing key rather than at the first send.
    let resolved = config.resolve().map_err(MentorError::from)?;
    debug!("Using model {} at {}", resolved.model, resolved.base_url);

    let client = CompletionClient::new(ReqwestHttpClient::new(), config);
    let controller = Arc::new(SessionController::new(client, MoodPromptBuilder::default()));
    let options = chat_options(&args);

    if let Some(prompt) = &args.prompt {
        let session = Session::new();
        install_interrupt_handler(&session);
        let handle = controller.spawn_send(session.clone(), prompt.clone(), options);
        let result = follow_reply(&session, handle, args.timeout).await?;
        return report(result);
    }

    let session = Session::with_greeting(DEFAULT_GREETING);
    install_interrupt_handler(&session);
    let dispatcher = Arc::new(PresetDispatcher::new(Arc::clone(&controller)));
    let mut carousel = PresetCarousel::default();

    println!("{}\n", DEFAULT_GREETING);
    println!("{}\n", COMMANDS);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let handle = match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Help => {
                println!("{}", COMMANDS);
                continue;
            }
            ChatInput::Unknown(command) => {
                eprintln!("Unknown command {}. Type /help for the list.", command);
                continue;
            }
            ChatInput::ShowPresets => {
                print_presets(carousel.current());
                continue;
            }
            ChatInput::MorePresets => {
                print_presets(carousel.shuffle());
                continue;
            }
            ChatInput::New => {
                match session.reset() {
                    Ok(()) => println!("{}\n", DEFAULT_GREETING),
                    Err(reason) => eprintln!("Cannot start over: {}", reason),
                }
                continue;
            }
            ChatInput::Preset(index) => {
                match dispatcher.spawn_item(session.clone(), &carousel, index, options.clone()) {
                    Some(handle) => {
                        if let Some(text) = carousel.current().get(index) {
                            println!("> {}", text);
                        }
                        handle
                    }
                    None => {
                        eprintln!("No prompt {} on this page.", index + 1);
                        continue;
                    }
                }
            }
            ChatInput::Send(text) => {
                controller.spawn_send(session.clone(), text, options.clone())
            }
            ChatInput::Retry => spawn_retry(&controller, &session, options.clone()),
            ChatInput::Regenerate => spawn_regenerate(&controller, &session, options.clone()),
        };

        let result = follow_reply(&session, handle, args.timeout).await?;
        if let Err(err) = &result {
            print_error(err);
        }
    }

    Ok(())
}

fn chat_options(args: &ChatArgs) -> ChatOptions {
    let mut options = ChatOptions::default().with_stream(!args.no_stream);
    if let Some(temperature) = args.temperature {
        options = options.with_temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }
    options
}

/// Ctrl-C stops the current reply; with nothing in flight it exits.
fn install_interrupt_handler(session: &Session) {
    let session = session.clone();
    // Ignore errors if a handler is already installed
    let _ = ctrlc::set_handler(move || {
        if !session.cancel() {
            std::process::exit(130);
        }
    });
}

fn spawn_retry(
    controller: &Arc<Controller>,
    session: &Session,
    options: ChatOptions,
) -> JoinHandle<MentorResult<SendOutcome>> {
    let controller = Arc::clone(controller);
    let session = session.clone();
    tokio::spawn(async move { controller.retry_last(&session, options).await })
}

fn spawn_regenerate(
    controller: &Arc<Controller>,
    session: &Session,
    options: ChatOptions,
) -> JoinHandle<MentorResult<SendOutcome>> {
    let controller = Arc::clone(controller);
    let session = session.clone();
    let last_reply = session
        .last_bubble()
        .filter(|b| b.role == BubbleRole::Assistant)
        .map(|b| b.id)
        .unwrap_or_default();
    tokio::spawn(async move { controller.regenerate(&session, &last_reply, options).await })
}

/// Print the reply of `handle` as it grows, then wait for the send to end.
///
/// With a `timeout`, a reply still in flight when it elapses is cancelled.
async fn follow_reply(
    session: &Session,
    mut handle: JoinHandle<MentorResult<SendOutcome>>,
    timeout: Option<Duration>,
) -> Result<MentorResult<SendOutcome>> {
    let before = session.last_bubble().map(|b| b.id);
    let mut printed = 0;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let deadline = tokio::time::sleep(timeout.unwrap_or(Duration::MAX));
    tokio::pin!(deadline);
    let mut timed_out = false;

    let result = loop {
        tokio::select! {
            joined = &mut handle => break joined?,
            _ = &mut deadline, if timeout.is_some() && !timed_out => {
                timed_out = true;
                debug!("Reply timed out, cancelling");
                session.cancel();
            }
            _ = ticker.tick() => {
                printed = print_new_text(session, before.as_deref(), printed).await?;
            }
        }
    };

    let printed = print_new_text(session, before.as_deref(), printed).await?;
    if printed > 0 {
        println!();
    }

    if let Some(reply) = session.last_bubble().filter(|b| before.as_deref() != Some(b.id.as_str())) {
        let kinds = suggestions(&reply);
        if !kinds.is_empty() {
            let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
            println!("  试试：{}", labels.join(" · "));
        }
    }
    if matches!(result, Ok(SendOutcome::Cancelled)) {
        println!("  (已停止)");
    }
    println!();

    Ok(result)
}

/// Print the part of the newest assistant bubble not printed yet.
async fn print_new_text(session: &Session, before: Option<&str>, printed: usize) -> Result<usize> {
    let Some(reply) = session.last_bubble() else {
        return Ok(printed);
    };
    if reply.role != BubbleRole::Assistant || before == Some(reply.id.as_str()) {
        return Ok(printed);
    }

    match reply.content.get(printed..) {
        Some(new_text) if !new_text.is_empty() => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(new_text.as_bytes()).await?;
            stdout.flush().await?;
            Ok(reply.content.len())
        }
        _ => Ok(printed),
    }
}

fn print_presets(presets: &[&str]) {
    for (i, text) in presets.iter().enumerate() {
        println!("  /{}  {}", i + 1, text);
    }
}

fn print_error(err: &MentorError) {
    eprintln!("{} ({})", err.user_message(), err.recovery_hint());
}

fn report(result: MentorResult<SendOutcome>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            print_error(&err);
            Err(err.into())
        }
    }
}
