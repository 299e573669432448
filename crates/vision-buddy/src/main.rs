//! Chat with VisionBuddy in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use vision_buddy::{CliConfig, LexicalIndex, Session, SessionBuilder};
use vision_buddy_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

const BAR_CHAR: &str = "▎";
const HISTORY_FILE: &str = "chat_history.txt";

struct ToolCallEvent {
    name: String,
    arguments: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("starting with {config:?}");

    let mut openai_config = OpenAIConfigBuilder::with_api_key(config.api_key);
    if let Some(base_url) = config.base_url {
        openai_config = openai_config.with_base_url(base_url);
    }
    if let Some(model) = config.model {
        openai_config = openai_config.with_model(model);
    }
    let model_provider = OpenAIProvider::new(openai_config.build());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut builder = SessionBuilder::with_model_provider(model_provider)
        .on_tool_call(move |req| {
            event_tx
                .send(ToolCallEvent {
                    name: req.name.clone(),
                    arguments: serde_json::Value::Object(req.arguments.clone())
                        .to_string(),
                })
                .ok();
        });
    if let Some(pattern) = &config.documents {
        match LexicalIndex::load(pattern) {
            Ok(index) => builder = builder.with_document_index(Arc::new(index)),
            Err(err) => {
                eprintln!("{err}");
                return;
            }
        }
    } else {
        warn!("VISION_BUDDY_DOCUMENTS is not set, the textbook is empty");
    }
    if let Some(max_round_trips) = config.max_round_trips {
        builder = builder.with_max_round_trips(max_round_trips);
    }
    let mut session = match builder.build() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{}", "=== VisionBuddy, your eye-care assistant ===".bold());
    println!("Type `/save` to save the chat, `/reset` to start over, `exit` to quit.");

    loop {
        print!("\nYou: ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            _ if line.eq_ignore_ascii_case("exit")
                || line.eq_ignore_ascii_case("quit") =>
            {
                println!("Goodbye!");
                break;
            }
            "/save" => {
                save_history(&session);
                continue;
            }
            "/reset" => {
                session.reset();
                println!("Conversation cleared.");
                continue;
            }
            _ => {}
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");

        let mut reply = pin!(session.send_message(line));
        let result = loop {
            progress_bar.inc(1);
            select! {
                result = &mut reply => break result,
                Some(event) = event_rx.recv() => {
                    progress_bar.println(format!(
                        "{}⚙️  Calling {} with {}",
                        BAR_CHAR.bright_yellow(),
                        event.name.bold(),
                        event.arguments,
                    ));
                }
                _ = sleep(Duration::from_millis(100)) => {}
            }
        };
        progress_bar.finish_and_clear();

        match result {
            Ok(answer) => {
                println!("{}🤖 {}", BAR_CHAR.bright_cyan(), answer.bright_white());
            }
            Err(err) => {
                let hint = if err.is_transient() {
                    ", please try again"
                } else {
                    ""
                };
                println!("{}{err}{hint}", BAR_CHAR.bright_red());
            }
        }
    }
}

fn save_history(session: &Session) {
    match session.save_transcript(HISTORY_FILE) {
        Ok(()) => println!("📎 Chat saved to {HISTORY_FILE}"),
        Err(err) => {
            error!("error saving chat history: {err}");
            println!("{}could not save the chat: {err}", BAR_CHAR.bright_red());
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
